use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use anyhow::Context as _;

use crate::encode::sink::{FrameSink, SinkConfig, output_file_name};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SceneError, SceneResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output file, or a directory that receives `<sceneId>.mp4`.
    pub target: PathBuf,
    /// Replace an existing output file.
    pub overwrite: bool,
    /// Straight RGBA8 color the frames are flattened onto.
    pub bg_rgba: [u8; 4],
    /// x264 constant rate factor. `None` keeps the encoder default.
    pub crf: Option<u8>,
}

impl FfmpegSinkOpts {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            overwrite: true,
            bg_rgba: [255, 255, 255, 255],
            crf: None,
        }
    }

    pub fn with_bg_rgba(mut self, bg: [u8; 4]) -> Self {
        self.bg_rgba = bg;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_crf(mut self, crf: Option<u8>) -> Self {
        self.crf = crf;
        self
    }

    /// Where a capture of `scene_id` is written.
    ///
    /// An existing directory, or a target ending in a path separator, gets the scene's file name
    /// appended. Anything else is used as the file path itself.
    pub fn output_path(&self, scene_id: &str) -> PathBuf {
        let names_dir = self.target.is_dir()
            || self
                .target
                .as_os_str()
                .to_string_lossy()
                .ends_with(std::path::is_separator);
        if names_dir || self.target.as_os_str().is_empty() {
            self.target.join(output_file_name(scene_id, "mp4"))
        } else {
            self.target.clone()
        }
    }
}

/// Records a capture as H.264 MP4 by piping raw frames into the system `ffmpeg`.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    session: Option<EncoderSession>,
    written: Option<PathBuf>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            session: None,
            written: None,
        }
    }

    /// File of the current or last capture. `None` before the first `begin`.
    pub fn written_path(&self) -> Option<&Path> {
        self.written.as_deref()
    }

    fn session(&mut self) -> SceneResult<&mut EncoderSession> {
        self.session
            .as_mut()
            .ok_or_else(|| SceneError::evaluation("ffmpeg sink has no capture in progress"))
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> SceneResult<()> {
        check_encodable(&cfg)?;
        let out = self.opts.output_path(&cfg.scene_id);
        prepare_output(&out, self.opts.overwrite)?;
        if !is_ffmpeg_on_path() {
            return Err(SceneError::evaluation(
                "MP4 export needs `ffmpeg` on PATH, and it was not found",
            ));
        }
        let args = encoder_args(&cfg, &self.opts, &out);
        self.session = Some(EncoderSession::spawn(&args, &cfg)?);
        tracing::debug!(out = %out.display(), scene_id = %cfg.scene_id, "mp4 capture started");
        self.written = Some(out);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SceneResult<()> {
        let bg = self.opts.bg_rgba;
        self.session()?.write(idx, frame, bg)
    }

    fn end(&mut self) -> SceneResult<()> {
        let session = self
            .session
            .take()
            .ok_or_else(|| SceneError::evaluation("ffmpeg sink has no capture in progress"))?;
        session.finish()
    }
}

/// One running `ffmpeg` process.
struct EncoderSession {
    child: Child,
    stdin: ChildStdin,
    stderr: JoinHandle<Vec<u8>>,
    width: u32,
    height: u32,
    last_idx: Option<FrameIndex>,
    opaque: Vec<u8>,
}

impl EncoderSession {
    fn spawn(args: &[OsString], cfg: &SinkConfig) -> SceneResult<Self> {
        let mut child = Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SceneError::evaluation(format!("could not start ffmpeg: {e}")))?;
        let (Some(stdin), Some(mut stderr)) = (child.stdin.take(), child.stderr.take()) else {
            return Err(SceneError::evaluation("ffmpeg started without piped stdio"));
        };
        let stderr = std::thread::spawn(move || {
            let mut log = Vec::new();
            // The log only decorates an exit failure; a read error leaves it short.
            let _ = stderr.read_to_end(&mut log);
            log
        });
        Ok(Self {
            child,
            stdin,
            stderr,
            width: cfg.width,
            height: cfg.height,
            last_idx: None,
            opaque: vec![0; (cfg.width as usize) * (cfg.height as usize) * 4],
        })
    }

    fn write(&mut self, idx: FrameIndex, frame: &FrameRGBA, bg: [u8; 4]) -> SceneResult<()> {
        if self.last_idx.is_some_and(|last| idx <= last) {
            return Err(SceneError::evaluation(format!(
                "frame {} arrived after frame {}",
                idx.0,
                self.last_idx.map_or(0, |l| l.0)
            )));
        }
        if (frame.width, frame.height) != (self.width, self.height) {
            return Err(SceneError::validation(format!(
                "frame is {}x{} but the capture is {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        flatten_premul_over_bg(&mut self.opaque, &frame.data, bg)?;
        self.stdin
            .write_all(&self.opaque)
            .map_err(|e| SceneError::evaluation(format!("ffmpeg stopped accepting frames: {e}")))?;
        self.last_idx = Some(idx);
        Ok(())
    }

    fn finish(self) -> SceneResult<()> {
        let Self {
            mut child,
            stdin,
            stderr,
            ..
        } = self;
        drop(stdin);
        let status = child
            .wait()
            .map_err(|e| SceneError::evaluation(format!("lost track of ffmpeg: {e}")))?;
        let log = stderr.join().unwrap_or_default();
        if status.success() {
            return Ok(());
        }
        Err(SceneError::evaluation(format!(
            "ffmpeg failed ({status}): {}",
            String::from_utf8_lossy(&log).trim()
        )))
    }
}

/// yuv420p subsamples chroma 2x2, so both sides must be even.
fn check_encodable(cfg: &SinkConfig) -> SceneResult<()> {
    if cfg.fps.num == 0 || cfg.fps.den == 0 {
        return Err(SceneError::validation("capture fps must be non-zero"));
    }
    if cfg.width == 0 || cfg.height == 0 {
        return Err(SceneError::validation("capture size must be non-zero"));
    }
    if cfg.width % 2 == 1 || cfg.height % 2 == 1 {
        return Err(SceneError::validation(format!(
            "mp4 capture needs even dimensions, scene is {}x{}",
            cfg.width, cfg.height
        )));
    }
    Ok(())
}

fn prepare_output(out: &Path, overwrite: bool) -> SceneResult<()> {
    if !overwrite && out.exists() {
        return Err(SceneError::validation(format!(
            "'{}' already exists",
            out.display()
        )));
    }
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output directory '{}'", dir.display()))?;
    }
    Ok(())
}

/// Command line for one capture: raw RGBA on stdin, H.264 MP4 out.
fn encoder_args(cfg: &SinkConfig, opts: &FfmpegSinkOpts, out: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    let mut push = |s: &str| args.push(s.into());
    push(if opts.overwrite { "-y" } else { "-n" });
    push("-loglevel");
    push("error");
    push("-f");
    push("rawvideo");
    push("-pix_fmt");
    push("rgba");
    push("-s");
    push(format!("{}x{}", cfg.width, cfg.height).as_str());
    push("-r");
    push(format!("{}/{}", cfg.fps.num, cfg.fps.den).as_str());
    push("-i");
    push("pipe:0");
    push("-an");
    push("-c:v");
    push("libx264");
    push("-pix_fmt");
    push("yuv420p");
    push("-movflags");
    push("+faststart");
    if let Some(crf) = opts.crf {
        push("-crf");
        push(crf.to_string().as_str());
    }
    args.push(out.as_os_str().to_owned());
    args
}

/// Composite premultiplied pixels onto an opaque `bg`.
fn flatten_premul_over_bg(dst: &mut [u8], src: &[u8], bg: [u8; 4]) -> SceneResult<()> {
    if dst.len() != src.len() || src.len() % 4 != 0 {
        return Err(SceneError::validation(format!(
            "frame holds {} bytes, expected {}",
            src.len(),
            dst.len()
        )));
    }
    for (out, px) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let uncovered = 255 - u16::from(px[3]);
        for ch in 0..3 {
            let under = mul_div255_u16(u16::from(bg[ch]), uncovered);
            out[ch] = (u16::from(px[ch]) + under).min(255) as u8;
        }
        out[3] = 255;
    }
    Ok(())
}

/// Whether an `ffmpeg` binary answers `-version`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
