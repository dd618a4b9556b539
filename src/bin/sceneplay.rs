use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use sceneplay::{
    CpuBackend, CpuBackendOpts, ExportOpts, FfmpegSink, FfmpegSinkOpts, Fps, NarrationEffects,
    Player, PlayerOpts, SceneDocument, SceneResult, TickOutcome,
};

const EXPORT_FPS_ENV: &str = "SCENEPLAY_EXPORT_FPS";

#[derive(Parser, Debug)]
#[command(name = "sceneplay", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the step list of a scene.
    Steps(SceneArgs),
    /// Render the scene at one point in time as a PNG.
    Frame(FrameArgs),
    /// Play the scene headlessly, printing narration and step events.
    Play(PlayArgs),
    /// Record a full play-through as MP4 (requires `ffmpeg` on PATH).
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Font file used for text objects. Text is skipped without one.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Background color as hex RGBA, e.g. `ffffffff`.
    #[arg(long, default_value = "ffffffff", value_parser = parse_rgba_hex)]
    bg: [u8; 4],
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Scene time in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct PlayArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Tick rate of the simulated frame callback.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Sleep between ticks so playback runs at wall-clock speed.
    #[arg(long, default_value_t = false)]
    realtime: bool,

    /// Disable narration effects.
    #[arg(long, default_value_t = false)]
    no_narration: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output MP4 file, or a directory that receives `<sceneId>.mp4`.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Capture rate. Falls back to `SCENEPLAY_EXPORT_FPS`, then 30.
    #[arg(long)]
    fps: Option<u32>,

    /// Seconds of held final frame after playback ends.
    #[arg(long, default_value_t = sceneplay::DEFAULT_TAIL_SECS)]
    tail: f64,

    /// Fail instead of replacing an existing output file.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    #[command(flatten)]
    render: RenderArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Steps(args) => cmd_steps(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_rgba_hex(s: &str) -> Result<[u8; 4], String> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 8 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected 8 hex digits (RRGGBBAA), got '{s}'"));
    }
    let mut out = [0u8; 4];
    for (i, b) in out.iter_mut().enumerate() {
        *b = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|e| e.to_string())?;
    }
    Ok(out)
}

fn load_scene(path: &Path) -> anyhow::Result<SceneDocument> {
    let doc = SceneDocument::from_path(path)?;
    for w in doc.warnings() {
        eprintln!("warning: {w}");
    }
    Ok(doc)
}

fn assets_root(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

fn player_for(path: &Path, opts: PlayerOpts) -> anyhow::Result<Player<StdoutNarration>> {
    let doc = load_scene(path)?;
    let opts = opts.with_assets_root(assets_root(path));
    Ok(Player::with_narrator(doc, StdoutNarration::default(), opts))
}

fn backend_for(args: &RenderArgs) -> anyhow::Result<CpuBackend> {
    let mut opts = CpuBackendOpts::default().with_clear_rgba(Some(args.bg));
    if let Some(font) = &args.font {
        opts = opts.with_font_path(font);
    }
    Ok(CpuBackend::new(opts)?)
}

fn cmd_steps(args: SceneArgs) -> anyhow::Result<()> {
    let doc = load_scene(&args.in_path)?;
    let steps = sceneplay::step_list(&doc);
    if steps.is_empty() {
        println!("No actions in this scene.");
    }
    for step in steps {
        println!("{:>8}  {}", step.time_label(), step.label);
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut player = player_for(&args.scene.in_path, PlayerOpts::default())?;
    player.seek(args.time);
    player.poll_images();
    let mut backend = backend_for(&args.render)?;
    let frame = player.render(&mut backend)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &unpremultiply(&frame.data),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {} ({})", args.out.display(), player.time_display());
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let fps = Fps::new(args.fps, 1)?;
    let opts = PlayerOpts::default().with_narration_enabled(!args.no_narration);
    let mut player = player_for(&args.scene.in_path, opts)?;
    player.poll_images();

    let clock = Instant::now();
    let mut frame = 0u64;
    player.play(0.0);
    loop {
        let now = if args.realtime {
            clock.elapsed().as_secs_f64()
        } else {
            fps.frames_to_secs(frame)
        };
        let outcome = player.advance(now).outcome;
        let t = player.current_time();
        for line in player.narrator_mut().lines.drain(..) {
            println!("[{t:>6.2}s] {line}");
        }
        if outcome != TickOutcome::Advanced {
            break;
        }
        frame += 1;
        if args.realtime {
            std::thread::sleep(Duration::from_secs_f64(fps.frame_duration_secs()));
        }
    }
    println!("{}", player.time_display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let fps = match args.fps {
        Some(fps) => fps,
        None => match std::env::var(EXPORT_FPS_ENV) {
            Ok(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("parse {EXPORT_FPS_ENV}='{v}'"))?,
            Err(_) => 30,
        },
    };
    let opts = ExportOpts::default()
        .with_fps(Fps::new(fps, 1)?)
        .with_tail_secs(args.tail);

    let mut player = player_for(&args.scene.in_path, PlayerOpts::default())?;
    let mut backend = backend_for(&args.render)?;
    let mut sink = FfmpegSink::new(
        FfmpegSinkOpts::new(&args.out)
            .with_overwrite(!args.no_overwrite)
            .with_bg_rgba(args.render.bg),
    );

    let stats = sceneplay::export_playthrough(&mut player, &mut backend, &mut sink, &opts)?;
    if let Some(out) = sink.written_path() {
        eprintln!("wrote {} ({} frames)", out.display(), stats.frames_total);
    }
    Ok(())
}

/// Collects step highlights and speech as printable lines.
#[derive(Debug, Default)]
struct StdoutNarration {
    lines: Vec<String>,
}

impl NarrationEffects for StdoutNarration {
    fn highlight_step(&mut self, action_id: &str) {
        self.lines.push(format!("step  {action_id}"));
    }

    fn clear_highlight(&mut self) {}

    fn speak(&mut self, text: &str) -> SceneResult<()> {
        self.lines.push(format!("say   {text}"));
        Ok(())
    }

    fn cancel_speech(&mut self) {}
}

fn unpremultiply(premul: &[u8]) -> Vec<u8> {
    let mut out = premul.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    out
}
