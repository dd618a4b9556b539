use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assets::decode::{DecodedImage, decode_image};
use crate::foundation::error::{SceneError, SceneResult};
use crate::scene::document::SceneDocument;
use crate::scene::model::ObjectKind;

/// Source of image bytes for `image` objects.
pub trait ImageLoader {
    fn load(&self, src: &str) -> SceneResult<DecodedImage>;
}

/// Loads images from files under a root directory.
#[derive(Clone, Debug)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, src: &str) -> SceneResult<DecodedImage> {
        let rel = normalize_rel_path(src)?;
        let path = self.root.join(&rel);
        let bytes =
            std::fs::read(&path).with_context(|| format!("read image '{}'", path.display()))?;
        decode_image(&bytes)
    }
}

/// Normalize a scene-relative asset path.
///
/// Uses `/` separators, drops `.` segments, and rejects absolute paths and `..` traversal.
pub fn normalize_rel_path(source: &str) -> SceneResult<String> {
    let s = source.replace('\\', "/");
    if s.is_empty() {
        return Err(SceneError::validation("image src must be non-empty"));
    }
    if s.starts_with('/') || s.contains("://") {
        return Err(SceneError::validation("image src must be a relative path"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(SceneError::validation("image src must not contain '..'"));
        }
        out.push(part);
    }
    if out.is_empty() {
        return Err(SceneError::validation("image src must contain a file name"));
    }
    Ok(out.join("/"))
}

/// Decode progress of one image object.
#[derive(Clone, Debug)]
pub enum ImageSlot {
    /// Requested, not decoded yet. Drawn as nothing.
    Pending,
    Ready(DecodedImage),
    /// Decoding failed; never retried for the same source.
    Failed(String),
}

#[derive(Clone, Debug)]
struct Entry {
    src: String,
    slot: ImageSlot,
}

/// Side table of decoded images keyed by object id.
///
/// Lives next to the document, never inside it, and is cleared whenever the document is replaced.
/// Each `(object id, src)` pair is decoded at most once.
#[derive(Clone, Debug, Default)]
pub struct ImageCache {
    entries: HashMap<String, Entry>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `src` for `object_id` unless that exact pair is already known.
    ///
    /// Returns `true` if a decode was queued.
    pub fn request(&mut self, object_id: &str, src: &str) -> bool {
        if self
            .entries
            .get(object_id)
            .is_some_and(|e| e.src == src)
        {
            return false;
        }
        self.entries.insert(
            object_id.to_owned(),
            Entry {
                src: src.to_owned(),
                slot: ImageSlot::Pending,
            },
        );
        true
    }

    /// Queue every image object of `doc` that carries a `src`.
    pub fn request_all(&mut self, doc: &SceneDocument) -> usize {
        doc.objects()
            .iter()
            .filter(|o| o.kind == ObjectKind::Image)
            .filter_map(|o| o.props.src.as_deref().map(|src| (o.id.as_str(), src)))
            .filter(|(id, src)| self.request(id, src))
            .count()
    }

    /// Decode every pending entry with `loader`. Returns how many became ready.
    pub fn poll<L: ImageLoader + ?Sized>(&mut self, loader: &L) -> usize {
        let mut ready = 0;
        for (id, entry) in &mut self.entries {
            if !matches!(entry.slot, ImageSlot::Pending) {
                continue;
            }
            entry.slot = match loader.load(&entry.src) {
                Ok(img) => {
                    ready += 1;
                    tracing::debug!(object_id = %id, src = %entry.src, "image decoded");
                    ImageSlot::Ready(img)
                }
                Err(e) => {
                    tracing::warn!(object_id = %id, src = %entry.src, error = %e, "image decode failed");
                    ImageSlot::Failed(e.to_string())
                }
            };
        }
        ready
    }

    /// Decoded image for `object_id`, if ready.
    pub fn get(&self, object_id: &str) -> Option<&DecodedImage> {
        match &self.entries.get(object_id)?.slot {
            ImageSlot::Ready(img) => Some(img),
            _ => None,
        }
    }

    pub fn slot(&self, object_id: &str) -> Option<&ImageSlot> {
        self.entries.get(object_id).map(|e| &e.slot)
    }

    pub fn pending(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e.slot, ImageSlot::Pending))
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
