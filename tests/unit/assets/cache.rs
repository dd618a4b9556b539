use std::cell::Cell;
use std::sync::Arc;

use super::*;

struct CountingLoader {
    calls: Cell<usize>,
}

impl ImageLoader for CountingLoader {
    fn load(&self, src: &str) -> SceneResult<DecodedImage> {
        self.calls.set(self.calls.get() + 1);
        if src == "broken.png" {
            return Err(SceneError::validation("broken"));
        }
        Ok(DecodedImage {
            width: 1,
            height: 1,
            rgba8_premul: Arc::new(vec![255, 0, 0, 255]),
        })
    }
}

#[test]
fn normalize_rel_path_rules() {
    assert_eq!(normalize_rel_path("./img/a.png").unwrap(), "img/a.png");
    assert_eq!(normalize_rel_path("img\\b.png").unwrap(), "img/b.png");
    assert!(normalize_rel_path("/etc/passwd").is_err());
    assert!(normalize_rel_path("../up.png").is_err());
    assert!(normalize_rel_path("https://x/y.png").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn entries_are_pending_until_polled() {
    let mut cache = ImageCache::new();
    assert!(cache.request("logo", "logo.png"));
    assert!(matches!(cache.slot("logo"), Some(ImageSlot::Pending)));
    assert!(cache.get("logo").is_none());

    let loader = CountingLoader {
        calls: Cell::new(0),
    };
    assert_eq!(cache.poll(&loader), 1);
    assert_eq!(cache.get("logo").unwrap().width, 1);
    assert_eq!(cache.pending(), 0);
}

#[test]
fn same_source_decodes_once() {
    let mut cache = ImageCache::new();
    let loader = CountingLoader {
        calls: Cell::new(0),
    };
    cache.request("logo", "logo.png");
    cache.poll(&loader);
    assert!(!cache.request("logo", "logo.png"));
    cache.poll(&loader);
    assert_eq!(loader.calls.get(), 1);

    assert!(cache.request("logo", "other.png"));
    cache.poll(&loader);
    assert_eq!(loader.calls.get(), 2);
}

#[test]
fn failures_are_recorded_and_not_retried() {
    let mut cache = ImageCache::new();
    let loader = CountingLoader {
        calls: Cell::new(0),
    };
    cache.request("x", "broken.png");
    assert_eq!(cache.poll(&loader), 0);
    assert!(matches!(cache.slot("x"), Some(ImageSlot::Failed(_))));
    cache.poll(&loader);
    assert_eq!(loader.calls.get(), 1);
}

#[test]
fn fs_loader_reads_relative_files() {
    let dir = std::env::temp_dir().join(format!("sceneplay_fs_loader_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 0, 255, 255]))
        .save(dir.join("dot.png"))
        .unwrap();

    let loader = FsImageLoader::new(&dir);
    let img = loader.load("./dot.png").unwrap();
    assert_eq!((img.width, img.height), (3, 2));
    assert!(loader.load("missing.png").is_err());

    let _ = std::fs::remove_dir_all(&dir);
}
