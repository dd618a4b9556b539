use super::*;

fn frame() -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 2,
        data: vec![7; 16],
        premultiplied: true,
    }
}

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 2,
        fps: Fps::default(),
        scene_id: "demo".to_string(),
    }
}

#[test]
fn in_memory_sink_keeps_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame()).unwrap();
    sink.push_frame(FrameIndex(1), &frame()).unwrap();
    sink.end().unwrap();
    assert!(sink.is_finished());
    assert_eq!(sink.config().map(|c| c.scene_id.as_str()), Some("demo"));
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![0, 1]);
}

#[test]
fn in_memory_sink_rejects_out_of_order_and_unstarted() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(FrameIndex(0), &frame()).is_err());
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(3), &frame()).unwrap();
    assert!(sink.push_frame(FrameIndex(3), &frame()).is_err());
    assert!(sink.push_frame(FrameIndex(1), &frame()).is_err());
}

#[test]
fn begin_resets_previous_capture() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame()).unwrap();
    sink.end().unwrap();
    sink.begin(cfg()).unwrap();
    assert!(sink.frames().is_empty());
    assert!(!sink.is_finished());
}

#[test]
fn output_names_follow_scene_id() {
    assert_eq!(output_file_name("bubble-sort", "mp4"), "bubble-sort.mp4");
    assert_eq!(output_file_name("a/b c", "mp4"), "a_b_c.mp4");
    assert_eq!(output_file_name("", "mp4"), "scene.mp4");
    assert_eq!(output_file_name("///", "mp4"), "scene.mp4");
}
