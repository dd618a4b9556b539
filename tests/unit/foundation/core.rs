use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_frame_timestamps_do_not_accumulate_error() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.frames_to_secs(0), 0.0);
    assert_eq!(fps.frames_to_secs(60), 2.0);
    assert_eq!(fps.secs_to_frames_ceil(0.5), 15);
    assert_eq!(fps.secs_to_frames_ceil(0.51), 16);
}

#[test]
fn premul_scales_color_channels() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.a, 128);
    assert_eq!(c.r, 128);
    assert_eq!(c.g, 64);
    assert_eq!(c.b, 0);
}
