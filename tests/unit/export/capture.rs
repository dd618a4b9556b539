use super::*;
use crate::encode::sink::InMemorySink;
use crate::narration::sync::RecordingNarration;
use crate::render::backend::FrameRGBA;
use crate::render::plan::DrawPlan;
use crate::scene::document::SceneDocument;
use crate::session::player::PlayerOpts;
use serde_json::json;

/// Encodes the first item's opacity into every byte so frames can be told apart.
struct OpacityRecorder;

impl RenderBackend for OpacityRecorder {
    fn render_plan(&mut self, plan: &DrawPlan) -> SceneResult<FrameRGBA> {
        let v = plan
            .items
            .first()
            .map(|i| (i.opacity * 100.0).round() as u8)
            .unwrap_or(0);
        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: vec![v; (plan.canvas.width * plan.canvas.height * 4) as usize],
            premultiplied: true,
        })
    }
}

fn fading_player() -> Player<RecordingNarration> {
    let doc = SceneDocument::from_value(json!({
        "width": 2, "height": 2, "duration": 1, "sceneId": "fade-out",
        "objects": [{"id": "dot", "type": "circle", "props": {"x": 1, "y": 1, "r": 1}}],
        "actions": [{"id": "f", "objectId": "dot", "type": "fade", "start": 0, "end": 1,
                     "params": {"opacity": 0.2}, "narrative": "Gone."}]
    }))
    .unwrap();
    Player::with_narrator(doc, RecordingNarration::default(), PlayerOpts::default())
}

#[test]
fn captures_every_tick_then_holds_the_tail() {
    let mut player = fading_player();
    player.seek(0.5);
    let mut sink = InMemorySink::new();
    let opts = ExportOpts::default().with_fps(Fps::new(4, 1).unwrap());
    let stats = export_playthrough(&mut player, &mut OpacityRecorder, &mut sink, &opts).unwrap();

    assert_eq!(
        stats,
        ExportStats {
            frames_total: 7,
            frames_rendered: 5,
            frames_held: 2,
        }
    );
    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height, cfg.scene_id.as_str()), (2, 2, "fade-out"));
    assert!(sink.is_finished());

    let firsts: Vec<u8> = sink.frames().iter().map(|(_, f)| f.data[0]).collect();
    assert_eq!(firsts, vec![100, 80, 60, 40, 20, 20, 20]);
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..7).collect::<Vec<_>>());
}

#[test]
fn export_restarts_narration_from_the_top() {
    let mut player = fading_player();
    player.seek(0.9);
    let mut sink = InMemorySink::new();
    let opts = ExportOpts::default()
        .with_fps(Fps::new(4, 1).unwrap())
        .with_tail_secs(0.0);
    let stats = export_playthrough(&mut player, &mut OpacityRecorder, &mut sink, &opts).unwrap();
    assert_eq!(stats.frames_held, 0);
    assert_eq!(player.narrator().spoken(), vec!["Gone."]);
    assert_eq!(player.current_time(), 1.0);
}

#[test]
fn invalid_options_are_rejected_before_capture() {
    let mut player = fading_player();
    let mut sink = InMemorySink::new();
    let bad_fps = ExportOpts {
        fps: Fps { num: 0, den: 1 },
        tail_secs: 0.5,
    };
    assert!(export_playthrough(&mut player, &mut OpacityRecorder, &mut sink, &bad_fps).is_err());
    let bad_tail = ExportOpts::default().with_tail_secs(f64::NAN);
    assert!(export_playthrough(&mut player, &mut OpacityRecorder, &mut sink, &bad_tail).is_err());
    assert!(sink.config().is_none());
}
