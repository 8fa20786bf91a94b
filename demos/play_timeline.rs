use anyhow::{Context, Result};
use cadenza::{
    AccumulatedState, AudioTimeline, CadenzaConfig, Mixer, PartialState, TimedEvent,
};
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

/// Plays an audio file and prints the timeline state each time an event fires.
///
/// Usage: cargo run --example play_timeline -- path/to/song.wav
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .context("usage: play_timeline <audio file>")?;
    let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path))?;

    let config = CadenzaConfig::default();
    let mut mixer = Mixer::with_cpal(config)?;

    let timeline = AudioTimeline::new(
        "music",
        [
            scene(0.0, "intro"),
            scene(2.0, "verse"),
            scene(4.0, "chorus"),
            TimedEvent::new(6.0, || {
                let mut partial = PartialState::new();
                partial.insert("lights".to_string(), json!("strobe"));
                partial
            }),
        ],
    );

    let finished = Rc::new(Cell::new(false));
    let done = finished.clone();
    timeline.setup(
        &mut mixer,
        bytes,
        |state: &AccumulatedState| println!("state -> {}", state.to_json()),
        move || done.set(true),
    )?;
    timeline.play(&mut mixer, 0.0)?;

    while !finished.get() {
        let Some(request) = mixer.frame_scheduler_mut().wait_for_frame() else {
            break;
        };
        mixer.on_frame(request);
    }

    for event in mixer.poll_events() {
        log::info!("{:?}", event);
    }

    Ok(())
}

fn scene(target_time: f64, name: &'static str) -> TimedEvent {
    TimedEvent::new(target_time, move || {
        let mut partial = PartialState::new();
        partial.insert("scene".to_string(), json!(name));
        partial
    })
}
