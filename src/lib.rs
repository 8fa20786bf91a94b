//! # Cadenza
//!
//! Several independently playing sound sources on one hardware audio clock,
//! plus a timeline of one-shot events driven by elapsed playback time.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cadenza::*;
//! use serde_json::json;
//!
//! let mut mixer = Mixer::with_cpal(CadenzaConfig::default())?;
//!
//! let timeline = AudioTimeline::new(
//!     "music",
//!     [TimedEvent::new(12.5, || {
//!         let mut partial = PartialState::new();
//!         partial.insert("scene".into(), json!("chorus"));
//!         partial
//!     })],
//! );
//!
//! let bytes = std::fs::read("song.wav").expect("readable file");
//! timeline.setup(
//!     &mut mixer,
//!     bytes,
//!     |state: &AccumulatedState| println!("state: {}", state.to_json()),
//!     || println!("done"),
//! )?;
//! timeline.play(&mut mixer, 0.0)?;
//!
//! // Host loop: one tick per refresh interval
//! while let Some(request) = mixer.frame_scheduler_mut().wait_for_frame() {
//!     mixer.on_frame(request);
//! }
//! # Ok::<(), CadenzaError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`Mixer`]**: registry of named sources on a shared clock; broadcasts
//!   elapsed time to playing sources once per tick
//! - **[`Timeline`]**: fires [`TimedEvent`]s once each and merges their output
//!   into an [`AccumulatedState`]
//! - **[`AudioTimeline`]**: wires one mixer source to a timeline and publishes
//!   changed snapshots
//! - **[`AudioBackend`]**: the hardware clock and voices ([`CpalBackend`] for a
//!   real device, [`ManualBackend`] for deterministic hosts)
//! - **[`FrameScheduler`]**: the refresh-cycle primitive the tick loop
//!   reschedules itself on
//!
//! ## Threading
//!
//! The mixer, its callbacks and the timeline live on the host's event-loop
//! thread and are not `Send`. Only [`CpalBackend`]'s device callback runs
//! elsewhere; it shares voices with the control thread and reports finished
//! voices back over a channel.

pub mod audio_data;
pub mod audio_timeline;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod mixer;
pub mod playback;
pub mod timeline;

#[cfg(test)]
mod test_support;

pub use audio_data::{CadenzaAudioData, DecodeOptions};
pub use audio_timeline::AudioTimeline;
pub use backend::{AudioBackend, ContextState, CpalBackend, ManualBackend};
pub use config::CadenzaConfig;
pub use error::{AudioError, CadenzaError, DecodeError, NotFoundError, Result};
pub use events::CadenzaEvent;
pub use frame::{FrameRequest, FrameScheduler, IntervalFrameScheduler, ManualFrameScheduler};
pub use mixer::{Mixer, SourceHandle, SourceInfo};
pub use playback::{Voice, VoiceId};
pub use timeline::{AccumulatedState, PartialState, StateMap, TimedEvent, Timeline};
