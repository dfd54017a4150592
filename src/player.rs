//! Playback controller: a `PlaybackSession` state machine over a
//! `TrackRepository` and a `MediaElement`, publishing `SessionEvent`s to
//! subscribed views.

mod events;
mod session;
mod time;

pub use events::SessionEvent;
pub use session::{EndOfList, NowPlaying, PlaybackSession, PlaybackState, SeekTarget};
pub use time::{format_time, remaining};
