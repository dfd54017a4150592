use std::sync::mpsc::{self, Receiver, Sender};

/// Notifications published by the playback session to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TrackLoaded { index: usize },
    StateChanged { index: Option<usize>, playing: bool },
    TimeUpdated { elapsed: f64, duration: f64 },
    PlaybackFailed { index: usize, message: String },
    LibraryChanged,
}

#[derive(Default)]
pub(crate) struct Observers {
    senders: Vec<Sender<SessionEvent>>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber; dropped receivers are pruned.
    pub(crate) fn emit(&mut self, event: SessionEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}
