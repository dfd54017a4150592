use crate::audio::MediaElement;
use crate::mpris::MprisHandle;
use crate::player::PlaybackSession;

pub fn update_mpris<M: MediaElement>(mpris: &MprisHandle, session: &PlaybackSession<M>) {
    let index = session.current_index();
    mpris.set_track_metadata(index, session.current_track(), session.media().duration());
    mpris.set_playback(session.state());
}
