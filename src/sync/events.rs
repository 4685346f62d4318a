use std::fmt;
use std::sync::Arc;

use crate::sync::metadata::TimedMetadata;

pub type SharedMetadata = Arc<dyn TimedMetadata>;

/// Lifecycle and timing notifications pushed by the playback source.
#[derive(Clone)]
pub enum PlayerEvent {
    AppReady,
    /// Timing data is available; the audio may not be playable yet.
    VideoReady(SharedMetadata),
    /// Audio is loaded and can play.
    TimerReady,
    /// High-frequency position report while playing.
    TimeUpdate { position: f64 },
    Play,
    /// Paused, stopped or reached the end.
    Pause,
    /// Low-frequency authoritative position, also sent once a seek lands.
    MediaSeek { position: f64 },
    MediaChange,
}

impl fmt::Debug for PlayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerEvent::AppReady => f.write_str("AppReady"),
            PlayerEvent::VideoReady(source) => {
                f.debug_tuple("VideoReady").field(&source.video_information()).finish()
            }
            PlayerEvent::TimerReady => f.write_str("TimerReady"),
            PlayerEvent::TimeUpdate { position } => {
                f.debug_struct("TimeUpdate").field("position", position).finish()
            }
            PlayerEvent::Play => f.write_str("Play"),
            PlayerEvent::Pause => f.write_str("Pause"),
            PlayerEvent::MediaSeek { position } => {
                f.debug_struct("MediaSeek").field("position", position).finish()
            }
            PlayerEvent::MediaChange => f.write_str("MediaChange"),
        }
    }
}

/// One handler per event. `now` is the wall clock in milliseconds at dispatch.
pub trait PlayerListener {
    fn on_app_ready(&mut self, _now: f64) {}
    fn on_video_ready(&mut self, _now: f64, _source: SharedMetadata) {}
    fn on_timer_ready(&mut self, _now: f64) {}
    fn on_time_update(&mut self, _now: f64, _position: f64) {}
    fn on_play(&mut self, _now: f64) {}
    fn on_pause(&mut self, _now: f64) {}
    fn on_media_seek(&mut self, _now: f64, _position: f64) {}
    fn on_media_change(&mut self, _now: f64) {}
}

pub fn dispatch<L: PlayerListener + ?Sized>(listener: &mut L, now: f64, event: PlayerEvent) {
    match event {
        PlayerEvent::AppReady => listener.on_app_ready(now),
        PlayerEvent::VideoReady(source) => listener.on_video_ready(now, source),
        PlayerEvent::TimerReady => listener.on_timer_ready(now),
        PlayerEvent::TimeUpdate { position } => listener.on_time_update(now, position),
        PlayerEvent::Play => listener.on_play(now),
        PlayerEvent::Pause => listener.on_pause(now),
        PlayerEvent::MediaSeek { position } => listener.on_media_seek(now, position),
        PlayerEvent::MediaChange => listener.on_media_change(now),
    }
}

/// Fire-and-forget playback requests. Their effect comes back later as events.
pub trait PlaybackControl {
    fn request_play(&mut self);
    fn request_pause(&mut self);
    fn request_media_seek(&mut self, position: f64);
}
