use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bevy::prelude::*;
use kira::sound::streaming::{StreamingSoundData, StreamingSoundHandle};
use kira::sound::{FromFileError, PlaybackState};
use kira::{AudioManager, AudioManagerSettings, DefaultBackend, PlaySoundError, Tween};
use thiserror::Error;

use crate::file::settings::PlaybackSettings;
use crate::sync::events::{PlaybackControl, PlayerEvent};

#[derive(Debug, Error)]
pub enum PlaybackHostError {
    #[error("audio output is unavailable")]
    NoOutput,
    #[error("failed to load streaming audio from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: FromFileError,
    },
    #[error("failed to start streaming playback: {0}")]
    Play(#[from] PlaySoundError<FromFileError>),
}

#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    target: f64,
    requested_at: Instant,
}

/// Streams the song through kira and reports what it is doing as
/// [`PlayerEvent`]s, the way a remote media player would.
///
/// Lives as a non-send resource: the kira handles stay on the main thread.
pub struct PlaybackHost {
    manager: Option<AudioManager<DefaultBackend>>,
    sound: Option<StreamingSoundHandle<FromFileError>>,
    path: Option<PathBuf>,
    duration_ms: Option<f64>,
    settings: PlaybackSettings,
    queued: VecDeque<PlayerEvent>,
    was_playing: bool,
    last_resync_at: Option<f64>,
    pending_seek: Option<PendingSeek>,
}

impl PlaybackHost {
    const FALLBACK_DURATION_SECS: f64 = 3600.0;

    pub fn new(settings: PlaybackSettings) -> Self {
        let manager = match AudioManager::new(AudioManagerSettings::default()) {
            Ok(manager) => Some(manager),
            Err(err) => {
                error!("Failed to init audio: {err}");
                None
            }
        };
        Self {
            manager,
            sound: None,
            path: None,
            duration_ms: None,
            settings,
            queued: VecDeque::from([PlayerEvent::AppReady]),
            was_playing: false,
            last_resync_at: None,
            pending_seek: None,
        }
    }

    fn duration_from_codec_params(
        params: &symphonia::core::codecs::CodecParameters,
    ) -> Option<f64> {
        let sample_rate = params.sample_rate?;
        let n_frames = params.n_frames?;
        Some(n_frames as f64 / sample_rate as f64)
    }

    fn estimate_duration_secs(path: &Path) -> Option<f64> {
        use symphonia::core::formats::FormatOptions;
        use symphonia::core::io::MediaSourceStream;
        use symphonia::core::meta::MetadataOptions;
        use symphonia::core::probe::Hint;
        use symphonia::default::get_probe;

        let file = std::fs::File::open(path).ok()?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .ok()?;
        let format = probed.format;
        let track = format.default_track()?;
        Self::duration_from_codec_params(&track.codec_params)
    }

    /// Loads the stream and works out how long it is.
    fn prepare_stream_data(
        path: &Path,
    ) -> Result<(StreamingSoundData<FromFileError>, f64), PlaybackHostError> {
        let data =
            StreamingSoundData::from_file(path).map_err(|source| PlaybackHostError::Load {
                path: path.to_path_buf(),
                source,
            })?;

        let decoder_duration = data.duration();
        if decoder_duration > Duration::from_secs(0) {
            let secs = decoder_duration.as_secs_f64();
            debug!("Stream duration (decoder reported): {:.3}s", secs);
            if secs.is_finite() && secs >= 1.0 {
                return Ok((data, secs));
            }
        }

        if let Some(duration_secs) = Self::estimate_duration_secs(path) {
            debug!(
                "Estimated duration via metadata for {}: {:.3}s",
                path.display(),
                duration_secs
            );
            if duration_secs.is_finite() && duration_secs > 0.0 {
                return Ok((data.slice(0.0..duration_secs), duration_secs));
            }
        } else {
            warn!("Could not estimate duration for {}", path.display());
        }

        warn!(
            "Falling back to default streaming duration of {:.0}s for {}",
            Self::FALLBACK_DURATION_SECS,
            path.display()
        );
        Ok((
            data.slice(0.0..Self::FALLBACK_DURATION_SECS),
            Self::FALLBACK_DURATION_SECS,
        ))
    }

    /// Starts streaming `path` paused at zero. Queues `TimerReady` once the
    /// stream can play, preceded by `MediaChange` when it replaces a song.
    pub fn open(&mut self, path: &Path) -> Result<f64, PlaybackHostError> {
        let replacing = self.sound.is_some();
        if let Some(mut previous) = self.sound.take() {
            previous.stop(Tween::default());
        }

        let duration_ms = self.start_stream(path)?;
        self.path = Some(path.to_path_buf());
        self.duration_ms = Some(duration_ms);
        if replacing {
            self.queued.push_back(PlayerEvent::MediaChange);
        }
        self.queued.push_back(PlayerEvent::TimerReady);
        info!("Opened {} ({:.0}ms)", path.display(), duration_ms);
        Ok(duration_ms)
    }

    fn start_stream(&mut self, path: &Path) -> Result<f64, PlaybackHostError> {
        let manager = self.manager.as_mut().ok_or(PlaybackHostError::NoOutput)?;
        let (data, duration_secs) = Self::prepare_stream_data(path)?;
        let mut sound = manager.play(data)?;
        sound.pause(Tween {
            duration: Duration::ZERO,
            ..Default::default()
        });
        self.sound = Some(sound);
        self.was_playing = false;
        self.pending_seek = None;
        Ok(duration_secs * 1000.0)
    }

    pub fn duration_ms(&self) -> Option<f64> {
        self.duration_ms
    }

    pub fn drain_backend_errors(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(manager) = self.manager.as_mut() {
            while let Some(err) = manager.backend_mut().pop_error() {
                error!("Audio backend error: {err}");
            }
        }
    }

    /// Turns everything that happened since the last poll into events.
    pub fn poll(&mut self, now: f64) -> Vec<PlayerEvent> {
        let mut events: Vec<PlayerEvent> = self.queued.drain(..).collect();
        self.drain_backend_errors();

        let Some(sound) = self.sound.as_ref() else {
            return events;
        };
        let playing = matches!(sound.state(), PlaybackState::Playing | PlaybackState::Resuming);
        let position = sound.position() * 1000.0;

        if let Some(seek) = self.pending_seek {
            let settled = (position - seek.target).abs() <= self.settings.seek_settle_ms;
            let timed_out = seek.requested_at.elapsed().as_secs_f64() * 1000.0
                >= self.settings.seek_timeout_ms;
            if settled || timed_out {
                self.pending_seek = None;
                self.last_resync_at = Some(now);
                events.push(PlayerEvent::MediaSeek { position });
            }
        }

        if playing != self.was_playing {
            self.was_playing = playing;
            events.push(if playing { PlayerEvent::Play } else { PlayerEvent::Pause });
        }

        // Positions reported before a seek lands are stale.
        if playing && self.pending_seek.is_none() {
            events.push(PlayerEvent::TimeUpdate { position });
            let due = self
                .last_resync_at
                .is_none_or(|last| now - last >= self.settings.resync_interval_ms);
            if due {
                self.last_resync_at = Some(now);
                events.push(PlayerEvent::MediaSeek { position });
            }
        }

        events
    }

    fn finished(&self) -> bool {
        self.sound
            .as_ref()
            .is_some_and(|sound| matches!(sound.state(), PlaybackState::Stopped))
    }
}

impl PlaybackControl for PlaybackHost {
    fn request_play(&mut self) {
        if self.finished() {
            // A stopped kira stream cannot resume, so start it over.
            if let Some(path) = self.path.clone() {
                if let Err(err) = self.start_stream(&path) {
                    error!("Failed to restart {}: {err}", path.display());
                    return;
                }
            }
        }
        if let Some(sound) = self.sound.as_mut() {
            sound.resume(Tween::default());
        }
    }

    fn request_pause(&mut self) {
        if let Some(sound) = self.sound.as_mut() {
            sound.pause(Tween::default());
        }
    }

    fn request_media_seek(&mut self, position: f64) {
        let upper = self.duration_ms.unwrap_or(f64::MAX);
        let target = position.clamp(0.0, upper);
        if let Some(sound) = self.sound.as_mut() {
            sound.seek_to(target / 1000.0);
            self.pending_seek = Some(PendingSeek {
                target,
                requested_at: Instant::now(),
            });
        }
    }
}
