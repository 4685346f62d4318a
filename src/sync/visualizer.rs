use bevy::prelude::*;

use crate::components::lyric_layout::LyricLayout;
use crate::components::rings::{RingField, RingId, TransientRing};
use crate::file::settings::{CameraSettings, Settings};
use crate::sync::clock::ClockEstimator;
use crate::sync::events::{PlaybackControl, PlayerListener, SharedMetadata};
use crate::sync::metadata::VideoInformation;
use crate::sync::progress::PlaybackProgress;
use crate::sync::scrub::{camera_tilt, MoveOutcome, ReleaseAction, ScrubController};
use crate::sync::tracker::BeatTracker;

/// Result of one tick of the frame loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum FrameOutcome {
    /// Neither playing nor panning: nothing was recomputed.
    #[default]
    Idle,
    Rendered { progress: f64 },
}

/// Host-visible flags, mirrored onto the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStatus {
    pub ready: bool,
    pub playing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CameraPose {
    pub fn resting(settings: &CameraSettings) -> Self {
        Self { x: settings.x, y: 0.0, z: settings.distance }
    }

    pub fn tilted(y_fraction: f32, settings: &CameraSettings) -> Self {
        let (y, z) = camera_tilt(y_fraction, settings.max_tilt_degrees, settings.distance);
        Self { x: settings.x, y, z }
    }
}

#[derive(Debug, Default)]
pub struct RingChanges {
    pub spawned: Vec<TransientRing>,
    pub removed: Vec<RingId>,
}

/// Everything one visualization session knows, driven by player events,
/// pointer input and the frame loop.
#[derive(Resource)]
pub struct Visualizer {
    settings: Settings,
    progress: PlaybackProgress,
    video: VideoInformation,
    source: Option<SharedMetadata>,
    clock: ClockEstimator,
    tracker: BeatTracker,
    layout: LyricLayout,
    layout_generation: u32,
    rings: RingField,
    scrub: ScrubController,
    camera: CameraPose,
    status: StageStatus,
    last_active_frame: Option<f64>,
    last_outcome: FrameOutcome,
}

impl Visualizer {
    pub fn new(settings: Settings, palette_len: usize) -> Self {
        Self {
            camera: CameraPose::resting(&settings.camera),
            settings,
            progress: PlaybackProgress::default(),
            video: VideoInformation::default(),
            source: None,
            clock: ClockEstimator::default(),
            tracker: BeatTracker::new(palette_len),
            layout: LyricLayout::default(),
            layout_generation: 0,
            rings: RingField::default(),
            scrub: ScrubController::default(),
            status: StageStatus::default(),
            last_active_frame: None,
            last_outcome: FrameOutcome::Idle,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn progress(&self) -> &PlaybackProgress {
        &self.progress
    }

    pub fn video_information(&self) -> VideoInformation {
        self.video
    }

    pub fn source(&self) -> Option<&SharedMetadata> {
        self.source.as_ref()
    }

    pub fn clock(&self) -> &ClockEstimator {
        &self.clock
    }

    pub fn tracker(&self) -> &BeatTracker {
        &self.tracker
    }

    pub fn layout(&self) -> &LyricLayout {
        &self.layout
    }

    /// Bumped every time the layout is rebuilt for new timing data.
    pub fn layout_generation(&self) -> u32 {
        self.layout_generation
    }

    pub fn rings(&self) -> &RingField {
        &self.rings
    }

    pub fn scrub(&self) -> &ScrubController {
        &self.scrub
    }

    pub fn camera(&self) -> CameraPose {
        self.camera
    }

    pub fn status(&self) -> StageStatus {
        self.status
    }

    pub fn last_outcome(&self) -> FrameOutcome {
        self.last_outcome
    }

    pub fn is_active(&self) -> bool {
        self.progress.is_playing || self.scrub.is_panning()
    }

    /// Position the stage shows at `now`.
    pub fn position_at(&self, now: f64) -> f64 {
        match self.scrub.provisional() {
            Some(provisional) if self.scrub.is_panning() => provisional,
            _ if self.progress.is_playing => self.clock.estimate(now),
            _ => self.progress.position,
        }
    }

    pub fn press(&mut self, now: f64, x: f64) {
        self.scrub.press(now, x);
    }

    /// `y_fraction` is the cursor height over the viewport height, 0 at the top.
    pub fn pointer_moved(
        &mut self,
        now: f64,
        x: f64,
        y_fraction: f32,
        viewport_width: f64,
        control: &mut dyn PlaybackControl,
    ) {
        self.camera = CameraPose::tilted(y_fraction, &self.settings.camera);

        let position = self.position_at(now);
        let outcome = self.scrub.move_to(
            now,
            x,
            viewport_width,
            self.progress.is_playing,
            position,
            &self.settings.scrub,
        );
        if let MoveOutcome::PanStarted(provisional) = outcome {
            debug!("panning from {position:.0}ms, provisional {provisional:.0}ms");
            control.request_pause();
        }
    }

    pub fn release(&mut self, now: f64, control: &mut dyn PlaybackControl) {
        match self.scrub.release(now, &self.settings.scrub) {
            ReleaseAction::TogglePlayback => {
                if self.progress.is_playing {
                    control.request_pause();
                } else {
                    control.request_play();
                }
            }
            ReleaseAction::Commit(position) => {
                // The seek takes a few hundred milliseconds to land; rebasing
                // first keeps the picture from jumping back in the meantime.
                self.clock.rebase(now, position);
                self.progress.position = position;
                control.request_media_seek(position);
                control.request_play();
                debug!("pan committed at {position:.0}ms");
            }
            ReleaseAction::None => {}
        }
    }

    /// One tick of the frame loop.
    pub fn frame(&mut self, now: f64) -> FrameOutcome {
        if !self.is_active() {
            self.last_active_frame = None;
            self.last_outcome = FrameOutcome::Idle;
            return self.last_outcome;
        }

        let progress = self.position_at(now);
        self.layout.update(progress, &self.settings.timeline);

        let delta_secs = self
            .last_active_frame
            .map_or(0.0, |last| ((now - last) / 1000.0).max(0.0));
        self.last_active_frame = Some(now);
        self.rings.advance(delta_secs, self.settings.timeline.speed_factor, &self.settings.rings);

        self.last_outcome = FrameOutcome::Rendered { progress };
        self.last_outcome
    }

    pub fn take_ring_changes(&mut self) -> RingChanges {
        let spawned = self
            .rings
            .take_spawned()
            .into_iter()
            .filter_map(|id| self.rings.get(id).cloned())
            .collect();
        RingChanges {
            spawned,
            removed: self.rings.take_removed(),
        }
    }
}

impl PlayerListener for Visualizer {
    fn on_app_ready(&mut self, _now: f64) {
        info!("app is ready");
    }

    fn on_video_ready(&mut self, _now: f64, source: SharedMetadata) {
        let video = source.video_information();
        info!("charCount: {}", video.char_count);
        info!("wordCount: {}", video.word_count);
        info!("duration: {}", video.duration);

        self.video = video;
        self.layout = LyricLayout::build(source.phrases(), &self.settings.timeline);
        self.layout_generation += 1;
        self.source = Some(source);
    }

    fn on_timer_ready(&mut self, _now: f64) {
        info!("timer is ready");
        self.progress.ready = true;
        self.status.ready = true;
    }

    fn on_time_update(&mut self, _now: f64, position: f64) {
        self.progress.position = position;
        if let Some(source) = &self.source {
            self.tracker.tick(
                &mut self.progress,
                source.as_ref(),
                &mut self.rings,
                &self.settings.rings,
            );
        }
    }

    fn on_play(&mut self, now: f64) {
        self.progress.is_playing = true;
        self.clock.rebase(now, self.progress.position);
        self.rings.clear();
        self.status.playing = true;
        info!("playing");
    }

    fn on_pause(&mut self, _now: f64) {
        self.progress.is_playing = false;
        if !self.scrub.is_panning() {
            self.status.playing = false;
        }
        info!("paused");
    }

    fn on_media_seek(&mut self, now: f64, position: f64) {
        self.progress.position = position;
        let tolerance = self.settings.scrub.drift_tolerance_ms;
        if self.clock.resync(now, position, tolerance) {
            debug!("resynced clock to {position:.0}ms");
        }
    }

    fn on_media_change(&mut self, _now: f64) {
        info!("media changed");
    }
}
