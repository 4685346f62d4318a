//! Press / drag / release handling for the stage viewport.
//!
//! A short press is a click that toggles playback. Holding longer while the
//! song plays turns horizontal drag into a provisional playback position that
//! is committed with a seek on release.

use crate::file::settings::ScrubSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubState {
    pub pressed_at: f64,
    pub press_x: f64,
    /// Position captured when panning started.
    pub anchor: Option<f64>,
    pub provisional: Option<f64>,
}

impl ScrubState {
    pub fn is_panning(&self) -> bool {
        self.anchor.is_some()
    }
}

/// What a release should do to playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseAction {
    TogglePlayback,
    /// Commit the pan by seeking to this position and resuming.
    Commit(f64),
    None,
}

/// What a move did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Panning just started; playback should pause.
    PanStarted(f64),
    Panned(f64),
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct ScrubController {
    state: Option<ScrubState>,
}

impl ScrubController {
    pub fn state(&self) -> Option<&ScrubState> {
        self.state.as_ref()
    }

    pub fn is_panning(&self) -> bool {
        self.state.as_ref().is_some_and(ScrubState::is_panning)
    }

    /// Position override while panning.
    pub fn provisional(&self) -> Option<f64> {
        self.state.as_ref().and_then(|state| state.provisional)
    }

    pub fn press(&mut self, now: f64, x: f64) {
        self.state = Some(ScrubState {
            pressed_at: now,
            press_x: x,
            anchor: None,
            provisional: None,
        });
    }

    /// `position` is the position on screen right now; it becomes the anchor
    /// the first time this move starts a pan.
    pub fn move_to(
        &mut self,
        now: f64,
        x: f64,
        viewport_width: f64,
        is_playing: bool,
        position: f64,
        settings: &ScrubSettings,
    ) -> MoveOutcome {
        let Some(state) = self.state.as_mut() else {
            return MoveOutcome::Ignored;
        };

        let held_long = now - state.pressed_at > settings.click_threshold_ms;
        if !(state.is_panning() || (is_playing && held_long)) {
            return MoveOutcome::Ignored;
        }

        let started = state.anchor.is_none();
        let anchor = *state.anchor.get_or_insert(position);
        let width = viewport_width.max(1.0);
        let provisional = anchor - settings.span_ms * (x - state.press_x) / width;
        state.provisional = Some(provisional);

        if started {
            MoveOutcome::PanStarted(provisional)
        } else {
            MoveOutcome::Panned(provisional)
        }
    }

    /// Ends the gesture. Without a matching press this is a no-op.
    pub fn release(&mut self, now: f64, settings: &ScrubSettings) -> ReleaseAction {
        let Some(state) = self.state.take() else {
            return ReleaseAction::None;
        };

        if now - state.pressed_at < settings.click_threshold_ms {
            ReleaseAction::TogglePlayback
        } else if let Some(provisional) = state.provisional.filter(|_| state.is_panning()) {
            ReleaseAction::Commit(provisional)
        } else {
            ReleaseAction::None
        }
    }
}

/// Camera height and depth for a cursor at `y_fraction` of the viewport
/// height (0 at the top), orbiting the origin at `distance`.
pub fn camera_tilt(y_fraction: f32, max_tilt_degrees: f32, distance: f32) -> (f32, f32) {
    let aspect = -1.0 + 2.0 * y_fraction;
    let angle = max_tilt_degrees.to_radians() * aspect;
    (angle.sin() * distance, angle.cos() * distance)
}
