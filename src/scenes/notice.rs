use bevy::prelude::*;
use bevy::ui::FocusPolicy;

use crate::file::theme::Theme;

/// Why the stage could not be shown. Only the first report is kept.
#[derive(Resource, Debug, Default)]
pub struct StageFailure {
    message: Option<String>,
}

impl StageFailure {
    pub fn report(&mut self, message: impl Into<String>) {
        if self.message.is_none() {
            self.message = Some(message.into());
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.message.is_some()
    }
}

#[derive(Component)]
pub struct FailureNotice;

/// Covers the whole window and swallows pointer input.
pub fn setup_failure_notice(mut commands: Commands, failure: Res<StageFailure>, theme: Res<Theme>) {
    let message = failure.message().unwrap_or("Something went wrong.");
    error!("Stage unavailable: {message}");

    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(16.0),
                ..default()
            },
            BackgroundColor(theme.notice_background),
            FocusPolicy::Block,
            FailureNotice,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Unable to show lyrics"),
                TextFont {
                    font_size: 40.0,
                    ..default()
                },
                TextColor(theme.notice_text),
            ));
            parent.spawn((
                Text::new(message),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(theme.notice_text),
            ));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_failure_wins() {
        let mut failure = StageFailure::default();
        assert!(!failure.is_failed());
        failure.report("font missing");
        failure.report("timing missing");
        assert_eq!(failure.message(), Some("font missing"));
    }
}
