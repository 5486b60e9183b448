use window_mask::locator::WindowRect;
use window_mask::overlay::mask_placement;
use window_mask::settings::MaskConfig;
use window_mask::tracker::{plan_tick, MaskAction, TargetStatus, TrackState};

#[test]
fn visible_target_pulls_mask_to_offset_position() {
    let config = MaskConfig::default();
    let (state, actions) = plan_tick(TargetStatus::Visible { left: 100, top: 100 }, &config);
    assert_eq!(state, TrackState::Tracking);
    assert_eq!(
        actions,
        vec![
            MaskAction::Reposition {
                x: 100 + config.offset_x,
                y: 100 + config.offset_y,
            },
            MaskAction::EnsureVisible,
        ]
    );
}

#[test]
fn hidden_target_hides_mask_without_teardown() {
    let (state, actions) = plan_tick(TargetStatus::Hidden, &MaskConfig::default());
    assert_eq!(state, TrackState::Tracking);
    assert_eq!(actions, vec![MaskAction::Hide]);
}

#[test]
fn gone_target_tears_down_and_resumes_searching() {
    let (state, actions) = plan_tick(TargetStatus::Gone, &MaskConfig::default());
    assert_eq!(state, TrackState::Searching);
    assert_eq!(actions, vec![MaskAction::TearDown]);
}

#[test]
fn replanning_the_same_observation_is_stable() {
    let config = MaskConfig::default();
    let status = TargetStatus::Visible { left: -300, top: 25 };
    assert_eq!(plan_tick(status, &config), plan_tick(status, &config));
}

#[test]
fn new_offsets_take_effect_on_the_next_plan() {
    let status = TargetStatus::Visible { left: 50, top: 60 };
    let before = MaskConfig::default();
    let after = MaskConfig {
        offset_x: 0,
        offset_y: 0,
        ..before
    };

    let (_, actions) = plan_tick(status, &after);
    assert_eq!(
        actions[0],
        MaskAction::Reposition { x: 50, y: 60 },
        "a reloaded offset moves the mask on the very next tick"
    );
    assert_ne!(plan_tick(status, &before).1[0], actions[0]);
}

#[test]
fn plan_reposition_matches_placement_helper() {
    let config = MaskConfig {
        offset_x: -15,
        offset_y: 200,
        ..MaskConfig::default()
    };
    let rect = WindowRect {
        left: 400,
        top: -80,
        width: 1024,
        height: 768,
    };
    let (x, y) = mask_placement(rect, &config);
    let (_, actions) = plan_tick(
        TargetStatus::Visible {
            left: rect.left,
            top: rect.top,
        },
        &config,
    );
    assert_eq!(actions[0], MaskAction::Reposition { x, y });
}
