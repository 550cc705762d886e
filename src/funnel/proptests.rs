//! Property-based tests for the funnel state machine
//!
//! These tests verify key invariants hold across all stages and events.

use super::transition::*;
use super::*;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> FunnelContext {
    FunnelContext::new(ChatId(1), "https://t.me/manager")
}

/// Apply a capture update the way the registry does
fn apply_capture(current: Option<Capture>, update: CaptureUpdate) -> Option<Capture> {
    match update {
        CaptureUpdate::Keep => current,
        CaptureUpdate::Replace(capture) => Some(capture),
        CaptureUpdate::Clear => None,
    }
}

/// Normalize a result stage the way the stage tracker stores it
fn stored(stage: Stage) -> Stage {
    if stage.is_active() {
        stage
    } else {
        Stage::Absent
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        Just(Stage::Absent),
        Just(Stage::AwaitInterestConfirm),
        Just(Stage::AwaitPhoto),
        Just(Stage::AwaitOwnerPrice),
        Just(Stage::AwaitPriceConfirm),
        Just(Stage::AwaitRequisites),
    ]
}

fn arb_profile() -> impl Strategy<Value = ClientProfile> {
    (
        1i64..1_000_000,
        "[A-Za-zА-Яа-я]{1,12}",
        proptest::option::of("[a-z_]{3,10}"),
    )
        .prop_map(|(id, name, username)| ClientProfile::new(id, name, username))
}

fn arb_photo() -> impl Strategy<Value = PhotoRef> {
    "[a-z0-9_]{1,16}".prop_map(|name| PhotoRef::new(format!("photos/{name}.jpg")))
}

/// Upload handles drawn from a small pool so outcomes sometimes match the capture
fn arb_file_id() -> impl Strategy<Value = String> {
    prop_oneof![Just("file-a".to_string()), Just("file-b".to_string())]
}

fn arb_capture() -> impl Strategy<Value = Option<Capture>> {
    proptest::option::of(
        (arb_profile(), arb_file_id(), proptest::option::of(arb_photo())).prop_map(
            |(profile, file_id, photo)| Capture {
                photo,
                ..Capture::submitted(profile, file_id)
            },
        ),
    )
}

fn arb_reply_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Да".to_string()),
        Just("да".to_string()),
        Just("Нет".to_string()),
        Just("Устраивает".to_string()),
        Just("Не устраивает".to_string()),
        "[a-zA-Zа-яА-Я0-9 ]{0,24}",
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Start),
        Just(Event::Contact),
        (arb_reply_text(), 0i64..2_000_000_000).prop_map(|(text, secs)| Event::Text {
            text,
            sent_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }),
        (arb_file_id(), arb_profile())
            .prop_map(|(file_id, sender)| Event::Photo { file_id, sender }),
        "[0-9]{1,6}".prop_map(|price| Event::PriceQuoted { price }),
        (arb_file_id(), arb_photo())
            .prop_map(|(file_id, photo)| Event::PhotoStored { file_id, photo }),
        (arb_file_id(), "[a-z ]{1,20}")
            .prop_map(|(file_id, reason)| Event::PhotoFailed { file_id, reason }),
        (arb_file_id(), "[a-z ]{1,20}")
            .prop_map(|(file_id, reason)| Event::ForwardFailed { file_id, reason }),
    ]
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every stage change enters a waiting stage from its single predecessor
    #[test]
    fn stages_are_entered_only_from_their_predecessor(
        stage in arb_stage(),
        capture in arb_capture(),
        event in arb_event(),
    ) {
        if let Ok(result) = transition(stage, capture.as_ref(), &test_context(), event) {
            if result.new_stage != stage {
                match result.new_stage {
                    Stage::AwaitOwnerPrice => prop_assert_eq!(stage, Stage::AwaitPhoto),
                    Stage::AwaitPriceConfirm => prop_assert_eq!(stage, Stage::AwaitOwnerPrice),
                    Stage::AwaitRequisites => prop_assert_eq!(stage, Stage::AwaitPriceConfirm),
                    Stage::AwaitPhoto => {
                        let from_interest_or_retry =
                            matches!(stage, Stage::AwaitInterestConfirm | Stage::AwaitOwnerPrice);
                        prop_assert!(from_interest_or_retry);
                    }
                    _ => {}
                }
            }
        }
    }

    /// Download outcomes for an upload other than the captured one never apply
    #[test]
    fn outcomes_for_other_uploads_are_rejected(
        capture in arb_capture(),
        event in arb_event(),
    ) {
        let foreign = match &event {
            Event::PhotoStored { file_id, .. }
            | Event::PhotoFailed { file_id, .. }
            | Event::ForwardFailed { file_id, .. } => {
                capture.as_ref().map_or(true, |c| !c.is_for(file_id))
            }
            _ => false,
        };
        let result = transition(Stage::AwaitOwnerPrice, capture.as_ref(), &test_context(), event);
        if foreign {
            prop_assert!(result.is_err());
        }
    }

    /// A photo outside AwaitPhoto never reaches the owner or the photo store
    #[test]
    fn stray_photo_has_no_side_effects(
        stage in arb_stage().prop_filter("not awaiting photo", |s| *s != Stage::AwaitPhoto),
        capture in arb_capture(),
        file_id in "[A-Za-z0-9]{8}",
        sender in arb_profile(),
    ) {
        let result = transition(stage, capture.as_ref(), &test_context(), Event::Photo { file_id, sender });
        prop_assert!(result.is_err());
    }

    /// Orders are appended only on completion, once, with the captured photo
    #[test]
    fn order_append_only_on_completion(
        stage in arb_stage(),
        capture in arb_capture(),
        event in arb_event(),
    ) {
        if let Ok(result) = transition(stage, capture.as_ref(), &test_context(), event) {
            let orders: Vec<_> = result.effects.iter().filter_map(|e| match e {
                Effect::AppendOrder { order } => Some(order),
                _ => None,
            }).collect();

            if result.new_stage == Stage::Complete {
                prop_assert_eq!(orders.len(), 1);
                let captured = capture.as_ref().and_then(|c| c.photo.as_ref());
                prop_assert_eq!(Some(&orders[0].photo), captured);
            } else {
                prop_assert!(orders.is_empty());
            }
        }
    }

    /// Leaving the funnel always drops captured data
    #[test]
    fn terminal_results_clear_capture(
        stage in arb_stage(),
        capture in arb_capture(),
        event in arb_event(),
    ) {
        if let Ok(result) = transition(stage, capture.as_ref(), &test_context(), event) {
            if result.new_stage.is_terminal() {
                prop_assert_eq!(result.capture, CaptureUpdate::Clear);
            }
        }
    }

    /// Every accepted event produces at least one effect
    #[test]
    fn accepted_events_are_never_silent(
        stage in arb_stage(),
        capture in arb_capture(),
        event in arb_event(),
    ) {
        if let Ok(result) = transition(stage, capture.as_ref(), &test_context(), event) {
            prop_assert!(!result.effects.is_empty());
        }
    }

    /// Only the photo and requisites steps talk to the owner
    #[test]
    fn owner_is_contacted_only_with_a_photo(
        stage in arb_stage(),
        capture in arb_capture(),
        event in arb_event(),
    ) {
        if let Ok(result) = transition(stage, capture.as_ref(), &test_context(), event) {
            for effect in result.effects.iter().filter(|e| e.reaches_owner()) {
                let carries_photo = matches!(
                    effect,
                    Effect::ForwardForAppraisal { .. } | Effect::SendPhoto { .. }
                );
                prop_assert!(carries_photo, "owner effect without photo: {:?}", effect);
            }
        }
    }

    /// Random walks never complete without passing through the photo stage
    #[test]
    fn walks_complete_only_through_full_funnel(
        events in proptest::collection::vec(arb_event(), 1..40),
    ) {
        let context = test_context();
        let mut stage = Stage::Absent;
        let mut capture: Option<Capture> = None;
        let mut path: Vec<Stage> = Vec::new();

        for event in events {
            let Ok(result) = transition(stage, capture.as_ref(), &context, event) else {
                continue;
            };

            if result.new_stage == Stage::AwaitInterestConfirm {
                path.clear();
            }
            path.push(result.new_stage);

            if result.new_stage == Stage::Complete {
                let photo_at = path.iter().position(|s| *s == Stage::AwaitPhoto);
                let price_at = path.iter().position(|s| *s == Stage::AwaitPriceConfirm);
                let requisites_at = path.iter().position(|s| *s == Stage::AwaitRequisites);
                prop_assert!(photo_at.is_some());
                prop_assert!(photo_at < price_at);
                prop_assert!(price_at < requisites_at);
            }

            capture = apply_capture(capture, result.capture);
            stage = stored(result.new_stage);

            if !stage.is_active() {
                prop_assert!(capture.is_none());
            }
        }
    }
}

#[test]
fn happy_path_walk() {
    let context = test_context();
    let profile = ClientProfile::new(5, "Пётр", Some("petr".to_string()));
    let photo = PhotoRef::new("photos/photo_5.jpg");
    let sent_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

    let steps = vec![
        (Event::Start, Stage::AwaitInterestConfirm),
        (
            Event::Text {
                text: "Да".to_string(),
                sent_at,
            },
            Stage::AwaitPhoto,
        ),
        (
            Event::Photo {
                file_id: "f".to_string(),
                sender: profile,
            },
            Stage::AwaitOwnerPrice,
        ),
        (
            Event::PhotoStored {
                file_id: "f".to_string(),
                photo,
            },
            Stage::AwaitOwnerPrice,
        ),
        (
            Event::PriceQuoted {
                price: "1500".to_string(),
            },
            Stage::AwaitPriceConfirm,
        ),
        (
            Event::Text {
                text: "Устраивает".to_string(),
                sent_at,
            },
            Stage::AwaitRequisites,
        ),
        (
            Event::Text {
                text: "реквизиты".to_string(),
                sent_at,
            },
            Stage::Complete,
        ),
    ];

    let mut stage = Stage::Absent;
    let mut capture = None;
    for (event, expected) in steps {
        let result = transition(stage, capture.as_ref(), &context, event).unwrap();
        assert_eq!(result.new_stage, expected);
        capture = apply_capture(capture, result.capture);
        stage = stored(result.new_stage);
    }

    assert_eq!(stage, Stage::Absent);
    assert!(capture.is_none());
}
