//! Pure stage transition function
//!
//! The `(stage, event)` match below is the whole funnel: interest prompt,
//! photo submission, owner appraisal, price confirmation and requisites.
//! Any pair without an arm is a stage mismatch and is ignored by the runtime.

use super::texts;
use super::{Capture, ChatId, ChatTarget, Effect, Event, FunnelContext, Keyboard, Stage};
use crate::orders::Order;
use thiserror::Error;

/// Change to the captured-data store, committed together with the stage
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureUpdate {
    #[default]
    Keep,
    Replace(Capture),
    Clear,
}

/// Result of a stage transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_stage: Stage,
    pub capture: CaptureUpdate,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(stage: Stage) -> Self {
        Self {
            new_stage: stage,
            capture: CaptureUpdate::Keep,
            effects: vec![],
        }
    }

    pub fn with_capture(mut self, capture: Capture) -> Self {
        self.capture = CaptureUpdate::Replace(capture);
        self
    }

    pub fn clearing_capture(mut self) -> Self {
        self.capture = CaptureUpdate::Clear;
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("event {event} does not apply to chat {chat} in stage {stage}")]
    StageMismatch {
        chat: ChatId,
        stage: Stage,
        event: &'static str,
    },
    #[error("outcome for upload {file_id} no longer matches the submission in chat {chat}")]
    StaleOutcome { chat: ChatId, file_id: String },
}

/// Pure transition function
///
/// Given the same stage, capture and event it always produces the same
/// result. Terminal results always clear the capture.
pub fn transition(
    stage: Stage,
    capture: Option<&Capture>,
    context: &FunnelContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (stage, event) {
        // ============================================================
        // Commands (valid from every stage)
        // ============================================================

        // Any + Start -> AwaitInterestConfirm (restart from Absent)
        (_, Event::Start) => Ok(TransitionResult::new(Stage::AwaitInterestConfirm)
            .clearing_capture()
            .with_effect(Effect::send_client_with(
                texts::INTEREST_PROMPT,
                Keyboard::choices([texts::CHOICE_YES, texts::CHOICE_NO]),
            ))),

        // Any + Contact -> unchanged
        (stage, Event::Contact) => Ok(TransitionResult::new(stage).with_effect(
            Effect::send_client_with(
                texts::CONTACT_PROMPT,
                Keyboard::link(texts::CONTACT_BUTTON, &context.contact_url),
            ),
        )),

        // ============================================================
        // Interest fork
        // ============================================================
        (Stage::AwaitInterestConfirm, Event::Text { text, .. }) => {
            if texts::is_reply(&text, texts::AFFIRMATIVE) {
                Ok(TransitionResult::new(Stage::AwaitPhoto)
                    .with_effect(Effect::send_client_with(texts::PHOTO_PROMPT, Keyboard::Remove)))
            } else {
                Ok(decline())
            }
        }

        // ============================================================
        // Photo submission
        // ============================================================

        // AwaitPhoto + Photo -> AwaitOwnerPrice (claim the stage before any I/O)
        (Stage::AwaitPhoto, Event::Photo { file_id, sender }) => {
            let user_id = sender.user_id;
            Ok(TransitionResult::new(Stage::AwaitOwnerPrice)
                .with_capture(Capture::submitted(sender, file_id.clone()))
                .with_effect(Effect::FetchPhoto { file_id, user_id }))
        }

        // AwaitOwnerPrice + PhotoStored -> AwaitOwnerPrice (photo captured, forward to owner)
        (Stage::AwaitOwnerPrice, Event::PhotoStored { file_id, photo }) => {
            let Some(capture) = capture.filter(|c| c.is_for(&file_id) && c.photo.is_none()) else {
                return Err(TransitionError::StaleOutcome {
                    chat: context.conversation_id,
                    file_id,
                });
            };
            let caption = texts::appraisal_caption(&capture.profile);
            Ok(TransitionResult::new(Stage::AwaitOwnerPrice)
                .with_capture(Capture {
                    photo: Some(photo.clone()),
                    ..capture.clone()
                })
                .with_effect(Effect::send_client(texts::PHOTO_RECEIVED))
                .with_effect(Effect::ForwardForAppraisal {
                    file_id,
                    photo,
                    caption,
                }))
        }

        // AwaitOwnerPrice + collaborator failure -> AwaitPhoto (ask for the photo again)
        (
            Stage::AwaitOwnerPrice,
            Event::PhotoFailed { file_id, .. } | Event::ForwardFailed { file_id, .. },
        ) => {
            if !capture.is_some_and(|c| c.is_for(&file_id)) {
                return Err(TransitionError::StaleOutcome {
                    chat: context.conversation_id,
                    file_id,
                });
            }
            Ok(TransitionResult::new(Stage::AwaitPhoto)
                .clearing_capture()
                .with_effect(Effect::send_client(texts::PHOTO_RETRY)))
        }

        // ============================================================
        // Owner appraisal and price fork
        // ============================================================
        (Stage::AwaitOwnerPrice, Event::PriceQuoted { price }) => {
            Ok(TransitionResult::new(Stage::AwaitPriceConfirm).with_effect(
                Effect::send_client_with(
                    texts::price_offer(&price),
                    Keyboard::choices([texts::CHOICE_ACCEPT, texts::CHOICE_REJECT]),
                ),
            ))
        }

        (Stage::AwaitPriceConfirm, Event::Text { text, .. }) => {
            if texts::is_reply(&text, texts::ACCEPTANCE) {
                Ok(TransitionResult::new(Stage::AwaitRequisites).with_effect(
                    Effect::send_client_with(texts::REQUISITES_PROMPT, Keyboard::Remove),
                ))
            } else {
                Ok(decline())
            }
        }

        // ============================================================
        // Requisites and completion
        // ============================================================
        (Stage::AwaitRequisites, Event::Text { text, sent_at }) => {
            let Some((capture, photo)) =
                capture.and_then(|c| c.photo.as_ref().map(|photo| (c, photo)))
            else {
                return Ok(restart_required());
            };

            let order = Order::new(sent_at, &capture.profile, photo.clone(), text.clone());
            Ok(TransitionResult::new(Stage::Complete)
                .clearing_capture()
                .with_effect(Effect::AppendOrder { order })
                .with_effect(Effect::SendPhoto {
                    to: ChatTarget::Owner,
                    photo: photo.clone(),
                    caption: Some(texts::requisites_caption(&capture.profile, &text)),
                })
                .with_effect(Effect::send_client(texts::THANKS))
                .with_effect(Effect::send_client_with(
                    texts::CONTACT_HINT,
                    Keyboard::link(texts::CONTACT_MANAGER_BUTTON, &context.contact_url),
                )))
        }

        // ============================================================
        // Stage mismatches
        // ============================================================
        (stage, event) => Err(TransitionError::StageMismatch {
            chat: context.conversation_id,
            stage,
            event: event.kind(),
        }),
    }
}

fn decline() -> TransitionResult {
    TransitionResult::new(Stage::Declined)
        .clearing_capture()
        .with_effect(Effect::send_client_with(texts::DECLINED, Keyboard::Remove))
}

/// Captured data is missing for a stage that presumes it
fn restart_required() -> TransitionResult {
    TransitionResult::new(Stage::Absent)
        .clearing_capture()
        .with_effect(Effect::send_client_with(
            texts::RESTART_REQUIRED,
            Keyboard::Remove,
        ))
}
