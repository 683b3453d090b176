//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! result. All I/O is expressed as [`Effect`]s for the runtime to execute.

use super::event::PhotoVariant;
use super::state::{Field, VisitDetails, VisitDraft};
use super::{Effect, Event, VisitContext, VisitState};
use thiserror::Error;

pub const START_PROMPT: &str = "Please enter the visitor data:\nNama:";
pub const PHOTO_PROMPT: &str = "Please upload the visitor\u{2019}s image (selfie):";
pub const INVALID_IMAGE: &str = "Please upload a valid image.";
pub const PHOTO_STORE_FAILED: &str = "Failed to save the image. Please upload it again.";
pub const INVALID_CHOICE: &str = "Invalid choice. Please select a valid option (1-5).";
pub const RECORD_FAILED: &str = "Failed to record the visit. Please try again.";
pub const CANCELLED: &str = "Input cancelled.";

const NOT_PROVIDED: &str = "Not provided";
const NOT_UPLOADED: &str = "Not uploaded";
const IMAGE_SAVED: &str = "(Image saved)";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: VisitState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: VisitState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Text of every reply effect, in order
    #[cfg(test)]
    pub fn replies(&self) -> Vec<&str> {
        self.effects.iter().filter_map(Effect::reply_text).collect()
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A visit entry is already in progress. Finish it or send /cancel to start over.")]
    VisitInProgress,
    #[error("There is no visit entry in progress. Use /inputvisit to start one.")]
    NoActiveVisit,
    #[error("Still processing the previous message, please wait.")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Whether the error text should be sent back to the visitor
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, TransitionError::InvalidTransition(_))
    }
}

/// Pure transition function
#[allow(clippy::too_many_lines)] // One arm per state/event pair
pub fn transition(
    state: &VisitState,
    context: &VisitContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Session lifecycle
        // ============================================================

        // Idle + Begin -> Collecting name. Confirm is only reachable by collecting every field.
        (VisitState::Idle, Event::Begin) => Ok(TransitionResult::new(VisitState::Collecting {
            field: Field::Name,
            draft: VisitDraft::default(),
            return_to_confirm: false,
        })
        .with_effect(Effect::reply(START_PROMPT))),

        (_, Event::Begin) => Err(TransitionError::VisitInProgress),

        (VisitState::Idle, Event::Cancel) => Err(TransitionError::NoActiveVisit),

        (state, Event::Cancel) if state.is_busy() => Err(TransitionError::Busy),

        (_, Event::Cancel) => {
            Ok(TransitionResult::new(VisitState::Idle).with_effect(Effect::reply(CANCELLED)))
        }

        // ============================================================
        // Text fields
        // ============================================================
        (
            VisitState::Collecting {
                field,
                draft,
                return_to_confirm,
            },
            Event::UserText { text },
        ) if field.is_text() => {
            // Stored as entered minus surrounding whitespace, which Telegram
            // already strips from message text
            let value = text.trim();
            if value.is_empty() {
                return Ok(TransitionResult::new(state.clone())
                    .with_effect(Effect::reply(field_prompt(*field))));
            }
            let mut draft = draft.clone();
            draft.set(*field, value);
            Ok(advance(draft, *field, *return_to_confirm))
        }

        (
            VisitState::Collecting { field, .. },
            Event::UserPhoto { .. } | Event::UserUnsupported,
        ) if field.is_text() => Ok(TransitionResult::new(state.clone()).with_effect(
            Effect::reply(format!("Please send {field} as a text message.")),
        )),

        // ============================================================
        // Photo
        // ============================================================
        (
            VisitState::Collecting {
                field: Field::Photo,
                draft,
                return_to_confirm,
            },
            Event::UserPhoto { variants },
        ) => match PhotoVariant::largest(&variants) {
            Some(largest) => {
                let dest = context.photo_path(draft.name.as_deref().unwrap_or_default());
                Ok(TransitionResult::new(VisitState::StoringPhoto {
                    draft: draft.clone(),
                    return_to_confirm: *return_to_confirm,
                })
                .with_effect(Effect::store_photo(largest.file_id.clone(), dest)))
            }
            None => Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(INVALID_IMAGE))),
        },

        (
            VisitState::Collecting {
                field: Field::Photo,
                ..
            },
            Event::UserText { .. } | Event::UserUnsupported,
        ) => Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(INVALID_IMAGE))),

        (
            VisitState::StoringPhoto {
                draft,
                return_to_confirm,
            },
            Event::PhotoStored { path },
        ) => {
            let mut draft = draft.clone();
            draft.set(Field::Photo, path);
            Ok(advance(draft, Field::Photo, *return_to_confirm))
        }

        (
            VisitState::StoringPhoto {
                draft,
                return_to_confirm,
            },
            Event::PhotoStoreFailed,
        ) => Ok(TransitionResult::new(VisitState::Collecting {
            field: Field::Photo,
            draft: draft.clone(),
            return_to_confirm: *return_to_confirm,
        })
        .with_effect(Effect::reply(PHOTO_STORE_FAILED))),

        // ============================================================
        // Confirmation menu
        // ============================================================
        (VisitState::Confirming { details }, Event::UserText { text }) => {
            let choice = text.trim();
            if choice == "1" {
                return Ok(TransitionResult::new(VisitState::Submitting {
                    details: details.clone(),
                })
                .with_effect(Effect::record_visit(details.clone())));
            }
            match Field::from_edit_choice(choice) {
                Some(field) => Ok(TransitionResult::new(VisitState::Collecting {
                    field,
                    draft: details.clone().into(),
                    return_to_confirm: true,
                })
                .with_effect(Effect::reply(edit_prompt(field)))),
                None => Ok(TransitionResult::new(state.clone())
                    .with_effect(Effect::reply(INVALID_CHOICE))),
            }
        }

        (VisitState::Confirming { .. }, Event::UserPhoto { .. } | Event::UserUnsupported) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(INVALID_CHOICE)))
        }

        // ============================================================
        // Submission
        // ============================================================
        (VisitState::Submitting { .. }, Event::VisitRecorded { recorded_at }) => {
            Ok(TransitionResult::new(VisitState::Idle).with_effect(Effect::reply(format!(
                "Visit recorded in the database at {recorded_at}."
            ))))
        }

        (VisitState::Submitting { .. }, Event::VisitRecordFailed) => {
            Ok(TransitionResult::new(VisitState::Idle).with_effect(Effect::reply(RECORD_FAILED)))
        }

        // ============================================================
        // Rejections
        // ============================================================
        (
            state,
            Event::UserText { .. } | Event::UserPhoto { .. } | Event::UserUnsupported,
        ) if state.is_busy() => Err(TransitionError::Busy),

        (
            VisitState::Idle,
            Event::UserText { .. } | Event::UserPhoto { .. } | Event::UserUnsupported,
        ) => Err(TransitionError::NoActiveVisit),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with event {:?}",
            state.kind(),
            event
        ))),
    }
}

/// Move on after `from` was filled in: to the next field on the first pass,
/// straight back to the confirm menu after an edit.
fn advance(draft: VisitDraft, from: Field, return_to_confirm: bool) -> TransitionResult {
    let next = if return_to_confirm { None } else { from.next() };
    match (next, draft.complete()) {
        (None, Some(details)) => confirm(details),
        (Some(field), _) => collect(field, draft, false),
        // Unreachable through the menu; resume at the first gap
        (None, None) => {
            let field = draft.first_missing().unwrap_or(Field::Name);
            collect(field, draft, return_to_confirm)
        }
    }
}

fn collect(field: Field, draft: VisitDraft, return_to_confirm: bool) -> TransitionResult {
    TransitionResult::new(VisitState::Collecting {
        field,
        draft,
        return_to_confirm,
    })
    .with_effect(Effect::reply(field_prompt(field)))
}

fn confirm(details: VisitDetails) -> TransitionResult {
    let summary = render_confirmation(&details.clone().into());
    TransitionResult::new(VisitState::Confirming { details }).with_effect(Effect::reply(summary))
}

fn field_prompt(field: Field) -> String {
    match field {
        Field::Photo => PHOTO_PROMPT.to_string(),
        _ => format!("{field}:"),
    }
}

fn edit_prompt(field: Field) -> String {
    match field {
        Field::Photo => "Please upload the correct image:".to_string(),
        _ => format!("Please enter the correct {field}:"),
    }
}

/// Summary of collected values followed by the numbered menu
pub fn render_confirmation(draft: &VisitDraft) -> String {
    let text_value = |field: Field| draft.get(field).unwrap_or(NOT_PROVIDED);
    let photo_value = if draft.photo.is_some() {
        IMAGE_SAVED
    } else {
        NOT_UPLOADED
    };

    let mut menu = String::from("Please select an option:\n1 - Confirm");
    for field in Field::ALL {
        menu.push_str(&format!("\n{} - Edit {field}", field.edit_choice()));
    }

    format!(
        "Please confirm the visitor data:\n\n\
         1. {}: {}\n\
         2. {}: {}\n\
         3. {}: {}\n\
         4. {}: {}\n\n\
         {menu}",
        Field::Name,
        text_value(Field::Name),
        Field::Organization,
        text_value(Field::Organization),
        Field::Purpose,
        text_value(Field::Purpose),
        Field::Photo,
        photo_value,
    )
}
