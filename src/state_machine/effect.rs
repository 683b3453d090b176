//! Effects produced by state transitions

use crate::state_machine::state::VisitDetails;
use std::path::PathBuf;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a text reply to the visitor's chat
    Reply { text: String },

    /// Download a photo to disk; reports back with `PhotoStored` or `PhotoStoreFailed`
    StorePhoto { file_id: String, dest: PathBuf },

    /// Stamp and insert the visit; reports back with `VisitRecorded` or `VisitRecordFailed`
    RecordVisit { details: VisitDetails },
}

impl Effect {
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply { text: text.into() }
    }

    pub fn store_photo(file_id: impl Into<String>, dest: PathBuf) -> Self {
        Effect::StorePhoto {
            file_id: file_id.into(),
            dest,
        }
    }

    pub fn record_visit(details: VisitDetails) -> Self {
        Effect::RecordVisit { details }
    }

    /// Text of a reply effect, if this is one
    #[cfg(test)]
    pub fn reply_text(&self) -> Option<&str> {
        match self {
            Effect::Reply { text } => Some(text),
            _ => None,
        }
    }
}
