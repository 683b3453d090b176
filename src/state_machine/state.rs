//! Visit session state types

use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Fields
// ============================================================================

/// One of the four values collected for a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Organization,
    Purpose,
    Photo,
}

impl Field {
    /// Collection order
    pub const ALL: [Field; 4] = [
        Field::Name,
        Field::Organization,
        Field::Purpose,
        Field::Photo,
    ];

    /// Label shown to the visitor
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Nama",
            Field::Organization => "Asal Instansi",
            Field::Purpose => "Keperluan",
            Field::Photo => "Gambar",
        }
    }

    /// The field collected after this one on the first pass
    pub fn next(self) -> Option<Field> {
        match self {
            Field::Name => Some(Field::Organization),
            Field::Organization => Some(Field::Purpose),
            Field::Purpose => Some(Field::Photo),
            Field::Photo => None,
        }
    }

    /// Menu choice that edits this field ("2".."5")
    pub fn edit_choice(self) -> &'static str {
        match self {
            Field::Name => "2",
            Field::Organization => "3",
            Field::Purpose => "4",
            Field::Photo => "5",
        }
    }

    pub fn from_edit_choice(choice: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.edit_choice() == choice)
    }

    pub fn is_text(self) -> bool {
        !matches!(self, Field::Photo)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Drafts
// ============================================================================

/// Values collected so far; any subset may be present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitDraft {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub purpose: Option<String>,
    pub photo: Option<String>,
}

impl VisitDraft {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => self.name.as_deref(),
            Field::Organization => self.organization.as_deref(),
            Field::Purpose => self.purpose.as_deref(),
            Field::Photo => self.photo.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = Some(value.into());
        match field {
            Field::Name => self.name = value,
            Field::Organization => self.organization = value,
            Field::Purpose => self.purpose = value,
            Field::Photo => self.photo = value,
        }
    }

    /// First field (in collection order) that has no value yet
    pub fn first_missing(&self) -> Option<Field> {
        Field::ALL.into_iter().find(|f| self.get(*f).is_none())
    }

    /// Promote to complete details if every field is present
    pub fn complete(&self) -> Option<VisitDetails> {
        Some(VisitDetails {
            name: self.name.clone()?,
            organization: self.organization.clone()?,
            purpose: self.purpose.clone()?,
            photo: self.photo.clone()?,
        })
    }
}

/// A draft with every field present. The confirm step only ever holds one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitDetails {
    pub name: String,
    pub organization: String,
    pub purpose: String,
    /// Path of the stored photo
    pub photo: String,
}

impl From<VisitDetails> for VisitDraft {
    fn from(details: VisitDetails) -> Self {
        Self {
            name: Some(details.name),
            organization: Some(details.organization),
            purpose: Some(details.purpose),
            photo: Some(details.photo),
        }
    }
}

// ============================================================================
// Visit State
// ============================================================================

/// Per-user conversation state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VisitState {
    /// No visit entry in progress
    #[default]
    Idle,

    /// Waiting for the visitor to supply `field`
    Collecting {
        field: Field,
        draft: VisitDraft,
        /// Set when the field is being edited from the confirm menu
        return_to_confirm: bool,
    },

    /// Photo received, download to disk in flight
    StoringPhoto {
        draft: VisitDraft,
        return_to_confirm: bool,
    },

    /// All values collected, waiting for a menu choice
    Confirming { details: VisitDetails },

    /// Visitor confirmed, insert in flight
    Submitting { details: VisitDetails },
}

impl VisitState {
    /// Whether a session exists for this state
    pub fn is_active(&self) -> bool {
        !matches!(self, VisitState::Idle)
    }

    /// Waiting on an effect to report back; user input is not accepted
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            VisitState::StoringPhoto { .. } | VisitState::Submitting { .. }
        )
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            VisitState::Idle => "idle",
            VisitState::Collecting { .. } => "collecting",
            VisitState::StoringPhoto { .. } => "storing_photo",
            VisitState::Confirming { .. } => "confirming",
            VisitState::Submitting { .. } => "submitting",
        }
    }
}

/// File systems cap names at 255 bytes; leave room for the extension
pub const MAX_PHOTO_STEM_BYTES: usize = 200;

/// Context for one visitor's conversation (immutable configuration)
#[derive(Debug, Clone)]
pub struct VisitContext {
    pub user_id: i64,
    pub chat_id: i64,
    /// Directory photos are written into
    pub image_dir: PathBuf,
}

impl VisitContext {
    pub fn new(user_id: i64, chat_id: i64, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_id,
            chat_id,
            image_dir: image_dir.into(),
        }
    }

    /// Destination for a visitor's photo: `<image_dir>/<name>.jpg`.
    ///
    /// Two visitors with the same name share a path, so the later photo
    /// replaces the earlier one. Path separators in the name are replaced so
    /// the file stays inside `image_dir`, and long names are cut to
    /// `MAX_PHOTO_STEM_BYTES` at a character boundary.
    pub fn photo_path(&self, name: &str) -> PathBuf {
        let mut file_stem = String::new();
        for c in name.trim().chars() {
            if file_stem.len() + c.len_utf8() > MAX_PHOTO_STEM_BYTES {
                break;
            }
            file_stem.push(if matches!(c, '/' | '\\') { '_' } else { c });
        }
        let file_stem = match file_stem.as_str() {
            "" | "." | ".." => "visitor".to_string(),
            _ => file_stem,
        };
        self.image_dir.join(format!("{file_stem}.jpg"))
    }
}
