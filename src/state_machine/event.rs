//! Events that can occur in a visit conversation

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    /// Entry command (`/inputvisit`)
    Begin,
    /// Plain, non-command text
    UserText { text: String },
    /// Photo message, one entry per resolution the transport offers
    UserPhoto { variants: Vec<PhotoVariant> },
    /// Anything else (stickers, documents, voice, ...)
    UserUnsupported,
    /// Cancel command (`/cancel`)
    Cancel,

    // Effect outcomes
    PhotoStored { path: String },
    PhotoStoreFailed,
    VisitRecorded { recorded_at: String },
    VisitRecordFailed,
}

/// One resolution of an uploaded photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u64>,
}

impl PhotoVariant {
    fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Highest-resolution variant. Ties go to the later entry, matching the
    /// transport's smallest-to-largest ordering.
    pub fn largest(variants: &[PhotoVariant]) -> Option<&PhotoVariant> {
        variants
            .iter()
            .max_by_key(|v| (v.pixels(), v.file_size.unwrap_or(0)))
    }
}
