//! Database schema and types

use crate::state_machine::VisitDetails;
use chrono::NaiveDateTime;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS visitors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tanggal TEXT NOT NULL,
    nama TEXT NOT NULL,
    asal_instansi TEXT NOT NULL,
    keperluan TEXT NOT NULL,
    gambar TEXT NOT NULL
);
";

pub const INSERT_VISITOR: &str =
    "INSERT INTO visitors (tanggal, nama, asal_instansi, keperluan, gambar) VALUES (?1, ?2, ?3, ?4, ?5)";

pub const COUNT_VISITORS: &str = "SELECT COUNT(*) FROM visitors";

/// Visit timestamps are local wall-clock time in this format
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A confirmed visit, as stored in the `visitors` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorRecord {
    /// `tanggal`
    pub timestamp: String,
    /// `nama`
    pub name: String,
    /// `asal_instansi`
    pub organization: String,
    /// `keperluan`
    pub purpose: String,
    /// `gambar`
    pub photo: String,
}

impl VisitorRecord {
    /// Assemble a record from confirmed details, stamped at `at`
    pub fn stamp(details: VisitDetails, at: NaiveDateTime) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            name: details.name,
            organization: details.organization,
            purpose: details.purpose,
            photo: details.photo,
        }
    }
}
