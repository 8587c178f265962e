//! Session record log encoding (JSON array under one key)

use crate::{Result, models::SessionRecord};
use serde_json::Value;

/// Outcome of decoding the persisted log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedLog {
    /// No value stored yet
    Missing,
    /// Value present but not a JSON array of records
    Corrupt,
    /// Parsed records; `skipped` counts individual entries that were invalid
    Records {
        records: Vec<SessionRecord>,
        skipped: usize,
    },
}

impl DecodedLog {
    /// Records, or an empty log if nothing usable was stored
    pub fn into_records(self) -> Vec<SessionRecord> {
        match self {
            DecodedLog::Records { records, .. } => records,
            DecodedLog::Missing | DecodedLog::Corrupt => Vec::new(),
        }
    }
}

pub fn decode(raw: Option<&str>) -> DecodedLog {
    let Some(raw) = raw else {
        return DecodedLog::Missing;
    };

    if raw.trim().is_empty() {
        return DecodedLog::Missing;
    }

    let values: Vec<Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!("Session log is not a valid record list, ignoring it: {}", e);
            return DecodedLog::Corrupt;
        }
    };

    let mut records = Vec::with_capacity(values.len());
    let mut skipped = 0;

    for value in values {
        match serde_json::from_value::<SessionRecord>(value)
            .ok()
            .and_then(SessionRecord::normalize)
        {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} invalid session records", skipped);
    }

    DecodedLog::Records { records, skipped }
}

pub fn encode(records: &[SessionRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

/// Drop the oldest records so at most `max_records` remain. Returns how many
/// were dropped.
pub fn apply_retention(records: &mut Vec<SessionRecord>, max_records: Option<usize>) -> usize {
    let Some(max) = max_records else {
        return 0;
    };

    if records.len() <= max {
        return 0;
    }

    let excess = records.len() - max;
    records.drain(..excess);
    excess
}
