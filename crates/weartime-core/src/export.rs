//! Session log export (CSV and JSON)

use crate::{Result, format::format_duration, models::SessionRecord};
use serde::Serialize;
use std::io::Write;

/// CSV-friendly representation of a SessionRecord
#[derive(Debug, Serialize)]
struct SessionCsv {
    id: i64,
    start_time: String,
    end_time: String,
    duration_ms: u64,
    duration: String,
    is_complete: bool,
    long_duration: bool,
    crosses_midnight: bool,
    interrupted: bool,
}

impl From<&SessionRecord> for SessionCsv {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.id,
            start_time: record.start_time.to_rfc3339(),
            end_time: record.end_time.to_rfc3339(),
            duration_ms: record.session_duration,
            duration: format_duration(record.session_duration),
            is_complete: record.is_complete,
            long_duration: record.long_duration,
            crosses_midnight: record.crosses_midnight,
            interrupted: record.interrupted,
        }
    }
}

pub fn write_csv<W: Write>(records: &[SessionRecord], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    for record in records {
        writer.serialize(SessionCsv::from(record))?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[SessionRecord], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    Ok(())
}
