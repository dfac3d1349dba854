use crate::error::{PickerError, Result};
use crate::record::{Column, PickMark, Record, Roster, NAME_COLUMN, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use std::fs::File;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// RosterStore
// ---------------------------------------------------------------------------

/// Durable home of a roster. `save` is the only way durable state changes.
pub trait RosterStore {
    fn load(&self) -> Result<Roster>;
    fn save(&self, roster: &Roster) -> Result<()>;
}

/// Roster kept in a CSV file, one row per record.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RosterStore for CsvStore {
    fn load(&self) -> Result<Roster> {
        load_roster(&self.path)
    }

    fn save(&self, roster: &Roster) -> Result<()> {
        save_roster(roster, &self.path).map_err(|e| match e {
            e @ PickerError::SaveFailed { .. } => e,
            other => PickerError::SaveFailed {
                path: self.path.clone(),
                reason: other.to_string(),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read a roster file. Files written before `LastPicked`/`PickOrder` existed
/// load with every record eligible; the columns are appended on next save.
pub fn load_roster(path: &Path) -> Result<Roster> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PickerError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let mut reader = csv::ReaderBuilder::new().from_reader(file);

    let file_columns = header_columns(reader.headers()?);
    if !file_columns.contains(&Column::Name) {
        return Err(PickerError::MissingColumn(NAME_COLUMN));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(malformed_from_csv)?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        records.push(parse_row(&file_columns, &row, line)?);
    }

    let mut columns = file_columns;
    for managed in [Column::LastPicked, Column::PickOrder] {
        if !columns.contains(&managed) {
            columns.push(managed);
        }
    }

    let roster = Roster { columns, records };
    if roster.is_empty() {
        tracing::warn!(path = %path.display(), "roster has no records");
    }
    tracing::info!(path = %path.display(), records = roster.len(), "loaded roster");
    Ok(roster)
}

/// Map headers to columns. A managed header seen twice is treated as a
/// pass-through column from its second occurrence on.
fn header_columns(headers: &csv::StringRecord) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::with_capacity(headers.len());
    for header in headers {
        let column = Column::from_header(header);
        if !matches!(column, Column::Extra(_)) && columns.contains(&column) {
            columns.push(Column::Extra(header.to_string()));
        } else {
            columns.push(column);
        }
    }
    columns
}

fn parse_row(columns: &[Column], row: &csv::StringRecord, line: u64) -> Result<Record> {
    let malformed = |reason: String| PickerError::MalformedRow { line, reason };

    let mut name = None;
    let mut last_picked = None;
    let mut pick_order = None;
    let mut extra = Vec::new();

    for (column, value) in columns.iter().zip(row.iter()) {
        match column {
            Column::Name => name = Some(value.to_string()),
            Column::LastPicked => last_picked = parse_timestamp(value).map_err(&malformed)?,
            Column::PickOrder => pick_order = parse_order(value).map_err(&malformed)?,
            Column::Extra(_) => extra.push(value.to_string()),
        }
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| malformed("Name is empty".to_string()))?;

    let mark = match (last_picked, pick_order) {
        (Some(at), Some(order)) => Some(PickMark { at, order }),
        (None, None) => None,
        (Some(_), None) => return Err(malformed("LastPicked is set but PickOrder is empty".into())),
        (None, Some(_)) => return Err(malformed("PickOrder is set but LastPicked is empty".into())),
    };

    let mut record = Record::new(name).with_mark(mark);
    record.extra = extra;
    Ok(record)
}

fn parse_timestamp(value: &str) -> std::result::Result<Option<NaiveDateTime>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(Some)
        .map_err(|e| format!("invalid LastPicked '{value}': {e}"))
}

/// Positive integer, also accepting integral floats such as `3.0` which
/// spreadsheet tools emit for integer columns with blanks.
fn parse_order(value: &str) -> std::result::Result<Option<u32>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let invalid = || format!("invalid PickOrder '{value}': expected a positive integer");
    let order = match value.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            let f: f64 = value.parse().map_err(|_| invalid())?;
            if f.fract() != 0.0 || f < 1.0 || f > f64::from(u32::MAX) {
                return Err(invalid());
            }
            f as u32
        }
    };
    if order == 0 {
        return Err(invalid());
    }
    Ok(Some(order))
}

fn malformed_from_csv(err: csv::Error) -> PickerError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    PickerError::MalformedRow {
        line,
        reason: err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

/// Overwrite `path` with the full roster through a same-directory temp file.
pub fn save_roster(roster: &Roster, path: &Path) -> Result<()> {
    let data = encode(roster)?;
    crate::io::atomic_write(path, &data)?;
    tracing::debug!(path = %path.display(), records = roster.len(), "saved roster");
    Ok(())
}

fn encode(roster: &Roster) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(roster.columns.iter().map(Column::header))?;

    for record in &roster.records {
        let mut extras = record.extra.iter();
        let mut fields: Vec<String> = Vec::with_capacity(roster.columns.len());
        for column in &roster.columns {
            fields.push(match column {
                Column::Name => record.name.clone(),
                Column::LastPicked => record
                    .last_picked()
                    .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                    .unwrap_or_default(),
                Column::PickOrder => record
                    .pick_order()
                    .map(|o| o.to_string())
                    .unwrap_or_default(),
                Column::Extra(_) => extras.next().cloned().unwrap_or_default(),
            });
        }
        writer.write_record(&fields)?;
    }

    writer
        .into_inner()
        .map_err(|e| PickerError::Io(e.into_error()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
