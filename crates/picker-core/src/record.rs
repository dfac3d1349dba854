use chrono::NaiveDateTime;

/// Column headers of the managed fields in the roster file.
pub const NAME_COLUMN: &str = "Name";
pub const LAST_PICKED_COLUMN: &str = "LastPicked";
pub const PICK_ORDER_COLUMN: &str = "PickOrder";

/// On-disk timestamp format for `LastPicked`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// PickMark / Record
// ---------------------------------------------------------------------------

/// When and in which position a record was drawn. Timestamp and order are
/// only ever set or cleared together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickMark {
    pub at: NaiveDateTime,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    /// Values of the pass-through columns, in `Roster::columns` order.
    pub extra: Vec<String>,
    mark: Option<PickMark>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Vec::new(),
            mark: None,
        }
    }

    pub fn with_mark(mut self, mark: Option<PickMark>) -> Self {
        self.mark = mark;
        self
    }

    pub fn is_eligible(&self) -> bool {
        self.mark.is_none()
    }

    pub fn mark(&self) -> Option<PickMark> {
        self.mark
    }

    pub fn last_picked(&self) -> Option<NaiveDateTime> {
        self.mark.map(|m| m.at)
    }

    pub fn pick_order(&self) -> Option<u32> {
        self.mark.map(|m| m.order)
    }

    pub fn mark_picked(&mut self, at: NaiveDateTime, order: u32) {
        self.mark = Some(PickMark { at, order });
    }

    pub fn clear(&mut self) {
        self.mark = None;
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Name,
    LastPicked,
    PickOrder,
    Extra(String),
}

impl Column {
    pub fn from_header(header: &str) -> Self {
        match header {
            NAME_COLUMN => Column::Name,
            LAST_PICKED_COLUMN => Column::LastPicked,
            PICK_ORDER_COLUMN => Column::PickOrder,
            other => Column::Extra(other.to_string()),
        }
    }

    pub fn header(&self) -> &str {
        match self {
            Column::Name => NAME_COLUMN,
            Column::LastPicked => LAST_PICKED_COLUMN,
            Column::PickOrder => PICK_ORDER_COLUMN,
            Column::Extra(h) => h,
        }
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Every record of the roster file plus the column layout needed to write it
/// back. Records are identified by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    pub columns: Vec<Column>,
    pub records: Vec<Record>,
}

impl Roster {
    /// A roster with only the managed columns.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            columns: vec![Column::Name, Column::LastPicked, Column::PickOrder],
            records,
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Record::new).collect())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn picked_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_eligible()).count()
    }

    pub fn eligible_indices(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_eligible())
            .map(|(i, _)| i)
            .collect()
    }

    /// The order the next pick receives: one past the highest assigned order.
    /// `None` once the highest order is `u32::MAX`.
    pub fn next_order(&self) -> Option<u32> {
        self.records
            .iter()
            .filter_map(Record::pick_order)
            .max()
            .unwrap_or(0)
            .checked_add(1)
    }

    pub fn clear_picks(&mut self) {
        for record in &mut self.records {
            record.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
