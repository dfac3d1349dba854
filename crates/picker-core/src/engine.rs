use crate::error::{PickerError, Result};
use crate::record::Roster;
use chrono::{NaiveDateTime, Timelike};
use rand::seq::SliceRandom;
use rand::Rng;

/// Outcome of a successful draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    /// Position of the chosen record in the roster.
    pub index: usize,
    pub name: String,
    pub order: u32,
}

/// Draw one eligible record uniformly at random and stamp it with `now`
/// (truncated to whole seconds) and the next pick order.
///
/// Returns `Ok(None)` when every record has already been picked, and
/// `OrderOverflow` when no larger pick order exists. The roster is left
/// untouched in both cases.
pub fn pick<R: Rng + ?Sized>(
    roster: &mut Roster,
    rng: &mut R,
    now: NaiveDateTime,
) -> Result<Option<Pick>> {
    let eligible = roster.eligible_indices();
    let Some(&index) = eligible.choose(rng) else {
        return Ok(None);
    };

    let order = roster.next_order().ok_or(PickerError::OrderOverflow(u32::MAX))?;
    let at = now.with_nanosecond(0).unwrap_or(now);
    let record = &mut roster.records[index];
    record.mark_picked(at, order);

    Ok(Some(Pick {
        index,
        name: record.name.clone(),
        order,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
