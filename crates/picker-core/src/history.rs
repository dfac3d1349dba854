use crate::record::Roster;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Default number of entries shown in the recent-picks list.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentPick {
    pub order: u32,
    pub name: String,
    pub picked_at: NaiveDateTime,
}

impl RecentPick {
    /// `#3   Alice (09:30:15)`
    pub fn display_line(&self) -> String {
        format!(
            "{:<4} {} ({})",
            format!("#{}", self.order),
            self.name,
            self.picked_at.format("%H:%M:%S")
        )
    }
}

/// Most recent picks first. Timestamps only have second resolution, so ties
/// fall back to pick order (higher first) and then roster position.
pub fn recent_picks(roster: &Roster, limit: usize) -> Vec<RecentPick> {
    let mut picked: Vec<(usize, RecentPick)> = roster
        .records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| {
            r.mark().map(|m| {
                (
                    i,
                    RecentPick {
                        order: m.order,
                        name: r.name.clone(),
                        picked_at: m.at,
                    },
                )
            })
        })
        .collect();

    picked.sort_by(|(ia, a), (ib, b)| {
        b.picked_at
            .cmp(&a.picked_at)
            .then(b.order.cmp(&a.order))
            .then(ia.cmp(ib))
    });
    picked.truncate(limit);
    picked.into_iter().map(|(_, p)| p).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
