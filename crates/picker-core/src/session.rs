use crate::engine::{self, Pick};
use crate::error::Result;
use crate::history::{self, RecentPick};
use crate::record::Roster;
use crate::store::RosterStore;
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const RESET_MESSAGE: &str = "ALL STUDENTS RESET";
pub const EXHAUSTED_MESSAGE: &str = "ALL PICKED - PRESS R TO RESET";

// ---------------------------------------------------------------------------
// Announcement
// ---------------------------------------------------------------------------

/// The most recent outcome surfaced to the operator. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Announcement {
    #[default]
    Idle,
    Message(String),
    Picked { name: String, order: u32 },
}

impl Announcement {
    pub fn reset() -> Self {
        Announcement::Message(RESET_MESSAGE.to_string())
    }

    pub fn exhausted() -> Self {
        Announcement::Message(EXHAUSTED_MESSAGE.to_string())
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Announcement::Idle)
    }

    /// `#2 - Alice` for a pick, the bare text for a message.
    pub fn text(&self) -> Option<String> {
        match self {
            Announcement::Idle => None,
            Announcement::Message(m) => Some(m.clone()),
            Announcement::Picked { name, order } => Some(format!("#{order} - {name}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pick,
    Undo,
    Reset,
    Quit,
}

/// Roster and announcement as they were before the last pick or reset.
#[derive(Debug, Clone)]
struct Snapshot {
    roster: Roster,
    announcement: Announcement,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Owns the live roster for the lifetime of the process and drives every
/// state transition. Each mutating transition saves immediately; a failed
/// save is kept as a status line and the in-memory roster stays
/// authoritative.
pub struct Session<S> {
    store: S,
    roster: Roster,
    announcement: Announcement,
    undo: Option<Snapshot>,
    rng: StdRng,
    status: Option<String>,
    finished: bool,
}

impl<S: RosterStore> Session<S> {
    /// Load the roster from `store`. Any load failure is fatal to the caller.
    pub fn open(store: S) -> Result<Self> {
        let roster = store.load()?;
        Ok(Self::with_roster(store, roster))
    }

    pub fn with_roster(store: S, roster: Roster) -> Self {
        Self {
            store,
            roster,
            announcement: Announcement::Idle,
            undo: None,
            rng: StdRng::from_entropy(),
            status: None,
            finished: false,
        }
    }

    /// Replace the random source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Pick => {
                self.pick();
            }
            Command::Undo => {
                self.undo();
            }
            Command::Reset => self.reset(),
            Command::Quit => self.quit(),
        }
    }

    /// Draw the next record. `None` means nothing was picked: either every
    /// record has been picked, or no larger pick order exists (reported
    /// through `status()`). The roster is not saved in either case since
    /// nothing changed.
    pub fn pick(&mut self) -> Option<Pick> {
        let snapshot = self.snapshot();
        let now = Local::now().naive_local();
        match engine::pick(&mut self.roster, &mut self.rng, now) {
            Ok(Some(pick)) => {
                self.undo = Some(snapshot);
                tracing::info!(name = %pick.name, order = pick.order, "picked");
                self.announcement = Announcement::Picked {
                    name: pick.name.clone(),
                    order: pick.order,
                };
                self.persist();
                Some(pick)
            }
            Ok(None) => {
                self.undo = Some(snapshot);
                tracing::info!("no eligible records left");
                self.announcement = Announcement::exhausted();
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "pick refused");
                self.status = Some(e.to_string());
                None
            }
        }
    }

    /// Restore the state from before the last pick or reset. Returns `false`
    /// when there is nothing to undo; a second undo in a row is a no-op.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo.take() else {
            return false;
        };
        self.roster = snapshot.roster;
        self.announcement = snapshot.announcement;
        tracing::info!(picked = self.roster.picked_count(), "undid last change");
        self.persist();
        true
    }

    /// Clear every pick in the roster.
    pub fn reset(&mut self) {
        self.undo = Some(self.snapshot());
        self.roster.clear_picks();
        self.announcement = Announcement::reset();
        tracing::info!(records = self.roster.len(), "reset all picks");
        self.persist();
    }

    /// Stop the control loop. Every mutating transition has already saved.
    pub fn quit(&mut self) {
        self.finished = true;
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            roster: self.roster.clone(),
            announcement: self.announcement.clone(),
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.roster) {
            Ok(()) => self.status = None,
            Err(e) => {
                tracing::warn!(error = %e, "save failed, keeping in-memory roster");
                self.status = Some(e.to_string());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn total_count(&self) -> usize {
        self.roster.len()
    }

    pub fn picked_count(&self) -> usize {
        self.roster.picked_count()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.picked_count()
    }

    pub fn recent_picks(&self, limit: usize) -> Vec<RecentPick> {
        history::recent_picks(&self.roster, limit)
    }

    pub fn current_announcement(&self) -> &Announcement {
        &self.announcement
    }

    #[cfg(test)]
    pub(crate) fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn can_undo(&self) -> bool {
        self.undo.is_some()
    }

    /// Message of the last failed save or refused pick, cleared by the next
    /// successful save.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PickerError;
    use crate::store::CsvStore;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryStore {
        saves: RefCell<Vec<Roster>>,
        fail: Cell<bool>,
    }

    impl RosterStore for MemoryStore {
        fn load(&self) -> Result<Roster> {
            Ok(Roster::from_names(["Alice", "Bob", "Carol"]))
        }

        fn save(&self, roster: &Roster) -> Result<()> {
            if self.fail.get() {
                return Err(PickerError::SaveFailed {
                    path: PathBuf::from("students.csv"),
                    reason: "disk full".to_string(),
                });
            }
            self.saves.borrow_mut().push(roster.clone());
            Ok(())
        }
    }

    fn session() -> Session<MemoryStore> {
        Session::open(MemoryStore::default())
            .unwrap()
            .with_rng(StdRng::seed_from_u64(11))
    }

    fn assert_marks_consistent(roster: &Roster) {
        for r in &roster.records {
            assert_eq!(r.last_picked().is_some(), r.pick_order().is_some());
        }
    }

    #[test]
    fn starts_idle_without_undo() {
        let s = session();
        assert!(s.current_announcement().is_idle());
        assert!(!s.can_undo());
        assert_eq!(s.total_count(), 3);
        assert_eq!(s.picked_count(), 0);
        assert_eq!(s.remaining_count(), 3);
    }

    #[test]
    fn pick_undo_reset_scenario() {
        let mut s = session();

        let first = s.pick().unwrap();
        assert_eq!(first.order, 1);
        assert_eq!(s.picked_count(), 1);
        assert_eq!(
            s.current_announcement(),
            &Announcement::Picked {
                name: first.name.clone(),
                order: 1
            }
        );

        let second = s.pick().unwrap();
        assert_ne!(second.index, first.index);
        assert_eq!(second.order, 2);
        assert_eq!(s.picked_count(), 2);

        assert!(s.undo());
        assert_eq!(s.picked_count(), 1);
        assert_eq!(s.roster().records[first.index].pick_order(), Some(1));
        assert!(s.roster().records[second.index].is_eligible());
        assert_eq!(s.current_announcement().text(), Some(format!("#1 - {}", first.name)));

        s.reset();
        assert_eq!(s.picked_count(), 0);
        assert_eq!(s.roster().eligible_indices(), vec![0, 1, 2]);
        assert_eq!(s.current_announcement(), &Announcement::reset());
        assert_marks_consistent(s.roster());
    }

    #[test]
    fn every_mutation_saves() {
        let mut s = session();
        s.pick();
        s.reset();
        s.undo();
        let saves = s.store().saves.borrow();
        assert_eq!(saves.len(), 3);
        assert_eq!(saves[0].picked_count(), 1);
        assert_eq!(saves[1].picked_count(), 0);
        assert_eq!(saves[2].picked_count(), 1);
    }

    #[test]
    fn exhausted_pick_announces_and_does_not_save() {
        let mut s = session();
        for _ in 0..3 {
            s.pick().unwrap();
        }
        let saves_before = s.store().saves.borrow().len();
        let roster_before = s.roster().clone();

        assert_eq!(s.pick(), None);
        assert_eq!(s.current_announcement(), &Announcement::exhausted());
        assert_eq!(s.roster(), &roster_before);
        assert_eq!(s.store().saves.borrow().len(), saves_before);
    }

    #[test]
    fn undo_after_exhausted_pick_restores_previous_announcement() {
        let mut s = session();
        for _ in 0..3 {
            s.pick().unwrap();
        }
        let last = s.current_announcement().clone();
        s.pick();
        assert!(s.undo());
        assert_eq!(s.current_announcement(), &last);
        assert_eq!(s.picked_count(), 3);
    }

    #[test]
    fn undo_is_one_shot() {
        let mut s = session();
        s.pick();
        s.pick();
        assert!(s.undo());
        let roster = s.roster().clone();
        let announcement = s.current_announcement().clone();
        let saves = s.store().saves.borrow().len();

        assert!(!s.undo());
        assert_eq!(s.roster(), &roster);
        assert_eq!(s.current_announcement(), &announcement);
        assert_eq!(s.store().saves.borrow().len(), saves);
    }

    #[test]
    fn undo_with_empty_buffer_is_noop() {
        let mut s = session();
        assert!(!s.undo());
        assert!(s.store().saves.borrow().is_empty());
    }

    #[test]
    fn undo_first_pick_clears_announcement() {
        let mut s = session();
        s.pick();
        assert!(s.undo());
        assert!(s.current_announcement().is_idle());
        assert_eq!(s.picked_count(), 0);
    }

    #[test]
    fn undo_reset_restores_picks() {
        let mut s = session();
        s.pick();
        s.pick();
        let before = s.roster().clone();
        s.reset();
        assert!(s.undo());
        assert_eq!(s.roster(), &before);
    }

    #[test]
    fn snapshot_is_independent_of_live_roster() {
        let mut s = session();
        s.pick();
        let snapshot_picked = s.undo.as_ref().unwrap().roster.picked_count();
        assert_eq!(snapshot_picked, 0);
        s.roster.records[0].mark_picked(Local::now().naive_local(), 99);
        assert_eq!(s.undo.as_ref().unwrap().roster.picked_count(), 0);
    }

    #[test]
    fn reset_is_total_from_any_state() {
        let mut s = session();
        s.reset();
        assert_eq!(s.picked_count(), 0);
        for _ in 0..3 {
            s.pick();
        }
        s.reset();
        assert_eq!(s.picked_count(), 0);
        assert_eq!(s.roster().next_order(), Some(1));
    }

    #[test]
    fn pick_orders_never_repeat_across_undo() {
        let mut s = session();
        s.pick();
        s.pick();
        s.undo();
        let p = s.pick().unwrap();
        assert_eq!(p.order, 2);
        let mut orders: Vec<u32> = s
            .roster()
            .records
            .iter()
            .filter_map(|r| r.pick_order())
            .collect();
        orders.sort_unstable();
        orders.dedup();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn save_failure_is_surfaced_and_state_kept() {
        let mut s = session();
        s.store().fail.set(true);
        let p = s.pick().unwrap();
        assert_eq!(s.picked_count(), 1);
        assert!(s.status().unwrap().contains("disk full"));
        assert!(s.roster().records[p.index].pick_order().is_some());

        s.store().fail.set(false);
        s.pick().unwrap();
        assert_eq!(s.status(), None);
        assert_eq!(s.store().saves.borrow().last().unwrap().picked_count(), 2);
    }

    #[test]
    fn apply_dispatches_commands() {
        let mut s = session();
        s.apply(Command::Pick);
        assert_eq!(s.picked_count(), 1);
        s.apply(Command::Undo);
        assert_eq!(s.picked_count(), 0);
        s.apply(Command::Pick);
        s.apply(Command::Reset);
        assert_eq!(s.picked_count(), 0);
        assert!(!s.is_finished());
        s.apply(Command::Quit);
        assert!(s.is_finished());
    }

    #[test]
    fn csv_backed_session_persists_and_skips_exhausted_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.csv");
        std::fs::write(&path, "Name\nAlice\nBob\nCarol\n").unwrap();

        let mut s = Session::open(CsvStore::new(&path)).unwrap();
        assert_eq!(s.picked_count(), 0);
        for _ in 0..3 {
            s.pick().unwrap();
        }
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.starts_with("Name,LastPicked,PickOrder\n"));

        assert_eq!(s.pick(), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), on_disk);

        let reloaded = Session::open(CsvStore::new(&path)).unwrap();
        assert_eq!(reloaded.picked_count(), 3);
    }

    #[test]
    fn pick_at_largest_order_is_refused_without_saving() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.csv");
        let contents = "Name,LastPicked,PickOrder\n\
                        Alice,2026-03-02 09:00:00,4294967295\n\
                        Bob,,\n";
        std::fs::write(&path, contents).unwrap();

        let mut s = Session::open(CsvStore::new(&path)).unwrap();
        assert_eq!(s.pick(), None);
        assert_eq!(s.picked_count(), 1);
        assert!(s.roster().records[1].is_eligible());
        assert!(s.current_announcement().is_idle());
        assert!(s.status().unwrap().contains("4294967295"));
        assert!(!s.can_undo());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);

        s.reset();
        assert_eq!(s.status(), None);
        assert_eq!(s.pick().unwrap().order, 1);
        assert!(Session::open(CsvStore::new(&path)).is_ok());
    }

    #[test]
    fn open_fails_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.csv");
        assert!(matches!(
            Session::open(CsvStore::new(&path)),
            Err(PickerError::NotFound(_))
        ));
    }
}
