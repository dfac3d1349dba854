use crate::tui::Tui;
use anyhow::Context;
use picker_core::{CsvStore, Session};
use std::path::Path;

pub fn run(roster: &Path, limit: usize) -> anyhow::Result<()> {
    // Load before touching the terminal so a missing roster is reported plainly.
    let store = CsvStore::new(roster);
    let path = store.path().to_path_buf();
    let mut session = Session::open(store).context("failed to load roster")?;
    tracing::info!(
        roster = %path.display(),
        total = session.total_count(),
        picked = session.picked_count(),
        "session started"
    );

    let mut tui = Tui::init().context("failed to initialise terminal")?;
    tui.run(&mut session, limit).context("terminal error")?;
    tracing::info!(
        roster = %path.display(),
        picked = session.picked_count(),
        "session ended"
    );
    Ok(())
}
