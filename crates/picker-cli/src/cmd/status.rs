use crate::output::{print_json, print_table};
use anyhow::Context;
use picker_core::{CsvStore, Session};
use std::path::Path;

pub fn run(roster: &Path, limit: usize, json: bool) -> anyhow::Result<()> {
    let session = Session::open(CsvStore::new(roster)).context("failed to load roster")?;
    let recent = session.recent_picks(limit);

    if json {
        let value = serde_json::json!({
            "roster": roster.display().to_string(),
            "total": session.total_count(),
            "picked": session.picked_count(),
            "remaining": session.remaining_count(),
            "recent": recent,
        });
        print_json(&value)?;
        return Ok(());
    }

    println!("Total students: {}", session.total_count());
    println!("Students picked: {}", session.picked_count());
    println!("Remaining: {}", session.remaining_count());

    if recent.is_empty() {
        println!("No students picked yet.");
        return Ok(());
    }

    println!();
    println!("Recently Picked:");
    let rows = recent
        .iter()
        .map(|p| {
            vec![
                format!("#{}", p.order),
                p.name.clone(),
                p.picked_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        })
        .collect();
    print_table(&["ORDER", "NAME", "PICKED AT"], rows);
    Ok(())
}
