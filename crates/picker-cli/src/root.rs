use std::path::{Path, PathBuf};

pub const DEFAULT_ROSTER: &str = "students.csv";

/// Resolve the roster file.
///
/// Priority:
/// 1. `--roster` flag / `PICKER_ROSTER` env var (passed in as `explicit`)
/// 2. `students.csv` in the current directory
pub fn resolve_roster(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    cwd.join(DEFAULT_ROSTER)
}
