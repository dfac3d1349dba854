pub mod engine;
pub mod error;
pub mod history;
pub mod io;
pub mod record;
pub mod session;
pub mod store;

pub use engine::Pick;
pub use error::{PickerError, Result};
pub use history::{RecentPick, DEFAULT_RECENT_LIMIT};
pub use record::{Record, Roster};
pub use session::{Announcement, Command, Session};
pub use store::{CsvStore, RosterStore};
