//! Auto-save engine
//!
//! State machine per open document:
//!
//! ```text
//! idle --mark_dirty--> dirty-pending --debounce / max-wait / manual--> saving
//! saving --success--> idle (or dirty-pending if edited mid-flight)
//! saving --transient failure--> dirty-pending (timers retry)
//! saving --unauthorized--> paused-unauthorized (content kept, manual retry)
//! saving --conflict--> stopped (terminal until a new document is loaded)
//! ```

mod executor;
mod scheduler;
mod session;


pub use executor::{AfterSave, SaveAttempt, SaveExecutor, SaveTicket};
pub use scheduler::{AutoSaveHandle, AutoSaveScheduler};
pub use session::{DraftSaveSession, SchedulerState, SessionSnapshot};
