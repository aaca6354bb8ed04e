//! Persistence for pricewatch.
//!
//! - Alert history: one `AlertRecord` per ticker, overwritten on each
//!   successful notification (JSON file or in-memory)
//! - Line logs: append-only, timestamped text logs for alerts and API traffic

pub mod error;
pub mod history;
pub mod line_log;

pub use error::{PersistenceError, PersistenceResult};
pub use history::{AlertHistoryStore, JsonHistoryStore, MemoryHistoryStore};
pub use line_log::LineLog;
