//! Voice file staging subsystem.
//!
//! # Data Flow
//! ```text
//! Upload handler
//!     → filename.rs (reject unsafe names)
//!     → store.rs (temp file → rename into the staging directory)
//!
//! GET <staging prefix><filename>
//!     → relay.rs (open, content type from mime.rs, stream)
//!
//! Background (optional):
//!     retention.rs → store.rs (evict files past their age)
//! ```

pub mod filename;
pub mod mime;
pub mod relay;
pub mod retention;
pub mod store;

pub use store::{PendingFile, StagedFile, StagingArea};
