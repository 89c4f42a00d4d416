//! Voice upload subsystem.
//!
//! # Data Flow
//! ```text
//! POST <upload path>
//!     → handler.rs (pick JSON or multipart by Content-Type)
//!     → payload.rs (JSON body, data URI decoding)
//!     → staging::store (atomic write)
//!     → UploadReceipt { success, audioUrl, ... }
//! ```

pub mod handler;
pub mod payload;

pub use handler::handle_upload;
pub use payload::{UploadReceipt, UploadRequest};
