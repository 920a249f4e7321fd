//! Output generation.
//!
//! # Submodules
//!
//! - [`snapshot`]: Writes the run's [`Snapshot`](crate::models::Snapshot) as
//!   one JSON document, atomically replacing the previous one
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! ├── latest.json       # Live snapshot read by the display layer
//! └── latest.json.tmp   # Only present while a write is in flight
//! ```

pub mod snapshot;
