//! Score Repository - the read-only view of the system of record.
//!
//! The synchronization engine never computes totals itself. It asks a
//! `ScoreRepository` for the current truth, either for a single user (point
//! updates) or for a whole scope (rebuilds).

mod error;
mod repository;

pub use error::ScoreRepositoryError;
pub use repository::{DisplayNames, ScoreRepository};
