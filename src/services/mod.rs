//! Scheduling and reservation consistency core.
//!
//! Everything here takes an explicit pool or transaction handle; no service
//! holds a connection of its own.

pub mod availability;
pub mod reservations;
pub mod scheduling;
pub mod seating;
pub mod sessions;
