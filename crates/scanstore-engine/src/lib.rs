//! Thin orchestration layer on top of `scanstore-store-pg`: a façade that
//! wires a config into a running pair of stores, and a background loop
//! that drives the matcher store's garbage collector to quiescence on a
//! schedule. Everything storage-shaped lives in `scanstore-store-traits`
//! / `scanstore-store-pg`; this crate only assembles and schedules.

mod facade;
mod gc_scheduler;

pub use facade::ScanStore;
pub use gc_scheduler::{GcSchedule, GcScheduler};
