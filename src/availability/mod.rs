//! Availability-query orchestration.
//!
//! This module owns everything that talks to the booking backend about free
//! slots:
//! - `CacheStore` keeps day-level results for the session
//! - `HolidayYearCache` keeps the holiday calendar per year
//! - `QueryBatchCoordinator` fetches what the cache lacks with bounded
//!   concurrency and never lets an overtaken batch write
//! - `DebouncedSlotChecker` answers "is this slot still free" for form input
//! - `AutoRefreshScheduler` periodically re-probes the visible window

mod coordinator;
mod debounce;
#[cfg(test)]
pub(crate) mod fake;
mod holidays;
mod scheduler;
mod service;
mod store;
mod token;

pub use coordinator::{BatchOptions, Coverage, QueryBatchCoordinator, DEFAULT_MAX_CONCURRENT_PROBES};
pub use debounce::{DebouncedSlotChecker, SlotCheckState, SlotQuery};
pub use holidays::HolidayYearCache;
pub use scheduler::AutoRefreshScheduler;
pub use service::AvailabilityService;
pub use store::CacheStore;
