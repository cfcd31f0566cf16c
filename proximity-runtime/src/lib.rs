//! Proximity Runtime
//!
//! Runs a [`ProximityScheduler`](proximity_scheduler::ProximityScheduler) on
//! its own thread with a fixed tick, and gives the rest of the program a
//! sync handle to it.
//!
//! ```text
//! scanner thread(s) ──ObservationSender──► queue ─┐
//!                                                 ▼
//!                     worker thread: every tick_interval
//!                       drain queue → observe each → tick(now) → driver
//!                                                 │
//!            ProximityService::shutdown ──────────┘ stop all players, exit
//! ```
//!
//! Observations and ticks are applied on the same thread, one at a time, so
//! the scheduler's state is never shared.

pub mod clock;
pub mod error;
pub mod logging;
pub mod service;
mod worker;

pub use clock::{Clock, SystemClock};
pub use error::{Result, RuntimeError};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use service::{ObservationSender, ProximityService};
pub use worker::WORKER_THREAD_NAME;
