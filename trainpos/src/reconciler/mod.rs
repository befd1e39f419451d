//! Per-train position reconciliation.
//!
//! Every train gets its own [`TrainWorker`], a tokio task that owns a
//! [`Reconciler`] and a [`SiteTransitionDetector`]. The worker wakes up on
//! two sources only: the next position routed to it, or the idle timer.
//!
//! # Coalescing Policy
//!
//! ```text
//!                 ┌──────────────┐
//!   position ────►│   pending?   │── none ──► hold as pending
//!                 └──────┬───────┘
//!                        │ some
//!            ┌───────────┴────────────┐
//!      same resolution         different resolution
//!            │                        │
//!   flush pending,           flush the high-res one,
//!   hold new one             drop the other, clear
//!
//!   idle timer ───► flush pending if any, clear
//! ```
//!
//! Every flush publishes the position and feeds the transition detector,
//! which emits `left`/`entered` site events when the site changes.

mod policy;
mod transition;
mod worker;

pub use policy::Reconciler;
pub use transition::SiteTransitionDetector;
pub use worker::TrainWorker;

pub(crate) use worker::WorkerContext;
