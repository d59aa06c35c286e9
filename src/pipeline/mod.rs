//! The reconcile-and-aggregate pipeline.
//!
//! Flow: webhook feed + today's calls → card lookups → reconcile into
//! New/Prior buckets → aggregate per manager and category → one immutable
//! snapshot.

pub mod aggregate;
pub mod classify;
pub mod orchestrator;
pub mod reconcile;
pub mod snapshot;

pub use aggregate::{Analytics, MetricCell, aggregate, manager_key};
pub use classify::{CardFlags, Category};
pub use orchestrator::{CardSource, LeadFeed, Orchestrator, RunPhase};
pub use reconcile::{Buckets, reconcile};
pub use snapshot::{ResultSnapshot, SnapshotSlot};
