//! geofence-core: Region registry, membership evaluation, transition
//! tracking, and event dispatch for device position streams.
//!
//! No async, no I/O — just algorithms. This crate is the shared core used
//! by the `geofence` CLI and by any host embedding the engine behind its
//! own API or persistence layer.

pub mod dispatch;
pub mod engine;
pub mod eval;
pub mod fence;
pub mod geo;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use dispatch::{EventDispatcher, EventHandler, SubscriptionId};
pub use engine::GeofenceEngine;
pub use eval::{evaluate, Membership};
pub use fence::{ActiveWindow, AlertSettings, AltitudeBand, Geofence, Priority, Sector};
pub use session::{DeviceSession, MembershipState};
pub use store::RegionStore;
pub use types::*;
