//! Shared types for the repair order system.
//!
//! Identifier newtypes plus the process-wide services (time and id
//! generation) that the domain takes as injected collaborators.

pub mod clock;
pub mod ids;
pub mod types;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use ids::{IdGenerator, RandomIds, SequentialIds, SharedIds};
pub use types::{ComponentId, OrderId, ServiceId};
