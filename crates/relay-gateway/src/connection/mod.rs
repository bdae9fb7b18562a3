//! Connection management
//!
//! Connection handles, the session registry, and the lifecycle that ties
//! them to the transport.

mod connection;
mod lifecycle;
mod registry;

pub use connection::{Connection, ConnectionId, ConnectionState, DeliveryError, OutboundChannel};
pub use lifecycle::{ConnectionLifecycle, LifecycleError};
pub use registry::{Departure, Identity, NameError, SessionRegistry};
