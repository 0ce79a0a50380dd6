//! sfl-client
//!
//! One consistent contract over three structurally different host
//! transports: a synchronously readable bridge object, an asynchronous
//! messaging channel to a parent context, and no host at all.
//!
//! Application code holds a [`SurfaceClient`] and never branches on the
//! adapter behind it. The facade resolves the environment once, runs the
//! connection handshake, and, for channel-family hosts whose handshake
//! names a richer vendor, transparently reconnects with a vendor-refined
//! adapter before yielding control.

pub mod adapter;
pub mod bus;
pub mod config;
pub mod detect;
pub mod error;
pub mod facade;
pub mod transport;

mod buffer;
mod gate;
mod state;

pub use adapter::{
    BridgeAdapter, BridgeHandle, BridgeSnapshot, ChannelAdapter, ChannelProfile, HostAdapter,
    NullAdapter,
};
pub use bus::{EventBus, Subscription};
pub use config::{ClientConfig, ConfigError, ConfigWarning};
pub use detect::{detect_environment, HostDiscovery};
pub use error::ClientError;
pub use facade::SurfaceClient;
pub use transport::{memory_channel, ChannelTransport, MemoryHostEnd, MemoryTransport};
