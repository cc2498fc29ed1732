//! This mod is meant to hold most of the code for the library's client-facing API.
mod configuration;
mod options;
mod wiring;

pub use configuration::ClusterMember;
pub use configuration::ProxyConfig;
pub use options::ProxyOptions;
pub use wiring::try_create_proxy;
pub use wiring::Proxy;
pub use wiring::ProxyCreationError;
pub use wiring::ProxyHandle;
pub use wiring::ProxyServeError;
