mod api;
mod cluster;
mod router;
mod server;
mod grpc {
    include!("../generated/cluster.rs");
}

pub use api::try_create_proxy;
pub use api::ClusterMember;
pub use api::Proxy;
pub use api::ProxyConfig;
pub use api::ProxyCreationError;
pub use api::ProxyHandle;
pub use api::ProxyOptions;
pub use api::ProxyServeError;
pub use cluster::Command;
pub use cluster::ConnectError;
pub use cluster::ConnectReport;
pub use cluster::LogEntry;
pub use cluster::LogSnapshot;
pub use cluster::NodeCallError;
pub use cluster::NodeId;

// `crate::{root_mod}` holds no code, only `mod` and `pub use` statements. No `mod` is `pub`;
// everything exported goes through an individual `pub use` above.
