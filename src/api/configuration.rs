//! This mod holds the types an application fills in to configure a proxy.

use crate::api::ProxyOptions;
use std::net::{IpAddr, SocketAddr};

pub struct ProxyConfig {
    /// Where callers reach the proxy. Port 0 picks a free port; see `ProxyHandle::local_addr()`.
    pub listen_addr: SocketAddr,
    /// Order matters: a member's position is the id nodes use when naming the leader.
    pub cluster_members: Vec<ClusterMember>,
    pub info_logger: slog::Logger,
    pub options: ProxyOptions,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterMember {
    pub ip_addr: IpAddr,
    pub rpc_port: u16,
}

impl ClusterMember {
    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip_addr, self.rpc_port)
    }
}

impl From<SocketAddr> for ClusterMember {
    fn from(addr: SocketAddr) -> Self {
        ClusterMember {
            ip_addr: addr.ip(),
            rpc_port: addr.port(),
        }
    }
}
