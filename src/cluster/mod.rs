//! This mod owns one remote handle per cluster node and nothing else. It knows how to talk to a
//! node, not which node to talk to.
mod client_set;
mod node_client;
#[cfg(test)]
mod test_utils;
mod types;

pub(crate) use client_set::ClusterClients;
pub use client_set::ConnectReport;
pub(crate) use client_set::GrpcClusterClients;
pub use node_client::ConnectError;
pub use types::Command;
pub use types::LogEntry;
pub use types::LogSnapshot;
pub use types::NodeCallError;
pub use types::NodeId;
pub(crate) use types::SubmitEntryReply;

#[cfg(test)]
pub(crate) use test_utils::{FetchBehavior, ScriptedClusterClients, SubmitScript};
