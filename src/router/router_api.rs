use crate::cluster::{NodeCallError, NodeId};
use tokio::time::Duration;

#[derive(Copy, Clone, Debug)]
pub(crate) struct RouterConfig {
    /// Shared deadline for a whole write, retries included.
    pub(crate) write_timeout: Duration,
    pub(crate) write_retry_backoff: Duration,
    pub(crate) write_max_attempts: u32,
    pub(crate) read_node_timeout: Duration,
    pub(crate) read_overall_timeout: Duration,
}

#[derive(Debug)]
pub(crate) struct SubmitEntryOutput {
    /// The node that accepted the command.
    pub(crate) leader_id: NodeId,
    pub(crate) attempts: u32,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum SubmitEntryError {
    #[error("write timed out after {attempts} attempt(s)")]
    DeadlineExceeded {
        attempts: u32,
        last_error: Option<NodeCallError>,
    },

    // The cluster kept answering but never accepted the command, e.g. a long election or leaders
    // disagreeing about who leads.
    #[error("gave up after {attempts} attempt(s) without the command being committed")]
    AttemptsExhausted { attempts: u32 },

    #[error("node {node_id} failed the write: {source}")]
    Node { node_id: NodeId, source: NodeCallError },
}
