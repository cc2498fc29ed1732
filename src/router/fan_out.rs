use crate::cluster::{ClusterClients, LogSnapshot, NodeCallError, NodeId};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

/// NodeLogResult is one node's answer to a fan-out read.
#[derive(Debug)]
pub(crate) struct NodeLogResult {
    pub(crate) node_id: NodeId,
    pub(crate) result: Result<LogSnapshot, NodeCallError>,
}

/// FanOutRead yields exactly one result per node, in the order the nodes answer. Nodes that
/// haven't answered by the overall deadline are reported as `DeadlineExceeded`, lowest id first.
pub(crate) struct FanOutRead {
    receiver: mpsc::Receiver<NodeLogResult>,
    pending: BTreeSet<NodeId>,
    deadline: Instant,
    deadline_passed: bool,
    workers: Vec<JoinHandle<()>>,
}

impl FanOutRead {
    pub(crate) fn start<C: ClusterClients>(
        logger: &slog::Logger,
        clients: Arc<C>,
        node_timeout: Duration,
        overall_timeout: Duration,
    ) -> Self {
        let now = Instant::now();
        let deadline = now + overall_timeout;
        let node_deadline = std::cmp::min(now + node_timeout, deadline);

        let num_nodes = clients.num_nodes();
        // Each worker sends exactly once, so a channel this size never makes a worker wait.
        let (tx, rx) = mpsc::channel(num_nodes.max(1));

        let mut pending = BTreeSet::new();
        let mut workers = Vec::with_capacity(num_nodes);
        for i in 0..num_nodes {
            let node_id = NodeId::new(i);
            pending.insert(node_id);

            let clients = clients.clone();
            let tx = tx.clone();
            let logger = logger.clone();
            workers.push(tokio::task::spawn(async move {
                let fetch = clients.fetch_log(node_id, node_deadline);
                let result = match tokio::time::timeout_at(node_deadline, fetch).await {
                    Ok(result) => result,
                    Err(_) => Err(NodeCallError::DeadlineExceeded),
                };
                if let Err(e) = &result {
                    slog::debug!(logger, "FetchLog from node {} failed: {}", node_id, e);
                }

                // Receiver gone means the reader stopped caring.
                let _ = tx.send(NodeLogResult { node_id, result }).await;
            }));
        }

        FanOutRead {
            receiver: rx,
            pending,
            deadline,
            deadline_passed: false,
            workers,
        }
    }

    /// `next()` returns the next node's result, or `None` once every node has been reported.
    pub(crate) async fn next(&mut self) -> Option<NodeLogResult> {
        while !self.pending.is_empty() && !self.deadline_passed {
            match tokio::time::timeout_at(self.deadline, self.receiver.recv()).await {
                Ok(Some(node_result)) => {
                    if self.pending.remove(&node_result.node_id) {
                        return Some(node_result);
                    }
                }
                // Every worker is gone yet some never reported; they can only have been dropped.
                Ok(None) => return self.pop_pending(NodeCallError::Abandoned),
                Err(_) => self.deadline_passed = true,
            }
        }

        self.pop_pending(NodeCallError::DeadlineExceeded)
    }

    fn pop_pending(&mut self, error: NodeCallError) -> Option<NodeLogResult> {
        let node_id = *self.pending.iter().next()?;
        self.pending.remove(&node_id);

        Some(NodeLogResult {
            node_id,
            result: Err(error),
        })
    }
}

impl Drop for FanOutRead {
    fn drop(&mut self) {
        for worker in self.workers.iter() {
            worker.abort();
        }
    }
}
