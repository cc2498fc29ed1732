use crate::cluster::node_client::{ConnectError, NodeClient};
use crate::cluster::types::{Command, LogSnapshot, NodeCallError, NodeId, SubmitEntryReply};
use std::net::SocketAddr;
use tokio::time::{Duration, Instant};

/// ClusterClients is the router's view of the cluster: one remote handle per node, addressed by
/// `NodeId`. The set is fixed at construction.
#[async_trait::async_trait]
pub(crate) trait ClusterClients: Send + Sync + 'static {
    fn num_nodes(&self) -> usize;

    /// `connect_all()` connects every node in id order. A node failing to connect does not stop
    /// the others from being attempted.
    async fn connect_all(&self) -> ConnectReport;

    async fn submit_entry(
        &self,
        node_id: NodeId,
        command: &Command,
        deadline: Instant,
    ) -> Result<SubmitEntryReply, NodeCallError>;

    async fn fetch_log(&self, node_id: NodeId, deadline: Instant) -> Result<LogSnapshot, NodeCallError>;

    /// `close_all()` releases every connection. Idempotent.
    async fn close_all(&self);
}

/// ConnectReport lists the nodes that could not be connected at startup. Those nodes stay
/// unavailable; the rest of the cluster is served normally.
#[derive(Debug, Default)]
pub struct ConnectReport {
    pub num_nodes: usize,
    pub failures: Vec<(NodeId, ConnectError)>,
}

impl ConnectReport {
    pub fn num_connected(&self) -> usize {
        self.num_nodes - self.failures.len()
    }
}

pub(crate) struct GrpcClusterClients {
    logger: slog::Logger,
    clients: Vec<NodeClient>,
    connect_timeout: Duration,
}

impl GrpcClusterClients {
    pub(crate) fn new(logger: slog::Logger, node_addrs: Vec<SocketAddr>, connect_timeout: Duration) -> Self {
        let clients = node_addrs
            .into_iter()
            .enumerate()
            .map(|(i, addr)| NodeClient::new(logger.clone(), NodeId::new(i), addr))
            .collect();

        GrpcClusterClients {
            logger,
            clients,
            connect_timeout,
        }
    }

    fn client(&self, node_id: NodeId) -> Result<&NodeClient, NodeCallError> {
        self.clients
            .get(node_id.as_usize())
            .ok_or(NodeCallError::UnknownNode(node_id))
    }
}

#[async_trait::async_trait]
impl ClusterClients for GrpcClusterClients {
    fn num_nodes(&self) -> usize {
        self.clients.len()
    }

    async fn connect_all(&self) -> ConnectReport {
        let mut report = ConnectReport {
            num_nodes: self.clients.len(),
            failures: Vec::new(),
        };

        for client in self.clients.iter() {
            if let Err(e) = client.connect(self.connect_timeout).await {
                slog::warn!(
                    self.logger,
                    "Failed to connect to node {}, it stays unavailable: {}",
                    client.node_id(),
                    e
                );
                report.failures.push((client.node_id(), e));
            }
        }

        slog::info!(
            self.logger,
            "Connected to {}/{} cluster nodes",
            report.num_connected(),
            report.num_nodes
        );

        report
    }

    async fn submit_entry(
        &self,
        node_id: NodeId,
        command: &Command,
        deadline: Instant,
    ) -> Result<SubmitEntryReply, NodeCallError> {
        self.client(node_id)?.submit_entry(command, deadline).await
    }

    async fn fetch_log(&self, node_id: NodeId, deadline: Instant) -> Result<LogSnapshot, NodeCallError> {
        self.client(node_id)?.fetch_log(deadline).await
    }

    async fn close_all(&self) {
        for client in self.clients.iter() {
            client.close();
        }
    }
}
