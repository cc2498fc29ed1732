use crate::cluster::types::{Command, LogEntry, LogSnapshot, NodeCallError, NodeId, SubmitEntryReply};
use crate::grpc::grpc_cluster_node_client::GrpcClusterNodeClient;
use crate::grpc::{ProtoCommand, ProtoFetchLogReq, ProtoFetchLogResult, ProtoSubmitEntryReq, ProtoSubmitEntryResult};
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};
use tokio::time::error::Elapsed;
use tokio::time::{Duration, Instant};
use tonic::codegen::http::uri;
use tonic::transport::{Channel, Endpoint};
use tonic::{Response, Status};

/// NodeClient owns the connection to a single cluster node.
pub(crate) struct NodeClient {
    logger: slog::Logger,
    node_id: NodeId,
    addr: SocketAddr,
    connection: Mutex<Connection>,
}

enum Connection {
    NotConnected,
    Connected(GrpcClusterNodeClient<Channel>),
    Closed,
}

impl NodeClient {
    pub(crate) fn new(logger: slog::Logger, node_id: NodeId, addr: SocketAddr) -> Self {
        NodeClient {
            logger: logger.new(slog::o!("NodeId" => node_id.as_usize(), "NodeAddr" => addr.to_string())),
            node_id,
            addr,
            connection: Mutex::new(Connection::NotConnected),
        }
    }

    pub(crate) fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// `connect()` is a no-op if already connected. A closed client stays closed.
    pub(crate) async fn connect(&self, timeout: Duration) -> Result<(), ConnectError> {
        match *self.lock_connection() {
            Connection::Connected(_) => return Ok(()),
            Connection::Closed => return Err(ConnectError::Closed),
            Connection::NotConnected => { /* carry on */ }
        }

        let url = format!("http://{}", self.addr);
        slog::info!(self.logger, "Connecting to {} ...", url);
        let endpoint = Endpoint::from_shared(url)?;

        let channel = tokio::time::timeout(timeout, endpoint.connect())
            .await
            .map_err(|_| ConnectError::Timeout(timeout))??;

        let mut connection = self.lock_connection();
        match *connection {
            // Lost a race against close(). Dropping the channel is all the cleanup there is.
            Connection::Closed => Err(ConnectError::Closed),
            _ => {
                *connection = Connection::Connected(GrpcClusterNodeClient::new(channel));
                slog::info!(self.logger, "Connected");
                Ok(())
            }
        }
    }

    pub(crate) async fn submit_entry(
        &self,
        command: &Command,
        deadline: Instant,
    ) -> Result<SubmitEntryReply, NodeCallError> {
        let mut client = self.client()?;
        let rpc_request = ProtoSubmitEntryReq {
            command: Some(ProtoCommand::from(command.clone())),
        };

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let rpc_reply = tokio::time::timeout_at(deadline, client.submit_entry(rpc_request)).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        Self::convert_submit_entry_rpc_reply(rpc_reply)
    }

    fn convert_submit_entry_rpc_reply(
        rpc_reply: Result<Result<Response<ProtoSubmitEntryResult>, Status>, Elapsed>,
    ) -> Result<SubmitEntryReply, NodeCallError> {
        match rpc_reply {
            Ok(Ok(rpc_result)) => {
                let rpc_result = rpc_result.into_inner();
                Ok(SubmitEntryReply {
                    success: rpc_result.success,
                    leader_id: NodeId::from_reported(rpc_result.leader_id),
                })
            }
            Ok(Err(status)) => Err(NodeCallError::Rpc(status)),
            Err(_) => Err(NodeCallError::DeadlineExceeded),
        }
    }

    pub(crate) async fn fetch_log(&self, deadline: Instant) -> Result<LogSnapshot, NodeCallError> {
        let mut client = self.client()?;
        let rpc_request = ProtoFetchLogReq {};

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let rpc_reply = tokio::time::timeout_at(deadline, client.fetch_log(rpc_request)).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        Self::convert_fetch_log_rpc_reply(rpc_reply)
    }

    fn convert_fetch_log_rpc_reply(
        rpc_reply: Result<Result<Response<ProtoFetchLogResult>, Status>, Elapsed>,
    ) -> Result<LogSnapshot, NodeCallError> {
        match rpc_reply {
            Ok(Ok(rpc_result)) => {
                let entries = rpc_result
                    .into_inner()
                    .entries
                    .into_iter()
                    .map(LogEntry::try_from_proto)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(LogSnapshot { entries })
            }
            Ok(Err(status)) => Err(NodeCallError::Rpc(status)),
            Err(_) => Err(NodeCallError::DeadlineExceeded),
        }
    }

    /// `close()` drops the connection. Safe to call more than once, and safe to call on a client
    /// that never connected.
    pub(crate) fn close(&self) {
        let previous = std::mem::replace(&mut *self.lock_connection(), Connection::Closed);
        if let Connection::Connected(_) = previous {
            slog::info!(self.logger, "Closed connection");
        }
    }

    // Clones the tonic client out so no lock is held across the network call.
    fn client(&self) -> Result<GrpcClusterNodeClient<Channel>, NodeCallError> {
        match &*self.lock_connection() {
            Connection::Connected(client) => Ok(client.clone()),
            Connection::NotConnected | Connection::Closed => Err(NodeCallError::NotConnected),
        }
    }

    fn lock_connection(&self) -> MutexGuard<'_, Connection> {
        self.connection.lock().expect("NodeClient connection mutex guard poison")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("invalid node uri: {0}")]
    InvalidUri(#[from] uri::InvalidUri),
    #[error("failed to connect: {0}")]
    ConnectFailure(#[from] tonic::transport::Error),
    #[error("timed out connecting after {0:?}")]
    Timeout(Duration),
    #[error("client is closed")]
    Closed,
}
