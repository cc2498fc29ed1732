use crate::grpc::{ProtoCommand, ProtoLogEntry};
use std::fmt;
use tonic::{Code, Status};

/// NodeId is a node's position in the configured cluster member list. The same index is what
/// nodes report back as `leader_id`.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub fn as_usize(self) -> usize {
        self.0
    }

    /// `from_reported()` decodes a wire leader id. Negative values mean the reporting node knows
    /// of no leader.
    pub(crate) fn from_reported(leader_id: i32) -> Option<Self> {
        if leader_id < 0 {
            None
        } else {
            Some(NodeId(leader_id as usize))
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Command is the caller's payload. The proxy never looks inside it; it only routes it.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Command {
    pub op: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SubmitEntryReply {
    pub(crate) success: bool,
    /// Who the contacted node believes is leader. `None` if it doesn't know.
    pub(crate) leader_id: Option<NodeId>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct LogEntry {
    pub term: u64,
    pub index: u64,
    pub command: Command,
}

/// LogSnapshot is the log a single node had visible when it answered.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct LogSnapshot {
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum NodeCallError {
    #[error("node {0} is not part of the cluster")]
    UnknownNode(NodeId),
    #[error("not connected")]
    NotConnected,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("call abandoned before it completed")]
    Abandoned,
    #[error("rpc failed: {0}")]
    Rpc(Status),
    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

impl NodeCallError {
    /// `is_retryable()` is true for failures that say nothing about the command itself, only
    /// that this node couldn't be reached right now.
    pub fn is_retryable(&self) -> bool {
        match self {
            NodeCallError::NotConnected => true,
            NodeCallError::Rpc(status) => matches!(
                status.code(),
                Code::Unavailable
                    | Code::Unknown
                    | Code::Cancelled
                    | Code::Aborted
                    | Code::ResourceExhausted
                    | Code::DeadlineExceeded
            ),
            NodeCallError::UnknownNode(_)
            | NodeCallError::DeadlineExceeded
            | NodeCallError::Abandoned
            | NodeCallError::MalformedReply(_) => false,
        }
    }
}

// ------- Conversions --------

impl From<Command> for ProtoCommand {
    fn from(command: Command) -> Self {
        ProtoCommand {
            op: command.op,
            key: command.key,
            value: command.value,
        }
    }
}

impl From<ProtoCommand> for Command {
    fn from(proto: ProtoCommand) -> Self {
        Command {
            op: proto.op,
            key: proto.key,
            value: proto.value,
        }
    }
}

impl LogEntry {
    pub(crate) fn try_from_proto(proto: ProtoLogEntry) -> Result<Self, NodeCallError> {
        let index = proto.index;
        let command = proto
            .command
            .ok_or_else(|| NodeCallError::MalformedReply(format!("log entry {} has no command", index)))?;

        Ok(LogEntry {
            term: proto.term,
            index,
            command: Command::from(command),
        })
    }
}
