use crate::cluster::client_set::{ClusterClients, ConnectReport};
use crate::cluster::types::{Command, LogEntry, LogSnapshot, NodeCallError, NodeId, SubmitEntryReply};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::{Duration, Instant};
use tonic::Status;

/// A single scripted answer to `submit_entry()`.
pub(crate) enum SubmitScript {
    Reply { success: bool, leader_id: Option<usize> },
    Fail(NodeCallError),
    Hang,
}

#[derive(Clone)]
pub(crate) enum FetchBehavior {
    Log(LogSnapshot),
    Delay(Duration, LogSnapshot),
    Unavailable,
    Hang,
}

/// ScriptedClusterClients is an in-memory cluster. Without scripts every reachable node answers
/// truthfully about `leader`. Scripts are consumed per node before falling back to that.
pub(crate) struct ScriptedClusterClients {
    num_nodes: usize,
    leader: Option<NodeId>,
    down: HashSet<NodeId>,
    hanging: HashSet<NodeId>,
    submit_scripts: Mutex<HashMap<NodeId, VecDeque<SubmitScript>>>,
    fetch_behaviors: HashMap<NodeId, FetchBehavior>,
    dispatches: Mutex<Vec<NodeId>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

impl ScriptedClusterClients {
    pub(crate) fn new(num_nodes: usize) -> Self {
        ScriptedClusterClients {
            num_nodes,
            leader: None,
            down: HashSet::new(),
            hanging: HashSet::new(),
            submit_scripts: Mutex::new(HashMap::new()),
            fetch_behaviors: HashMap::new(),
            dispatches: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_leader(mut self, leader: usize) -> Self {
        self.leader = Some(NodeId::new(leader));
        self
    }

    pub(crate) fn with_down(mut self, node: usize) -> Self {
        self.down.insert(NodeId::new(node));
        self
    }

    pub(crate) fn with_hanging(mut self, node: usize) -> Self {
        self.hanging.insert(NodeId::new(node));
        self
    }

    pub(crate) fn with_submit_script(self, node: usize, script: Vec<SubmitScript>) -> Self {
        self.submit_scripts
            .lock()
            .unwrap()
            .insert(NodeId::new(node), script.into_iter().collect());
        self
    }

    pub(crate) fn with_fetch(mut self, node: usize, behavior: FetchBehavior) -> Self {
        self.fetch_behaviors.insert(NodeId::new(node), behavior);
        self
    }

    /// Node ids in the order `submit_entry()` was called on them.
    pub(crate) fn dispatches(&self) -> Vec<usize> {
        self.dispatches
            .lock()
            .unwrap()
            .iter()
            .map(|id| id.as_usize())
            .collect()
    }

    pub(crate) fn num_closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn num_connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn default_reply(&self, node_id: NodeId) -> Result<SubmitEntryReply, NodeCallError> {
        if self.down.contains(&node_id) {
            return Err(NodeCallError::Rpc(Status::unavailable("node is down")));
        }

        Ok(SubmitEntryReply {
            success: self.leader == Some(node_id),
            leader_id: self.leader,
        })
    }

    fn default_log(node_id: NodeId) -> LogSnapshot {
        LogSnapshot {
            entries: vec![LogEntry {
                term: 1,
                index: 1,
                command: Command {
                    op: "set".into(),
                    key: format!("written-via-{}", node_id),
                    value: "1".into(),
                },
            }],
        }
    }
}

#[async_trait::async_trait]
impl ClusterClients for ScriptedClusterClients {
    fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    async fn connect_all(&self) -> ConnectReport {
        self.connects.fetch_add(1, Ordering::SeqCst);
        ConnectReport {
            num_nodes: self.num_nodes,
            failures: Vec::new(),
        }
    }

    async fn submit_entry(
        &self,
        node_id: NodeId,
        _command: &Command,
        _deadline: Instant,
    ) -> Result<SubmitEntryReply, NodeCallError> {
        self.dispatches.lock().unwrap().push(node_id);

        let script = self
            .submit_scripts
            .lock()
            .unwrap()
            .get_mut(&node_id)
            .and_then(|scripts| scripts.pop_front());

        match script {
            Some(SubmitScript::Reply { success, leader_id }) => Ok(SubmitEntryReply {
                success,
                leader_id: leader_id.map(NodeId::new),
            }),
            Some(SubmitScript::Fail(e)) => Err(e),
            Some(SubmitScript::Hang) => std::future::pending().await,
            None if self.hanging.contains(&node_id) => std::future::pending().await,
            None => self.default_reply(node_id),
        }
    }

    async fn fetch_log(&self, node_id: NodeId, _deadline: Instant) -> Result<LogSnapshot, NodeCallError> {
        let behavior = self
            .fetch_behaviors
            .get(&node_id)
            .cloned()
            .unwrap_or_else(|| FetchBehavior::Log(Self::default_log(node_id)));

        match behavior {
            FetchBehavior::Log(snapshot) => Ok(snapshot),
            FetchBehavior::Delay(delay, snapshot) => {
                tokio::time::sleep(delay).await;
                Ok(snapshot)
            }
            FetchBehavior::Unavailable => Err(NodeCallError::Rpc(Status::unavailable("node is down"))),
            FetchBehavior::Hang => std::future::pending().await,
        }
    }

    async fn close_all(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
