use crate::cluster::{ClusterClients, Command, ConnectReport, NodeCallError, NodeId};
use crate::router::fan_out::FanOutRead;
use crate::router::leader_guess::LeaderGuess;
use crate::router::router_api::{RouterConfig, SubmitEntryError, SubmitEntryOutput};
use crate::router::write_state::WriteStateMachine;
use rand::Rng;
use std::cmp;
use std::sync::Arc;
use tokio::time::Instant;

/// Router sends writes to whichever node it believes leads the cluster, following redirects as
/// nodes correct it, and sends reads to every node at once.
pub(crate) struct Router<C: ClusterClients> {
    logger: slog::Logger,
    clients: Arc<C>,
    leader_guess: LeaderGuess,
    config: RouterConfig,
}

impl<C: ClusterClients> Router<C> {
    pub(crate) fn new(logger: slog::Logger, clients: C, config: RouterConfig) -> Self {
        Router {
            logger,
            clients: Arc::new(clients),
            leader_guess: LeaderGuess::new(),
            config,
        }
    }

    pub(crate) async fn connect_all(&self) -> ConnectReport {
        self.clients.connect_all().await
    }

    pub(crate) async fn close_all(&self) {
        slog::info!(self.logger, "Closing all cluster clients");
        self.clients.close_all().await;
    }

    #[cfg(test)]
    pub(crate) fn leader_guess(&self) -> Option<NodeId> {
        self.leader_guess.get()
    }

    /// `submit_entry()` keeps dispatching the command until some node commits it, or the shared
    /// write deadline runs out. No lock is held across a call to a node.
    pub(crate) async fn submit_entry(&self, command: &Command) -> Result<SubmitEntryOutput, SubmitEntryError> {
        let deadline = Instant::now() + self.config.write_timeout;
        let mut machine = WriteStateMachine::new(
            self.leader_guess.get(),
            self.clients.num_nodes(),
            self.config.write_max_attempts,
        );

        loop {
            let target = match machine.next_target(Instant::now() >= deadline, bootstrap_candidate) {
                Some(target) => target,
                None => break,
            };

            slog::debug!(self.logger, "Dispatching write to node {} ({:?})", target, machine.state());
            let call = self.clients.submit_entry(target, command, deadline);
            let reply = match tokio::time::timeout_at(deadline, call).await {
                Ok(reply) => reply,
                Err(_) => Err(NodeCallError::DeadlineExceeded),
            };
            if let Err(e) = &reply {
                if e.is_retryable() {
                    slog::warn!(self.logger, "Node {} unreachable, trying the next one: {}", target, e);
                }
            }

            let step = machine.on_reply(target, reply);
            if let Some(previous) = self.leader_guess.apply(step.guess) {
                slog::info!(
                    self.logger,
                    "Leader guess changed {:?} -> {:?}",
                    previous,
                    self.leader_guess.get()
                );
            }

            if step.backoff {
                let wake_at = cmp::min(Instant::now() + self.config.write_retry_backoff, deadline);
                tokio::time::sleep_until(wake_at).await;
            }
        }

        let outcome = machine.into_outcome();
        match &outcome {
            Ok(output) => slog::debug!(
                self.logger,
                "Write committed by node {} after {} attempt(s)",
                output.leader_id,
                output.attempts
            ),
            Err(e @ SubmitEntryError::Node { .. }) => slog::error!(self.logger, "Write failed: {}", e),
            Err(e) => slog::warn!(self.logger, "Write failed: {}", e),
        }

        outcome
    }

    /// `fan_out_read()` asks every node for its log concurrently. Results stream out of the
    /// returned reader as they arrive.
    pub(crate) fn fan_out_read(&self) -> FanOutRead {
        FanOutRead::start(
            &self.logger,
            self.clients.clone(),
            self.config.read_node_timeout,
            self.config.read_overall_timeout,
        )
    }

    #[cfg(test)]
    pub(crate) fn clients(&self) -> &C {
        &self.clients
    }

    #[cfg(test)]
    pub(crate) fn set_leader_guess(&self, node_id: NodeId) {
        self.leader_guess.apply(crate::router::leader_guess::GuessUpdate::Set(node_id));
    }
}

/// `bootstrap_candidate()` is the first guess when nothing is known: uniform over the cluster.
fn bootstrap_candidate(num_nodes: usize) -> NodeId {
    NodeId::new(rand::thread_rng().gen_range(0..num_nodes))
}
