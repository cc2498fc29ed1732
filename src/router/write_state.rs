use crate::cluster::{NodeCallError, NodeId, SubmitEntryReply};
use crate::router::leader_guess::GuessUpdate;
use crate::router::{SubmitEntryError, SubmitEntryOutput};

/// WriteState is where a single write currently stands.
///
/// ```text
/// Unknown ──bootstrap──> Guessing(n) ──reply names n'──> Redirected(n') ──┐
///    ^                      │  │                                           │
///    └──"no leader known"───┘  └─transport error──> Probing(n+1) ──────────┤
///                                                                          v
///                        Committed | Failed(deadline/exhausted) | Error(node error)
/// ```
///
/// Every non-terminal state other than `Unknown` names the node the next attempt goes to.
#[derive(Debug)]
pub(crate) enum WriteState {
    Unknown,
    Guessing(NodeId),
    Redirected(NodeId),
    Probing(NodeId),
    Committed(NodeId),
    Failed(FailureReason),
    Error(NodeId, NodeCallError),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum FailureReason {
    DeadlineExceeded,
    AttemptsExhausted,
}

/// Step is the side effects the driver owes after feeding a reply into the machine.
#[derive(Debug, Eq, PartialEq)]
pub(crate) struct Step {
    pub(crate) guess: GuessUpdate,
    /// Pause before the next attempt. Redirects go out immediately; retries that would otherwise
    /// spin against a cluster mid-election or a dead node don't.
    pub(crate) backoff: bool,
}

/// WriteStateMachine holds the write path's decisions with no I/O: the driver asks it where to
/// send the next attempt, performs the call, and feeds the result back.
pub(crate) struct WriteStateMachine {
    state: WriteState,
    num_nodes: usize,
    attempts: u32,
    max_attempts: u32,
    last_error: Option<NodeCallError>,
}

impl WriteStateMachine {
    pub(crate) fn new(guess: Option<NodeId>, num_nodes: usize, max_attempts: u32) -> Self {
        let state = match guess {
            Some(node_id) => WriteState::Guessing(node_id),
            None => WriteState::Unknown,
        };

        WriteStateMachine {
            state,
            num_nodes,
            attempts: 0,
            max_attempts,
            last_error: None,
        }
    }

    pub(crate) fn state(&self) -> &WriteState {
        &self.state
    }

    /// `next_target()` returns the node to dispatch the next attempt to, or `None` once the write
    /// has reached a terminal state. `bootstrap` picks a node when there is no guess at all.
    pub(crate) fn next_target<F>(&mut self, deadline_passed: bool, bootstrap: F) -> Option<NodeId>
    where
        F: FnOnce(usize) -> NodeId,
    {
        if let WriteState::Unknown = self.state {
            self.state = WriteState::Guessing(bootstrap(self.num_nodes));
        }

        let target = match self.state {
            WriteState::Guessing(n) | WriteState::Redirected(n) | WriteState::Probing(n) => n,
            WriteState::Unknown | WriteState::Committed(_) | WriteState::Failed(_) | WriteState::Error(..) => {
                return None
            }
        };

        if deadline_passed {
            self.state = WriteState::Failed(FailureReason::DeadlineExceeded);
            return None;
        }
        if self.attempts >= self.max_attempts {
            self.state = WriteState::Failed(FailureReason::AttemptsExhausted);
            return None;
        }

        self.attempts += 1;
        Some(target)
    }

    /// `on_reply()` advances the machine with the outcome of the attempt sent to `target`.
    pub(crate) fn on_reply(&mut self, target: NodeId, reply: Result<SubmitEntryReply, NodeCallError>) -> Step {
        match reply {
            Ok(reply) => self.on_node_answer(target, reply),
            Err(NodeCallError::DeadlineExceeded) => {
                self.state = WriteState::Failed(FailureReason::DeadlineExceeded);
                Step::keep_guess()
            }
            Err(e) if e.is_retryable() => {
                // Don't move the shared guess off a node just because we couldn't reach it. Only
                // this write probes onward.
                self.state = WriteState::Probing(self.next_node(target));
                self.last_error = Some(e);
                Step {
                    guess: GuessUpdate::Keep,
                    backoff: true,
                }
            }
            Err(e) => {
                self.state = WriteState::Error(target, e);
                Step::keep_guess()
            }
        }
    }

    fn on_node_answer(&mut self, target: NodeId, reply: SubmitEntryReply) -> Step {
        match reply.leader_id {
            Some(leader) if leader.as_usize() >= self.num_nodes => {
                self.state = WriteState::Error(
                    target,
                    NodeCallError::MalformedReply(format!(
                        "leader id {} is outside the cluster of {} nodes",
                        leader, self.num_nodes
                    )),
                );
                Step::keep_guess()
            }
            Some(leader) if reply.success => {
                self.state = WriteState::Committed(leader);
                Step {
                    guess: GuessUpdate::Set(leader),
                    backoff: false,
                }
            }
            // Whoever accepted the command is the leader, whatever it forgot to say.
            None if reply.success => {
                self.state = WriteState::Committed(target);
                Step {
                    guess: GuessUpdate::Set(target),
                    backoff: false,
                }
            }
            // The node claims leadership but couldn't take the write. Likely stepping down.
            Some(leader) if leader == target => {
                self.state = WriteState::Guessing(leader);
                Step {
                    guess: GuessUpdate::Set(leader),
                    backoff: true,
                }
            }
            Some(leader) => {
                self.state = WriteState::Redirected(leader);
                Step {
                    guess: GuessUpdate::Set(leader),
                    backoff: false,
                }
            }
            None => {
                self.state = WriteState::Unknown;
                Step {
                    guess: GuessUpdate::Clear,
                    backoff: true,
                }
            }
        }
    }

    fn next_node(&self, node_id: NodeId) -> NodeId {
        NodeId::new((node_id.as_usize() + 1) % self.num_nodes)
    }

    /// `into_outcome()` converts a finished machine into the caller-visible result.
    pub(crate) fn into_outcome(self) -> Result<SubmitEntryOutput, SubmitEntryError> {
        let attempts = self.attempts;
        match self.state {
            WriteState::Committed(leader_id) => Ok(SubmitEntryOutput { leader_id, attempts }),
            WriteState::Failed(FailureReason::AttemptsExhausted) => {
                Err(SubmitEntryError::AttemptsExhausted { attempts })
            }
            WriteState::Error(node_id, source) => Err(SubmitEntryError::Node { node_id, source }),
            // Any write abandoned before reaching a verdict ran out of time.
            WriteState::Failed(FailureReason::DeadlineExceeded)
            | WriteState::Unknown
            | WriteState::Guessing(_)
            | WriteState::Redirected(_)
            | WriteState::Probing(_) => Err(SubmitEntryError::DeadlineExceeded {
                attempts,
                last_error: self.last_error,
            }),
        }
    }
}

impl Step {
    fn keep_guess() -> Self {
        Step {
            guess: GuessUpdate::Keep,
            backoff: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Status;

    fn node(i: usize) -> NodeId {
        NodeId::new(i)
    }

    fn reply(success: bool, leader_id: Option<usize>) -> Result<SubmitEntryReply, NodeCallError> {
        Ok(SubmitEntryReply {
            success,
            leader_id: leader_id.map(NodeId::new),
        })
    }

    fn never_bootstrap(_: usize) -> NodeId {
        panic!("Unexpected bootstrap")
    }

    #[test]
    fn unknown_bootstraps_with_cluster_size() {
        let mut machine = WriteStateMachine::new(None, 5, 10);

        let target = machine.next_target(false, |num_nodes| {
            assert_eq!(5, num_nodes);
            node(3)
        });

        assert_eq!(Some(node(3)), target);
        assert!(matches!(machine.state(), WriteState::Guessing(n) if *n == node(3)));
    }

    #[test]
    fn redirect_then_commit() {
        // -- setup --
        let mut machine = WriteStateMachine::new(Some(node(0)), 3, 10);

        // -- execute & verify --
        assert_eq!(Some(node(0)), machine.next_target(false, never_bootstrap));
        let step = machine.on_reply(node(0), reply(false, Some(1)));
        assert_eq!(
            Step {
                guess: GuessUpdate::Set(node(1)),
                backoff: false,
            },
            step
        );
        assert!(matches!(machine.state(), WriteState::Redirected(n) if *n == node(1)));

        assert_eq!(Some(node(1)), machine.next_target(false, never_bootstrap));
        let step = machine.on_reply(node(1), reply(true, Some(1)));
        assert_eq!(GuessUpdate::Set(node(1)), step.guess);

        assert_eq!(None, machine.next_target(false, never_bootstrap));
        let output = machine.into_outcome().unwrap();
        assert_eq!(node(1), output.leader_id);
        assert_eq!(2, output.attempts);
    }

    #[test]
    fn success_names_a_different_leader() {
        let mut machine = WriteStateMachine::new(Some(node(0)), 3, 10);
        machine.next_target(false, never_bootstrap);

        let step = machine.on_reply(node(0), reply(true, Some(2)));

        assert_eq!(GuessUpdate::Set(node(2)), step.guess);
        assert_eq!(node(2), machine.into_outcome().unwrap().leader_id);
    }

    #[test]
    fn success_without_leader_id_credits_the_contacted_node() {
        let mut machine = WriteStateMachine::new(Some(node(1)), 3, 10);
        machine.next_target(false, never_bootstrap);

        let step = machine.on_reply(node(1), reply(true, None));

        assert_eq!(GuessUpdate::Set(node(1)), step.guess);
        assert_eq!(node(1), machine.into_outcome().unwrap().leader_id);
    }

    #[test]
    fn no_leader_known_clears_guess_and_backs_off() {
        let mut machine = WriteStateMachine::new(Some(node(0)), 3, 10);
        machine.next_target(false, never_bootstrap);

        let step = machine.on_reply(node(0), reply(false, None));

        assert_eq!(
            Step {
                guess: GuessUpdate::Clear,
                backoff: true,
            },
            step
        );
        assert_eq!(Some(node(2)), machine.next_target(false, |_| node(2)));
    }

    #[test]
    fn self_proclaimed_leader_that_fails_is_retried_after_backoff() {
        let mut machine = WriteStateMachine::new(Some(node(1)), 3, 10);
        machine.next_target(false, never_bootstrap);

        let step = machine.on_reply(node(1), reply(false, Some(1)));

        assert!(step.backoff);
        assert_eq!(Some(node(1)), machine.next_target(false, never_bootstrap));
    }

    #[test]
    fn retryable_error_probes_next_node_without_touching_guess() {
        // -- setup --
        let mut machine = WriteStateMachine::new(Some(node(2)), 3, 10);
        machine.next_target(false, never_bootstrap);

        // -- execute --
        let step = machine.on_reply(node(2), Err(NodeCallError::Rpc(Status::unavailable("down"))));

        // -- verify --
        assert_eq!(
            Step {
                guess: GuessUpdate::Keep,
                backoff: true,
            },
            step
        );
        // Wraps around.
        assert_eq!(Some(node(0)), machine.next_target(false, never_bootstrap));
    }

    #[test]
    fn deadline_reports_last_transport_error() {
        let mut machine = WriteStateMachine::new(Some(node(0)), 2, 10);
        machine.next_target(false, never_bootstrap);
        machine.on_reply(node(0), Err(NodeCallError::NotConnected));

        assert_eq!(None, machine.next_target(true, never_bootstrap));

        match machine.into_outcome() {
            Err(SubmitEntryError::DeadlineExceeded {
                attempts: 1,
                last_error: Some(NodeCallError::NotConnected),
            }) => { /* expected */ }
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn deadline_mid_call() {
        let mut machine = WriteStateMachine::new(Some(node(0)), 2, 10);
        machine.next_target(false, never_bootstrap);

        machine.on_reply(node(0), Err(NodeCallError::DeadlineExceeded));

        assert_eq!(None, machine.next_target(false, never_bootstrap));
        assert!(matches!(
            machine.into_outcome(),
            Err(SubmitEntryError::DeadlineExceeded { last_error: None, .. })
        ));
    }

    #[test]
    fn attempts_are_bounded() {
        let mut machine = WriteStateMachine::new(Some(node(0)), 2, 2);

        // Two nodes each insisting the other one leads.
        assert_eq!(Some(node(0)), machine.next_target(false, never_bootstrap));
        machine.on_reply(node(0), reply(false, Some(1)));
        assert_eq!(Some(node(1)), machine.next_target(false, never_bootstrap));
        machine.on_reply(node(1), reply(false, Some(0)));
        assert_eq!(None, machine.next_target(false, never_bootstrap));

        assert!(matches!(
            machine.into_outcome(),
            Err(SubmitEntryError::AttemptsExhausted { attempts: 2 })
        ));
    }

    #[test]
    fn non_retryable_error_is_terminal() {
        let mut machine = WriteStateMachine::new(Some(node(0)), 3, 10);
        machine.next_target(false, never_bootstrap);

        let step = machine.on_reply(node(0), Err(NodeCallError::Rpc(Status::invalid_argument("bad op"))));

        assert_eq!(GuessUpdate::Keep, step.guess);
        assert_eq!(None, machine.next_target(false, never_bootstrap));
        assert!(matches!(
            machine.into_outcome(),
            Err(SubmitEntryError::Node { node_id, .. }) if node_id == node(0)
        ));
    }

    #[test]
    fn leader_id_outside_cluster_is_malformed() {
        let mut machine = WriteStateMachine::new(Some(node(0)), 3, 10);
        machine.next_target(false, never_bootstrap);

        let step = machine.on_reply(node(0), reply(false, Some(3)));

        assert_eq!(GuessUpdate::Keep, step.guess);
        assert!(matches!(
            machine.into_outcome(),
            Err(SubmitEntryError::Node {
                source: NodeCallError::MalformedReply(_),
                ..
            })
        ));
    }

    #[test]
    fn single_node_cluster_never_redirects() {
        let mut machine = WriteStateMachine::new(None, 1, 10);

        assert_eq!(Some(node(0)), machine.next_target(false, |_| node(0)));
        machine.on_reply(node(0), reply(true, Some(0)));

        assert_eq!(None, machine.next_target(false, never_bootstrap));
        assert_eq!(1, machine.into_outcome().unwrap().attempts);
    }
}
