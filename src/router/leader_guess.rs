use crate::cluster::NodeId;
use std::sync::{Mutex, MutexGuard};

/// LeaderGuess is the proxy's best-effort belief about which node leads the cluster. It is only a
/// routing hint: the contacted node always has the final say. Concurrent writers race
/// last-write-wins.
pub(crate) struct LeaderGuess {
    current: Mutex<Option<NodeId>>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum GuessUpdate {
    Keep,
    Set(NodeId),
    Clear,
}

impl LeaderGuess {
    pub(crate) fn new() -> Self {
        LeaderGuess {
            current: Mutex::new(None),
        }
    }

    pub(crate) fn get(&self) -> Option<NodeId> {
        *self.lock()
    }

    /// `apply()` returns the previous guess if the update changed it.
    pub(crate) fn apply(&self, update: GuessUpdate) -> Option<Option<NodeId>> {
        let new_guess = match update {
            GuessUpdate::Keep => return None,
            GuessUpdate::Set(node_id) => Some(node_id),
            GuessUpdate::Clear => None,
        };

        let mut current = self.lock();
        if *current == new_guess {
            None
        } else {
            Some(std::mem::replace(&mut *current, new_guess))
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<NodeId>> {
        self.current.lock().expect("LeaderGuess mutex guard poison")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown() {
        assert_eq!(None, LeaderGuess::new().get());
    }

    #[test]
    fn apply_reports_only_real_changes() {
        let guess = LeaderGuess::new();
        let n1 = NodeId::new(1);
        let n2 = NodeId::new(2);

        assert_eq!(None, guess.apply(GuessUpdate::Keep));
        assert_eq!(Some(None), guess.apply(GuessUpdate::Set(n1)));
        assert_eq!(Some(n1), guess.get());

        // Same authoritative answer again is a no-op.
        assert_eq!(None, guess.apply(GuessUpdate::Set(n1)));
        assert_eq!(Some(n1), guess.get());

        // Flapping just follows the latest answer.
        assert_eq!(Some(Some(n1)), guess.apply(GuessUpdate::Set(n2)));
        assert_eq!(Some(Some(n2)), guess.apply(GuessUpdate::Clear));
        assert_eq!(None, guess.get());
        assert_eq!(None, guess.apply(GuessUpdate::Clear));
    }
}
