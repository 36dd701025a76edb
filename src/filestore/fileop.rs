//! `FileOp`: the set of states an operation is willing to accept.
use std::collections::HashSet;

use super::state::State;

/// Carries the states an operation accepts. Replaces ad-hoc `if state == ...`
/// checks scattered at call sites with one explicit contract per operation.
#[derive(Debug, Clone)]
pub struct FileOp {
    accepted: HashSet<State>,
}

impl FileOp {
    #[must_use]
    pub fn accepting(states: impl IntoIterator<Item = State>) -> Self {
        Self {
            accepted: states.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn accepts(&self, state: State) -> bool {
        self.accepted.contains(&state)
    }

    #[must_use]
    pub fn accepted_states(&self) -> Vec<State> {
        let mut states: Vec<State> = self.accepted.iter().copied().collect();
        states.sort_by_key(|s| s.dir_name());
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_accepts_only_the_listed_states() {
        let op = FileOp::accepting([State::Cache, State::Upload]);
        assert!(op.accepts(State::Cache));
        assert!(op.accepts(State::Upload));
        assert!(!op.accepts(State::Trash));
    }
}
