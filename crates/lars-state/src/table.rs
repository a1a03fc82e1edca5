//! # Transition and Next-Action Tables
//!
//! ## Transitions
//!
//! | From | PUBLISH | APPROVE | CANCEL | NEED_MORE_INFO | UNPUBLISH |
//! |---|---|---|---|---|---|
//! | DRAFT | AWAITING_APPROVAL | – | – | – | – |
//! | AWAITING_APPROVAL | – | PUBLISHED | DRAFT | NEED_MORE_INFO | – |
//! | NEED_MORE_INFO | AWAITING_APPROVAL | – | – | – | – |
//! | PUBLISHED | – | – | – | – | DRAFT |
//!
//! ## Next action towards a target
//!
//! | current \ target | DRAFT | AWAITING_APPROVAL | NEED_MORE_INFO | PUBLISHED |
//! |---|---|---|---|---|
//! | DRAFT | – | PUBLISH | PUBLISH | PUBLISH |
//! | AWAITING_APPROVAL | CANCEL | – | NEED_MORE_INFO | APPROVE |
//! | NEED_MORE_INFO | PUBLISH | PUBLISH | – | PUBLISH |
//! | PUBLISHED | UNPUBLISH | UNPUBLISH | – | – |
//!
//! PUBLISHED → NEED_MORE_INFO has no entry: a reviewer can only ask for more
//! information about a pending submission.

use lars_core::{Action, LifecycleError, State};

/// Every legal `(from, action, to)` triple.
pub const TRANSITIONS: [(State, Action, State); 6] = [
    (State::Draft, Action::Publish, State::AwaitingApproval),
    (State::AwaitingApproval, Action::Approve, State::Published),
    (State::AwaitingApproval, Action::Cancel, State::Draft),
    (State::AwaitingApproval, Action::NeedMoreInfo, State::NeedMoreInfo),
    (State::NeedMoreInfo, Action::Publish, State::AwaitingApproval),
    (State::Published, Action::Unpublish, State::Draft),
];

/// `(current, target, next action)` entries.
pub const NEXT_ACTIONS: [(State, State, Action); 11] = [
    (State::Draft, State::AwaitingApproval, Action::Publish),
    (State::Draft, State::NeedMoreInfo, Action::Publish),
    (State::Draft, State::Published, Action::Publish),
    (State::AwaitingApproval, State::Draft, Action::Cancel),
    (State::AwaitingApproval, State::NeedMoreInfo, Action::NeedMoreInfo),
    (State::AwaitingApproval, State::Published, Action::Approve),
    (State::NeedMoreInfo, State::Draft, Action::Publish),
    (State::NeedMoreInfo, State::AwaitingApproval, Action::Publish),
    (State::NeedMoreInfo, State::Published, Action::Publish),
    (State::Published, State::Draft, Action::Unpublish),
    (State::Published, State::AwaitingApproval, Action::Unpublish),
];

/// A lifecycle definition: which transitions are legal and how to make
/// progress towards a target state.
///
/// Implementations must be `Send + Sync` so a single table can be shared by
/// every repository handle behind an `Arc`.
pub trait TransitionTable: Send + Sync {
    /// The state reached by performing `action` in `from`, or `None` if the
    /// combination is illegal.
    fn transition(&self, from: State, action: Action) -> Option<State>;

    /// The action that makes progress from `current` towards `target`, or
    /// `None` when there is none (including `current == target`).
    fn next_action(&self, current: State, target: State) -> Option<Action>;

    /// Validate a transition, naming the offending pair on failure.
    fn check(&self, from: State, action: Action) -> Result<State, LifecycleError> {
        self.transition(from, action)
            .ok_or(LifecycleError::IllegalTransition { state: from, action })
    }
}

/// The standard asset lifecycle, identical to the backend's rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLifecycle;

impl TransitionTable for StandardLifecycle {
    fn transition(&self, from: State, action: Action) -> Option<State> {
        TRANSITIONS
            .iter()
            .find(|(f, a, _)| *f == from && *a == action)
            .map(|(_, _, to)| *to)
    }

    fn next_action(&self, current: State, target: State) -> Option<Action> {
        NEXT_ACTIONS
            .iter()
            .find(|(c, t, _)| *c == current && *t == target)
            .map(|(_, _, action)| *action)
    }
}

impl StandardLifecycle {
    /// Actions legal in `state`.
    pub fn legal_actions(&self, state: State) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|a| self.transition(state, *a).is_some())
            .collect()
    }

    /// Number of transitions `next_action` takes to get from `from` to
    /// `target`, or `None` if the target is unreachable.
    pub fn distance(&self, from: State, target: State) -> Option<usize> {
        let mut current = from;
        for steps in 0..=State::ALL.len() {
            if current == target {
                return Some(steps);
            }
            let action = self.next_action(current, target)?;
            current = self.transition(current, action)?;
        }
        None
    }
}
