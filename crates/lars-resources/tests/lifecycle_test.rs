//! # Lifecycle Driving Against the In-Memory Backend
//!
//! Totality of the transition table, convergence of `move_to_state`, and
//! the bounded failure of a table that never reaches its target.

mod common;

use std::sync::Arc;

use lars_client::{MemoryBackend, Operation};
use lars_core::{Action, ErrorKind, LifecycleError, State};
use lars_resources::{Repository, RepositoryOptions};
use lars_state::{StandardLifecycle, TransitionTable};

use common::{feature, repo, store};

#[test]
fn new_resource_starts_in_draft() {
    let (_, repo) = repo();
    let r = store(&repo, feature("X", "P"), State::Draft);
    assert!(r.id().is_some());
    assert_eq!(r.state(), Some(State::Draft));
}

#[test]
fn illegal_actions_fail_before_any_backend_call() {
    let (backend, repo) = repo();
    for state in State::ALL {
        for action in Action::ALL {
            if StandardLifecycle.transition(state, action).is_some() {
                continue;
            }
            let mut r = store(&repo, feature(&format!("r-{state}-{action}"), "P"), state);
            backend.clear_calls();

            let err = repo.perform_action(&mut r, action).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Lifecycle);
            assert_eq!(
                err.lifecycle_error(),
                Some(&LifecycleError::IllegalTransition { state, action })
            );
            assert_eq!(backend.call_count(Operation::UpdateState), 0);

            let refetched = repo.get_resource(r.id().unwrap()).unwrap();
            assert_eq!(refetched.state(), Some(state), "{state} x {action}");
        }
    }
}

#[test]
fn move_to_state_converges_within_two_transitions() {
    let (backend, repo) = repo();
    for from in State::ALL {
        for target in State::ALL {
            let mut r = store(&repo, feature(&format!("m-{from}-{target}"), "P"), from);
            backend.clear_calls();

            let result = repo.move_to_state(&mut r, target);
            if from == State::Published && target == State::NeedMoreInfo {
                let err = result.unwrap_err();
                assert_eq!(
                    err.lifecycle_error(),
                    Some(&LifecycleError::Unreachable { from, target })
                );
                continue;
            }

            result.unwrap();
            assert_eq!(r.state(), Some(target));
            let steps = backend.state_updates().len();
            assert!(steps <= 2, "{from} -> {target} took {steps} transitions");
        }
    }
}

#[test]
fn draft_to_published_is_publish_then_approve() {
    let (backend, repo) = repo();
    let mut r = store(&repo, feature("X", "P"), State::Draft);
    backend.clear_calls();

    repo.move_to_state(&mut r, State::Published).unwrap();

    let id = r.id().cloned().unwrap();
    assert_eq!(
        backend.state_updates(),
        vec![(id.clone(), Action::Publish), (id, Action::Approve)]
    );
    assert!(r.common.reviewed_on.is_some());
}

/// Sends AWAITING_APPROVAL back to DRAFT when asked for PUBLISHED.
struct CyclicTable;

impl TransitionTable for CyclicTable {
    fn transition(&self, from: State, action: Action) -> Option<State> {
        StandardLifecycle.transition(from, action)
    }

    fn next_action(&self, current: State, target: State) -> Option<Action> {
        match (current, target) {
            (State::Draft, State::Published) => Some(Action::Publish),
            (State::AwaitingApproval, State::Published) => Some(Action::Cancel),
            _ => StandardLifecycle.next_action(current, target),
        }
    }
}

#[test]
fn cyclic_table_fails_after_the_configured_bound() {
    let backend = MemoryBackend::new();
    let options = RepositoryOptions {
        max_lifecycle_steps: 6,
    };
    let cyclic = Repository::with_lifecycle(Arc::new(backend.clone()), Arc::new(CyclicTable), options);
    let mut r = store(&cyclic, feature("X", "P"), State::Draft);
    backend.clear_calls();

    let err = cyclic.move_to_state(&mut r, State::Published).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lifecycle);
    assert_eq!(
        err.lifecycle_error(),
        Some(&LifecycleError::NotConverged {
            state: State::Draft,
            target: State::Published,
            steps: 6,
        })
    );
    assert_eq!(backend.state_updates().len(), 6);
}

#[test]
fn backend_rejection_surfaces_with_asset_id() {
    let (backend, repo) = repo();
    let mut r = store(&repo, feature("X", "P"), State::Draft);
    backend.fail_next(Operation::UpdateState, ErrorKind::BackendRejected);

    let err = repo.perform_action(&mut r, Action::Publish).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendRejected);
    assert_eq!(err.resource_id(), r.id());
    assert_eq!(r.state(), Some(State::Draft));
}

#[test]
fn unpersisted_resource_has_no_state() {
    let (_, repo) = repo();
    let mut r = feature("X", "P");
    let err = repo.move_to_state(&mut r, State::Published).unwrap_err();
    assert_eq!(err.lifecycle_error(), Some(&LifecycleError::NoState));
}
