//! # Vanity URL Cache
//!
//! Population, visibility rules, the one-visible-resource-per-URL check and
//! the Add-Then-Hide-Old strategy that keeps it true.

mod common;

use std::sync::Arc;

use lars_client::{DisplayPolicy, Operation};
use lars_core::{ErrorKind, State};
use lars_resources::{AddThenHideOld, TargetStates, VanityUrlCache};

use common::{content, feature, repo, store};

#[test]
fn cache_populates_lazily() {
    let (backend, repo) = repo();
    let published = store(&repo, feature("X", "P"), State::Published);
    let cache = VanityUrlCache::new();
    assert!(!cache.is_populated());
    assert_eq!(backend.call_count(Operation::ListAssets), 0);

    let url = published.vanity_url();
    let found = cache.get(&repo, &url).unwrap().unwrap();
    assert_eq!(found.id(), published.id());
    assert!(cache.is_populated());

    // Later additions are invisible until the cache is refreshed.
    let later = store(&repo, feature("Y", "P"), State::Published);
    backend.clear_calls();
    assert!(cache.get(&repo, &later.vanity_url()).unwrap().is_none());
    assert_eq!(backend.call_count(Operation::ListAssets), 0);

    cache.refresh(&repo).unwrap();
    assert!(cache.get(&repo, &later.vanity_url()).unwrap().is_some());
}

#[test]
fn only_visible_published_resources_are_cached() {
    let (_, repo) = repo();
    let draft = store(&repo, feature("Draft", "P"), State::Draft);
    let mut hidden = feature("Hidden", "P");
    hidden.common.web_display_policy = Some(DisplayPolicy::Hidden);
    let hidden = store(&repo, hidden, State::Published);
    // Falls back to the general display policy.
    let mut quiet = feature("Quiet", "P");
    quiet.common.display_policy = Some(DisplayPolicy::Hidden);
    let quiet = store(&repo, quiet, State::Published);

    let cache = VanityUrlCache::new();
    let guard = cache.lock(&repo).unwrap();
    assert!(guard.is_empty());
    for r in [&draft, &hidden, &quiet] {
        assert!(guard.get(&r.vanity_url()).is_none());
    }
}

#[test]
fn two_visible_resources_at_one_url_is_a_consistency_error() {
    let (_, repo) = repo();
    let a = store(&repo, feature("X", "P1"), State::Published);
    let b = store(&repo, feature("X", "P2"), State::Published);
    assert_eq!(a.vanity_url(), b.vanity_url());

    let cache = VanityUrlCache::new();
    let err = cache.lock(&repo).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    let message = err.to_string();
    assert!(message.contains(a.id().unwrap().as_str()), "{message}");
    assert!(message.contains(b.id().unwrap().as_str()), "{message}");
    assert!(!cache.is_populated());
}

#[test]
fn failed_refresh_keeps_previous_entries() {
    let (_, repo) = repo();
    let a = store(&repo, feature("X", "P1"), State::Published);
    let cache = VanityUrlCache::new();
    cache.lock(&repo).unwrap();

    store(&repo, feature("X", "P2"), State::Published);
    let err = cache.refresh(&repo).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);

    let guard = cache.lock(&repo).unwrap();
    assert_eq!(guard.len(), 1);
    assert_eq!(guard.get(&a.vanity_url()).unwrap().id(), a.id());
}

#[test]
fn add_then_hide_old_hides_the_previous_resource() {
    let (backend, repo) = repo();
    let mut old = feature("X", "P1");
    old.add_attachment(content(b"old bytes")).unwrap();
    let old = store(&repo, old, State::Published);
    let url = old.vanity_url();

    let cache = Arc::new(VanityUrlCache::new());
    let mut strategy = AddThenHideOld::new(TargetStates::always(State::Published), cache.clone());
    let mut candidate = feature("X", "P2");
    candidate.add_attachment(content(b"new bytes")).unwrap();
    repo.upload(&mut candidate, &mut strategy).unwrap();

    assert_eq!(candidate.state(), Some(State::Published));
    // The old resource was replaced by a hidden copy.
    assert!(backend
        .calls()
        .iter()
        .any(|c| c.operation == Operation::DeleteAsset && c.asset_id.as_ref() == old.id()));
    let deleted: Vec<_> = strategy.deleted_resources().iter().map(|r| r.id().cloned()).collect();
    assert_eq!(deleted, vec![old.id().cloned()]);
    assert_eq!(backend.asset_count(), 2);

    let listing = repo.get_all_resources(None).unwrap();
    let hidden = listing
        .resources
        .iter()
        .find(|r| r.provider_name() == Some("P1"))
        .unwrap();
    assert_ne!(hidden.id(), old.id());
    assert_eq!(hidden.common.web_display_policy, Some(DisplayPolicy::Hidden));
    assert_eq!(hidden.state(), Some(State::Published));
    assert_eq!(
        hidden.attachment("content.jar").unwrap().meta().crc,
        Some(crc32fast::hash(b"old bytes"))
    );

    assert_eq!(cache.get(&repo, &url).unwrap().unwrap().id(), candidate.id());
    // A full rebuild agrees.
    cache.refresh(&repo).unwrap();
    assert_eq!(cache.get(&repo, &url).unwrap().unwrap().id(), candidate.id());
}

#[test]
fn add_then_hide_old_replacing_its_own_match_hides_nothing() {
    let (backend, repo) = repo();
    let old = store(&repo, feature("X", "P").with_description("old"), State::Published);
    let cache = Arc::new(VanityUrlCache::new());
    let mut strategy = AddThenHideOld::new(TargetStates::default(), cache.clone());

    let mut candidate = feature("X", "P").with_description("new");
    repo.upload(&mut candidate, &mut strategy).unwrap();

    assert_eq!(backend.asset_count(), 1);
    assert_eq!(candidate.state(), Some(State::Published));
    assert_eq!(strategy.deleted_resources().len(), 1);
    assert_eq!(strategy.deleted_resources()[0].id(), old.id());
    assert_eq!(
        cache.get(&repo, &old.vanity_url()).unwrap().unwrap().id(),
        candidate.id()
    );
}

#[test]
fn add_then_hide_old_failure_leaves_a_conflict_that_a_rerun_clears() {
    let (backend, repo) = repo();
    let old = store(&repo, feature("X", "P").with_description("old"), State::Published);
    let url = old.vanity_url();
    let cache = Arc::new(VanityUrlCache::new());

    backend.fail_next(Operation::DeleteAsset, ErrorKind::BackendIo);
    let mut first = feature("X", "P").with_description("new");
    let mut strategy = AddThenHideOld::new(TargetStates::default(), cache.clone());
    let err = repo.upload(&mut first, &mut strategy).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Deletion);
    assert_eq!(err.resource_id(), old.id());

    // No rollback: the new copy is stored and published beside the old one,
    // while the cache still names the old one.
    assert_eq!(backend.asset_count(), 2);
    assert_eq!(cache.get(&repo, &url).unwrap().unwrap().id(), old.id());
    let conflict = cache.refresh(&repo).unwrap_err();
    assert_eq!(conflict.kind(), ErrorKind::Consistency);

    let mut again = feature("X", "P").with_description("new");
    let mut strategy = AddThenHideOld::new(TargetStates::default(), cache.clone());
    repo.upload(&mut again, &mut strategy).unwrap();

    assert_eq!(backend.asset_count(), 1);
    let deleted: Vec<_> = strategy.deleted_resources().iter().map(|r| r.id().cloned()).collect();
    assert_eq!(deleted, vec![old.id().cloned(), first.id().cloned()]);
    assert_eq!(cache.get(&repo, &url).unwrap().unwrap().id(), again.id());
    cache.refresh(&repo).unwrap();
    assert_eq!(cache.get(&repo, &url).unwrap().unwrap().id(), again.id());
}
