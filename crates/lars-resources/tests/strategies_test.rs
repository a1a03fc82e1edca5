//! # Upload Strategy Integration Tests
//!
//! Each strategy against the in-memory backend, including failure
//! propagation and attachment content copying.

mod common;

use lars_client::{AttachmentType, LinkType, Operation};
use lars_core::{Action, ErrorKind, State};
use lars_resources::{
    AddNew, AddThenDelete, AssetOnlyReplace, AttachmentContent, ResourceAttachment, TargetStates,
    UpdateInPlace, UpdateType,
};

use common::{content, feature, repo, store};

// ── Add-New ─────────────────────────────────────────────────────────────

#[test]
fn add_new_always_creates_another_copy() {
    let (backend, repo) = repo();
    store(&repo, feature("X", "P"), State::Published);

    let mut candidate = feature("X", "P");
    repo.upload(&mut candidate, &mut AddNew::default()).unwrap();

    assert_eq!(backend.asset_count(), 2);
    // Target follows the existing match's state.
    assert_eq!(candidate.state(), Some(State::Published));
}

#[test]
fn add_new_uploads_attachments_with_checksums() {
    let (_, repo) = repo();
    let mut candidate = feature("X", "P");
    candidate.add_attachment(content(b"payload")).unwrap();
    candidate
        .add_attachment(ResourceAttachment::link(
            "docs",
            AttachmentType::Documentation,
            "https://example.com/docs",
            LinkType::WebPage,
        ))
        .unwrap();

    repo.upload(&mut candidate, &mut AddNew::default()).unwrap();

    let stored = repo.get_resource(candidate.id().unwrap()).unwrap();
    assert_eq!(stored.attachments().len(), 2);
    let jar = stored.attachment("content.jar").unwrap();
    assert_eq!(jar.meta().crc, Some(crc32fast::hash(b"payload")));
    assert_eq!(
        stored.attachment("docs").unwrap().meta().url.as_deref(),
        Some("https://example.com/docs")
    );
    assert!(candidate.equivalent(&stored));
}

#[test]
fn missing_provider_is_rejected_before_backend_calls() {
    let (backend, repo) = repo();
    let mut candidate = lars_resources::Resource::new(lars_client::AssetType::Feature, "X");
    let err = repo.upload(&mut candidate, &mut AddNew::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(backend.calls().is_empty());
}

#[test]
fn attachment_failure_is_a_creation_error_with_the_new_id() {
    let (backend, repo) = repo();
    let mut candidate = feature("X", "P");
    candidate.add_attachment(content(b"payload")).unwrap();
    backend.fail_next(Operation::AddAttachment, ErrorKind::BackendIo);

    let err = repo.upload(&mut candidate, &mut AddNew::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Creation);
    assert_eq!(err.root_kind(), ErrorKind::BackendIo);
    assert!(err.resource_id().is_some());
    // No rollback: the asset itself was stored.
    assert_eq!(backend.asset_count(), 1);
}

// ── Add-Then-Delete ─────────────────────────────────────────────────────

#[test]
fn add_then_delete_is_idempotent() {
    let (backend, repo) = repo();
    let mut strategy = AddThenDelete::default();

    let mut first = feature("X", "P").with_description("d");
    first.add_attachment(content(b"v1")).unwrap();
    repo.upload(&mut first, &mut strategy).unwrap();

    let mut second = feature("X", "P").with_description("d");
    second.add_attachment(content(b"v1")).unwrap();
    let matches = repo.find_matching_resources(&second).unwrap();
    assert_eq!(second.update_required(matches.first()), UpdateType::Nothing);

    backend.clear_calls();
    repo.upload(&mut second, &mut strategy).unwrap();

    assert_eq!(backend.asset_count(), 1);
    assert_eq!(backend.call_count(Operation::AddAsset), 0);
    assert_eq!(second.id(), first.id());
    assert!(strategy.deleted_resources().is_empty());
    assert!(second.attachment("content.jar").unwrap().meta().id.is_some());
}

#[test]
fn add_then_delete_removes_later_duplicates_when_unchanged() {
    let (backend, repo) = repo();
    let older = store(&repo, feature("X", "P"), State::Draft);
    let newer = store(&repo, feature("X", "P"), State::Draft);

    let mut strategy = AddThenDelete::default();
    let mut candidate = feature("X", "P");
    repo.upload(&mut candidate, &mut strategy).unwrap();

    assert_eq!(backend.asset_count(), 1);
    assert_eq!(candidate.id(), older.id());
    let deleted: Vec<_> = strategy.deleted_resources().iter().map(|r| r.id().cloned()).collect();
    assert_eq!(deleted, vec![newer.id().cloned()]);
}

#[test]
fn add_then_delete_replaces_changed_resource_in_its_state() {
    let (backend, repo) = repo();
    let old = store(&repo, feature("X", "P").with_description("old"), State::Published);

    let mut strategy = AddThenDelete::default();
    let mut candidate = feature("X", "P").with_description("new");
    repo.upload(&mut candidate, &mut strategy).unwrap();

    assert_eq!(backend.asset_count(), 1);
    assert_ne!(candidate.id(), old.id());
    assert_eq!(candidate.state(), Some(State::Published));
    assert_eq!(strategy.deleted_resources().len(), 1);
    assert_eq!(strategy.deleted_resources()[0].id(), old.id());
}

#[test]
fn forced_replace_adds_even_when_unchanged() {
    let (backend, repo) = repo();
    let old = store(&repo, feature("X", "P"), State::Draft);

    let mut strategy = AddThenDelete::default().force_replace(true);
    let mut candidate = feature("X", "P");
    repo.upload(&mut candidate, &mut strategy).unwrap();

    assert_eq!(backend.asset_count(), 1);
    assert_ne!(candidate.id(), old.id());
}

#[test]
fn unchanged_match_moves_to_configured_matching_state() {
    let (backend, repo) = repo();
    let kept = store(&repo, feature("X", "P"), State::Draft);

    let mut strategy = AddThenDelete::new(TargetStates {
        if_matching: Some(State::Published),
        no_match: State::Draft,
    });
    let mut candidate = feature("X", "P");
    backend.clear_calls();
    repo.upload(&mut candidate, &mut strategy).unwrap();

    assert_eq!(candidate.id(), kept.id());
    assert_eq!(candidate.state(), Some(State::Published));
    assert_eq!(backend.call_count(Operation::AddAsset), 0);
    let stored = repo.get_resource(kept.id().unwrap()).unwrap();
    assert_eq!(stored.state(), Some(State::Published));
    assert!(strategy.deleted_resources().is_empty());
}

#[test]
fn failed_delete_is_a_deletion_error_naming_the_match() {
    let (backend, repo) = repo();
    let old = store(&repo, feature("X", "P").with_description("old"), State::Draft);
    backend.fail_next(Operation::DeleteAsset, ErrorKind::BackendIo);

    let mut candidate = feature("X", "P").with_description("new");
    let err = repo
        .upload(&mut candidate, &mut AddThenDelete::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Deletion);
    assert_eq!(err.resource_id(), old.id());
    // Re-running recovers.
    let mut again = feature("X", "P").with_description("new");
    let mut strategy = AddThenDelete::default();
    repo.upload(&mut again, &mut strategy).unwrap();
    assert_eq!(backend.asset_count(), 1);
}

#[test]
fn replacing_a_fetched_resource_copies_hosted_content() {
    let (backend, repo) = repo();
    let mut original = feature("X", "P");
    original.add_attachment(content(b"hosted bytes")).unwrap();
    let original = store(&repo, original, State::Draft);

    let mut fetched = repo.get_resource(original.id().unwrap()).unwrap();
    assert!(fetched.attachment("content.jar").unwrap().needs_content_copy());
    fetched.common.description = Some("changed".into());
    backend.fail_next(Operation::GetAttachmentContent, ErrorKind::BackendIo);

    let mut strategy = AddThenDelete::default();
    let matches = vec![original.clone()];
    lars_resources::UploadStrategy::upload_asset(&mut strategy, &repo, &mut fetched, &matches).unwrap();

    assert_eq!(backend.call_count(Operation::GetAttachmentContent), 2);
    assert_ne!(fetched.id(), original.id());
    let copy = repo.get_resource(fetched.id().unwrap()).unwrap();
    let jar = copy.attachment("content.jar").unwrap();
    assert_eq!(jar.meta().crc, Some(crc32fast::hash(b"hosted bytes")));
    assert!(matches!(
        fetched.attachment("content.jar").unwrap().content(),
        Some(AttachmentContent::Downloaded(_))
    ));
    assert_eq!(backend.asset_count(), 1);
}

#[test]
fn content_copy_gives_up_after_one_retry() {
    let (backend, repo) = repo();
    let mut original = feature("X", "P");
    original.add_attachment(content(b"bytes")).unwrap();
    let original = store(&repo, original, State::Draft);

    let mut fetched = repo.get_resource(original.id().unwrap()).unwrap();
    backend.fail_next(Operation::GetAttachmentContent, ErrorKind::BackendIo);
    backend.fail_next(Operation::GetAttachmentContent, ErrorKind::BackendIo);

    let err = repo.copy_attachment_content(&mut fetched).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendIo);
    assert_eq!(backend.call_count(Operation::GetAttachmentContent), 2);
}

// ── Update-In-Place ─────────────────────────────────────────────────────

#[test]
fn update_in_place_unpublishes_before_writing() {
    let (backend, repo) = repo();
    let mut original = feature("X", "P").with_description("old");
    original.add_attachment(content(b"v1")).unwrap();
    original
        .add_attachment(ResourceAttachment::with_bytes(
            "readme.txt",
            AttachmentType::Documentation,
            b"read me".to_vec(),
        ))
        .unwrap();
    let original = store(&repo, original, State::Published);

    let mut candidate = feature("X", "P").with_description("new");
    candidate.add_attachment(content(b"v2")).unwrap();
    candidate
        .add_attachment(ResourceAttachment::with_bytes(
            "icon.png",
            AttachmentType::Thumbnail,
            b"png".to_vec(),
        ))
        .unwrap();

    backend.clear_calls();
    repo.upload(&mut candidate, &mut UpdateInPlace::default()).unwrap();

    // Same asset, back in its original state.
    assert_eq!(candidate.id(), original.id());
    assert_eq!(candidate.state(), Some(State::Published));
    assert_eq!(backend.asset_count(), 1);

    let id = original.id().cloned().unwrap();
    assert_eq!(
        backend.state_updates(),
        vec![
            (id.clone(), Action::Unpublish),
            (id.clone(), Action::Publish),
            (id, Action::Approve)
        ]
    );

    // Every write happened while the asset was unpublished.
    let calls = backend.calls();
    let position = |wanted: Action| {
        calls
            .iter()
            .position(|c| c.action == Some(wanted))
            .unwrap()
    };
    let (unpublished_at, republished_at) = (position(Action::Unpublish), position(Action::Publish));
    for (i, call) in calls.iter().enumerate() {
        if matches!(
            call.operation,
            Operation::UpdateAsset
                | Operation::AddAttachment
                | Operation::UpdateAttachment
                | Operation::DeleteAttachment
        ) {
            assert!(unpublished_at < i && i < republished_at, "{call:?} outside draft window");
        }
    }

    let stored = repo.get_resource(&original.id().cloned().unwrap()).unwrap();
    assert_eq!(stored.common.description.as_deref(), Some("new"));
    assert_eq!(
        stored.attachment("content.jar").unwrap().meta().crc,
        Some(crc32fast::hash(b"v2"))
    );
    assert!(stored.attachment("icon.png").is_some());
    assert!(stored.attachment("readme.txt").is_none());
}

#[test]
fn update_in_place_leaves_unchanged_attachments_alone() {
    let (backend, repo) = repo();
    let mut original = feature("X", "P").with_description("old");
    original.add_attachment(content(b"same")).unwrap();
    let original = store(&repo, original, State::Draft);

    let mut candidate = feature("X", "P").with_description("new");
    candidate.add_attachment(content(b"same")).unwrap();
    backend.clear_calls();
    repo.upload(&mut candidate, &mut UpdateInPlace::default()).unwrap();

    assert_eq!(backend.call_count(Operation::UpdateAsset), 1);
    assert_eq!(backend.call_count(Operation::AddAttachment), 0);
    assert_eq!(backend.call_count(Operation::UpdateAttachment), 0);
    assert_eq!(
        candidate.attachment("content.jar").unwrap().meta().id,
        original.attachment("content.jar").unwrap().meta().id
    );
}

#[test]
fn update_in_place_adds_when_nothing_matches() {
    let (backend, repo) = repo();
    let mut candidate = feature("X", "P");
    let mut strategy = UpdateInPlace::new(TargetStates {
        if_matching: None,
        no_match: State::AwaitingApproval,
    });
    repo.upload(&mut candidate, &mut strategy).unwrap();
    assert_eq!(backend.asset_count(), 1);
    assert_eq!(candidate.state(), Some(State::AwaitingApproval));
}

#[test]
fn update_in_place_attachment_failure_is_an_update_error() {
    let (backend, repo) = repo();
    let stored = store(&repo, feature("X", "P"), State::Draft);

    let mut candidate = feature("X", "P");
    candidate.add_attachment(content(b"new")).unwrap();
    backend.fail_next(Operation::AddAttachment, ErrorKind::BackendIo);

    let err = repo
        .upload(&mut candidate, &mut UpdateInPlace::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Update);
    assert_eq!(err.root_kind(), ErrorKind::BackendIo);
    assert_eq!(err.resource_id(), stored.id());
}

#[test]
fn update_in_place_copies_hosted_content_of_a_renamed_resource() {
    let (backend, repo) = repo();
    let mut original = feature("X", "P");
    original.add_attachment(content(b"hosted bytes")).unwrap();
    let original = store(&repo, original, State::Draft);

    let mut fetched = repo.get_resource(original.id().unwrap()).unwrap();
    fetched.common.name = "Y".into();
    repo.upload(&mut fetched, &mut UpdateInPlace::default()).unwrap();

    assert_eq!(backend.asset_count(), 2);
    assert_ne!(fetched.id(), original.id());
    assert_eq!(backend.call_count(Operation::GetAttachmentContent), 1);
    let copy = repo.get_resource(fetched.id().unwrap()).unwrap();
    assert_eq!(
        copy.attachment("content.jar").unwrap().meta().crc,
        Some(crc32fast::hash(b"hosted bytes"))
    );
}

#[test]
fn update_in_place_rehosts_content_from_another_asset() {
    let (backend, repo) = repo();
    let mut target = feature("X", "P");
    target.add_attachment(content(b"target bytes")).unwrap();
    let target = store(&repo, target, State::Published);
    let mut source = feature("Y", "P");
    source.add_attachment(content(b"source bytes")).unwrap();
    let source = store(&repo, source, State::Draft);

    // Pull Y's content into X.
    let mut candidate = repo.get_resource(source.id().unwrap()).unwrap();
    candidate.common.name = "X".into();
    backend.clear_calls();
    repo.upload(&mut candidate, &mut UpdateInPlace::default()).unwrap();

    assert_eq!(candidate.id(), target.id());
    assert_eq!(candidate.state(), Some(State::Published));
    let calls = backend.calls();
    let download = calls
        .iter()
        .position(|c| c.operation == Operation::GetAttachmentContent)
        .unwrap();
    let unpublish = calls
        .iter()
        .position(|c| c.action == Some(Action::Unpublish))
        .unwrap();
    assert!(download < unpublish);
    assert_eq!(backend.call_count(Operation::UpdateAttachment), 1);

    let stored = repo.get_resource(target.id().unwrap()).unwrap();
    assert_eq!(
        stored.attachment("content.jar").unwrap().meta().crc,
        Some(crc32fast::hash(b"source bytes"))
    );
    assert_eq!(backend.asset_count(), 2);
}

// ── Asset-Only-Replace ──────────────────────────────────────────────────

#[test]
fn asset_only_replace_requires_a_match() {
    let (backend, repo) = repo();
    let mut candidate = feature("X", "P");
    let err = repo.upload(&mut candidate, &mut AssetOnlyReplace).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.asset_count(), 0);
}

#[test]
fn asset_only_replace_keeps_attachments_and_state() {
    let (backend, repo) = repo();
    let mut original = feature("X", "P").with_description("old");
    original.add_attachment(content(b"v1")).unwrap();
    let original = store(&repo, original, State::Published);

    let mut candidate = feature("X", "P").with_description("new");
    candidate.add_attachment(content(b"v2")).unwrap();
    backend.clear_calls();
    repo.upload(&mut candidate, &mut AssetOnlyReplace).unwrap();

    assert_eq!(candidate.id(), original.id());
    assert_eq!(candidate.state(), Some(State::Published));
    assert_eq!(candidate.common.description.as_deref(), Some("new"));
    assert_eq!(backend.call_count(Operation::AddAttachment), 0);
    assert_eq!(backend.call_count(Operation::UpdateAttachment), 0);
    assert_eq!(
        candidate.attachment("content.jar").unwrap().meta().crc,
        Some(crc32fast::hash(b"v1"))
    );
}
