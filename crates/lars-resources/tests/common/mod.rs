//! Shared fixtures for the resource integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use lars_client::{AssetType, AttachmentType, MemoryBackend};
use lars_core::State;
use lars_resources::{AddNew, Repository, Resource, ResourceAttachment, TargetStates, UploadStrategy};

pub fn repo() -> (MemoryBackend, Repository) {
    let backend = MemoryBackend::new();
    let repo = Repository::new(Arc::new(backend.clone()));
    (backend, repo)
}

pub fn feature(name: &str, provider: &str) -> Resource {
    Resource::new(AssetType::Feature, name).with_provider(provider)
}

pub fn content(bytes: &[u8]) -> ResourceAttachment {
    ResourceAttachment::with_bytes("content.jar", AttachmentType::Content, bytes.to_vec())
}

/// Store `resource` as a new asset and drive it to `state`.
pub fn store(repo: &Repository, mut resource: Resource, state: State) -> Resource {
    let mut strategy = AddNew::new(TargetStates::always(state));
    strategy
        .upload_asset(repo, &mut resource, &[])
        .expect("store resource");
    resource
}
