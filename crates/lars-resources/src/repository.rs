//! # Repository Façade
//!
//! [`Repository`] binds a backend, a transition table and tuning options,
//! and offers the resource-level operations the upload strategies are built
//! from: fetch, list, match, add, update, delete, lifecycle moves and
//! attachment synchronization.
//!
//! ## Lifecycle driving
//!
//! Every action is checked against the client-side table before the backend
//! is called, so illegal requests fail fast with a lifecycle error naming
//! the state and action. After each transition the resource is re-fetched;
//! the backend is the authority on the resulting state.
//!
//! ## Failure semantics
//!
//! Multi-step operations stop at the first failing backend call. Nothing is
//! rolled back; re-running an upload with the same identity recovers.

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;

use lars_client::{AssetType, RepositoryBackend};
use lars_core::{Action, AssetId, ErrorKind, LifecycleError, RepoError, State};
use lars_state::{StandardLifecycle, TransitionTable};

use crate::attachment::ResourceAttachment;
use crate::matching::create_matching_data;
use crate::resource::Resource;
use crate::strategy::UploadStrategy;

/// Tunables of the client core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryOptions {
    /// Upper bound on transitions performed by one `move_to_state` call.
    pub max_lifecycle_steps: usize,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            max_lifecycle_steps: 10,
        }
    }
}

/// Result of a bulk listing: everything readable, plus one error per
/// document that could not be read.
#[derive(Debug, Default)]
pub struct Listing {
    pub resources: Vec<Resource>,
    pub bad_data: Vec<RepoError>,
}

/// Resource-level access to an asset repository.
#[derive(Clone)]
pub struct Repository {
    backend: Arc<dyn RepositoryBackend>,
    lifecycle: Arc<dyn TransitionTable>,
    options: RepositoryOptions,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Repository using the standard lifecycle and default options.
    pub fn new(backend: Arc<dyn RepositoryBackend>) -> Self {
        Self::with_lifecycle(backend, Arc::new(StandardLifecycle), RepositoryOptions::default())
    }

    pub fn with_lifecycle(
        backend: Arc<dyn RepositoryBackend>,
        lifecycle: Arc<dyn TransitionTable>,
        options: RepositoryOptions,
    ) -> Self {
        Self {
            backend,
            lifecycle,
            options,
        }
    }

    pub fn backend(&self) -> &Arc<dyn RepositoryBackend> {
        &self.backend
    }

    pub fn options(&self) -> RepositoryOptions {
        self.options
    }

    // -- Reads --

    pub fn get_resource(&self, id: &AssetId) -> Result<Resource, RepoError> {
        Resource::from_asset(self.backend.get_asset(id)?)
    }

    /// Every resource, optionally of one type. Unreadable documents are
    /// reported in [`Listing::bad_data`] instead of failing the listing.
    pub fn get_all_resources(&self, asset_type: Option<AssetType>) -> Result<Listing, RepoError> {
        let mut listing = Listing::default();
        for item in self.backend.list_assets(asset_type)? {
            match item.and_then(Resource::from_asset) {
                Ok(resource) => listing.resources.push(resource),
                Err(e) if e.kind() == ErrorKind::BadData => {
                    tracing::warn!(asset_id = ?e.resource_id(), "skipping unreadable asset: {e}");
                    listing.bad_data.push(e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(listing)
    }

    /// Every stored resource with the same matching key as `candidate`,
    /// earliest created first (ties broken by id).
    pub fn find_matching_resources(&self, candidate: &Resource) -> Result<Vec<Resource>, RepoError> {
        match candidate.provider_name() {
            Some(name) if !name.trim().is_empty() => {}
            _ => {
                return Err(RepoError::validation(format!(
                    "resource {} has no provider",
                    candidate.name()
                ))
                .for_resource(candidate.id().cloned()))
            }
        }

        let key = create_matching_data(candidate);
        let mut matches: Vec<Resource> = self
            .get_all_resources(Some(candidate.asset_type()))?
            .resources
            .into_iter()
            .filter(|r| create_matching_data(r) == key)
            .collect();
        matches.sort_by(|a, b| {
            a.common
                .created_on
                .cmp(&b.common.created_on)
                .then_with(|| a.id().cmp(&b.id()))
        });

        if matches.len() > 1 {
            tracing::warn!(
                name = candidate.name(),
                asset_type = %candidate.asset_type(),
                count = matches.len(),
                "repository already holds duplicate resources"
            );
        }
        Ok(matches)
    }

    // -- Writes --

    /// Add an unpersisted resource and all its attachments. On success the
    /// resource carries the backend id, state, timestamps and attachment
    /// metadata.
    pub fn add_resource(&self, resource: &mut Resource) -> Result<(), RepoError> {
        if resource.id().is_some() {
            return Err(RepoError::validation("resource already has an id; reset it before adding")
                .for_resource(resource.id().cloned()));
        }
        self.add_resource_inner(resource)
            .map_err(|e| RepoError::wrap(ErrorKind::Creation, resource.id().cloned(), e))
    }

    fn add_resource_inner(&self, resource: &mut Resource) -> Result<(), RepoError> {
        let mut outgoing = resource.to_asset();
        outgoing.state = None;
        outgoing.created_on = None;
        outgoing.last_updated_on = None;
        outgoing.reviewed_on = None;
        outgoing.attachments.clear();

        let stored = self.backend.add_asset(&outgoing)?;
        let id = stored
            .id
            .clone()
            .ok_or_else(|| RepoError::bad_data("backend returned an asset without an id"))?;
        resource.common.id = Some(id.clone());
        tracing::info!(asset_id = %id, name = resource.name(), "added resource");

        for attachment in resource.attachments_mut() {
            self.add_attachment(&id, attachment)?;
        }
        self.refresh(resource)
    }

    /// Push the resource's fields to the backend. Attachments and state are
    /// not touched.
    pub fn update_resource(&self, resource: &mut Resource) -> Result<(), RepoError> {
        let id = resource.id().cloned().ok_or_else(|| {
            RepoError::validation(format!("resource {} has no id", resource.name()))
        })?;
        let mut outgoing = resource.to_asset();
        outgoing.attachments.clear();
        self.backend
            .update_asset(&outgoing)
            .and_then(|_| self.refresh(resource))
            .map_err(|e| RepoError::wrap(ErrorKind::Update, Some(id.clone()), e))?;
        tracing::info!(asset_id = %id, "updated resource");
        Ok(())
    }

    /// Delete a resource: its attachments first, then the asset.
    pub fn delete_resource(&self, resource: &Resource) -> Result<(), RepoError> {
        let id = resource.id().cloned().ok_or_else(|| {
            RepoError::validation(format!("resource {} has no id", resource.name()))
        })?;
        let result = resource
            .attachments()
            .iter()
            .filter_map(|a| a.meta().id.as_ref())
            .try_for_each(|aid| self.backend.delete_attachment(&id, aid))
            .and_then(|()| self.backend.delete_asset(&id));
        result.map_err(|e| RepoError::wrap(ErrorKind::Deletion, Some(id.clone()), e))?;
        tracing::info!(asset_id = %id, name = resource.name(), "deleted resource");
        Ok(())
    }

    /// Re-read the resource from the backend. Local attachment content is
    /// kept for attachments that are still equivalent to the stored ones.
    pub fn refresh(&self, resource: &mut Resource) -> Result<(), RepoError> {
        let id = resource
            .id()
            .cloned()
            .ok_or_else(|| RepoError::validation("cannot refresh a resource without an id"))?;
        let fresh = self.get_resource(&id)?;

        let mut local: Vec<ResourceAttachment> = resource.attachments().to_vec();
        let merged = fresh
            .attachments()
            .iter()
            .map(|remote| {
                let pos = local
                    .iter()
                    .position(|l| l.name() == remote.name() && l.equivalent(remote.meta()));
                match pos {
                    Some(pos) => {
                        let mut kept = local.swap_remove(pos);
                        kept.absorb_remote(remote.meta().clone());
                        kept
                    }
                    None => remote.clone(),
                }
            })
            .collect();

        resource.common = fresh.common;
        resource.details = fresh.details;
        resource.set_attachments(merged);
        Ok(())
    }

    // -- Attachments --

    /// Add one attachment to a stored asset and record the stored metadata.
    pub fn add_attachment(
        &self,
        asset_id: &AssetId,
        attachment: &mut ResourceAttachment,
    ) -> Result<(), RepoError> {
        let stored = self
            .backend
            .add_attachment(asset_id, &attachment.outgoing_meta(), attachment.payload()?)?;
        tracing::debug!(asset_id = %asset_id, attachment = attachment.name(), "added attachment");
        attachment.absorb_remote(stored);
        Ok(())
    }

    /// Replace the stored attachment `remote_id` with `attachment`.
    pub fn update_attachment(
        &self,
        asset_id: &AssetId,
        remote_id: &lars_core::AttachmentId,
        attachment: &mut ResourceAttachment,
    ) -> Result<(), RepoError> {
        let mut meta = attachment.outgoing_meta();
        meta.id = Some(remote_id.clone());
        let stored = self
            .backend
            .update_attachment(asset_id, &meta, attachment.payload()?)?;
        tracing::debug!(asset_id = %asset_id, attachment = attachment.name(), "updated attachment");
        attachment.absorb_remote(stored);
        Ok(())
    }

    /// Download every backend-hosted attachment that has no local content
    /// into a temporary file, so the resource can be added as a new asset.
    /// A download failing with a transport error is retried once.
    pub fn copy_attachment_content(&self, resource: &mut Resource) -> Result<(), RepoError> {
        let owner = resource.id().cloned();
        resource
            .attachments_mut()
            .iter_mut()
            .try_for_each(|attachment| self.copy_hosted_content(owner.as_ref(), attachment))
    }

    /// Single-attachment form of [`Repository::copy_attachment_content`].
    /// `owner` is used when the attachment does not name its asset.
    pub fn copy_hosted_content(
        &self,
        owner: Option<&AssetId>,
        attachment: &mut ResourceAttachment,
    ) -> Result<(), RepoError> {
        if !attachment.needs_content_copy() {
            return Ok(());
        }
        let meta = attachment.meta();
        let asset_id = meta.asset_id.clone().or_else(|| owner.cloned()).ok_or_else(|| {
            RepoError::validation(format!(
                "attachment {} has no owning asset to copy from",
                meta.name
            ))
        })?;
        let attachment_id = meta.id.clone().ok_or_else(|| {
            RepoError::validation(format!("attachment {} has no id to copy from", meta.name))
                .for_resource(Some(asset_id.clone()))
        })?;

        let file = match self.download(&asset_id, &attachment_id) {
            Err(e) if e.kind() == ErrorKind::BackendIo => {
                tracing::warn!(
                    asset_id = %asset_id,
                    attachment_id = %attachment_id,
                    "attachment download failed, retrying once: {e}"
                );
                self.download(&asset_id, &attachment_id)?
            }
            other => other?,
        };
        attachment.set_downloaded(file);
        Ok(())
    }

    fn download(
        &self,
        asset_id: &AssetId,
        attachment_id: &lars_core::AttachmentId,
    ) -> Result<NamedTempFile, RepoError> {
        let io_error = |e: std::io::Error| {
            RepoError::backend_io(format!("failed to copy attachment content: {e}"))
                .for_resource(Some(asset_id.clone()))
                .for_attachment(Some(attachment_id.clone()))
                .with_source(e)
        };
        let mut reader = self.backend.get_attachment_content(asset_id, attachment_id)?;
        let mut file = NamedTempFile::new().map_err(io_error)?;
        std::io::copy(&mut reader, &mut file).map_err(io_error)?;
        file.flush().map_err(io_error)?;
        Ok(file)
    }

    // -- Lifecycle --

    /// Perform one lifecycle action, then re-read the resource.
    pub fn perform_action(&self, resource: &mut Resource, action: Action) -> Result<(), RepoError> {
        let id = resource.id().cloned();
        let state = resource
            .state()
            .ok_or_else(|| RepoError::lifecycle(id.clone(), LifecycleError::NoState))?;
        self.lifecycle
            .check(state, action)
            .map_err(|e| RepoError::lifecycle(id.clone(), e))?;
        let asset_id = id.ok_or_else(|| {
            RepoError::validation("cannot change the state of an unpersisted resource")
        })?;

        self.backend.update_state(&asset_id, action)?;
        self.refresh(resource)?;
        tracing::info!(
            asset_id = %asset_id,
            action = %action,
            from = %state,
            to = ?resource.state(),
            "state transition"
        );
        Ok(())
    }

    /// Drive the resource to `target`, one next action at a time.
    pub fn move_to_state(&self, resource: &mut Resource, target: State) -> Result<(), RepoError> {
        for _ in 0..self.options.max_lifecycle_steps {
            let current = resource
                .state()
                .ok_or_else(|| RepoError::lifecycle(resource.id().cloned(), LifecycleError::NoState))?;
            if current == target {
                return Ok(());
            }
            let action = self.lifecycle.next_action(current, target).ok_or_else(|| {
                RepoError::lifecycle(
                    resource.id().cloned(),
                    LifecycleError::Unreachable {
                        from: current,
                        target,
                    },
                )
            })?;
            self.perform_action(resource, action)?;
        }

        match resource.state() {
            Some(state) if state == target => Ok(()),
            state => Err(RepoError::lifecycle(
                resource.id().cloned(),
                match state {
                    Some(state) => LifecycleError::NotConverged {
                        state,
                        target,
                        steps: self.options.max_lifecycle_steps,
                    },
                    None => LifecycleError::NoState,
                },
            )),
        }
    }

    // -- Uploads --

    /// Find the candidate's matches with `strategy`, then upload it.
    pub fn upload(&self, candidate: &mut Resource, strategy: &mut dyn UploadStrategy) -> Result<(), RepoError> {
        let matching = strategy.find_matching_resources(self, candidate)?;
        strategy.upload_asset(self, candidate, &matching)
    }
}
