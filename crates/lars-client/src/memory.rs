//! # In-Memory Backend
//!
//! A [`RepositoryBackend`] kept entirely in process memory. It behaves like
//! the real service where the client core can observe a difference:
//!
//! - ids are minted on add (asset ids are zero-padded hex counters, so they
//!   sort in creation order; attachment ids are random UUIDs);
//! - `createdOn` / `lastUpdatedOn` are stamped, `reviewedOn` on APPROVE;
//! - new assets start in DRAFT and `update_asset` never changes state or
//!   attachments;
//! - `update_state` enforces the standard transition table on its own;
//! - attachment content is stored, sized, checksummed and served back under
//!   a `memory://` URL.
//!
//! Documents are held as raw JSON so tests can plant undecodable data with
//! [`MemoryBackend::insert_raw`]. Every call is recorded, and
//! [`MemoryBackend::fail_next`] makes the next call of one operation fail.

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;

use lars_core::{Action, AssetId, AttachmentId, ErrorKind, RepoError, State};
use lars_state::{StandardLifecycle, TransitionTable};

use crate::backend::RepositoryBackend;
use crate::types::{Asset, AssetType, Attachment, AttachmentPayload};

/// Backend operation, used for call recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddAsset,
    GetAsset,
    UpdateAsset,
    DeleteAsset,
    ListAssets,
    AddAttachment,
    UpdateAttachment,
    GetAttachmentContent,
    DeleteAttachment,
    UpdateState,
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub operation: Operation,
    pub asset_id: Option<AssetId>,
    pub attachment_id: Option<AttachmentId>,
    pub action: Option<Action>,
}

impl BackendCall {
    fn new(operation: Operation, asset_id: Option<&AssetId>) -> Self {
        Self {
            operation,
            asset_id: asset_id.cloned(),
            attachment_id: None,
            action: None,
        }
    }
}

#[derive(Default)]
struct Inner {
    assets: DashMap<AssetId, serde_json::Value>,
    content: DashMap<(AssetId, AttachmentId), Vec<u8>>,
    next_id: AtomicU64,
    calls: Mutex<Vec<BackendCall>>,
    failures: Mutex<Vec<(Operation, ErrorKind)>>,
}

/// Shareable in-memory repository. Clones share the same store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("assets", &self.inner.assets.len())
            .finish_non_exhaustive()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `operation` fail with an error of `kind`.
    /// Injections for the same operation are consumed in order.
    pub fn fail_next(&self, operation: Operation, kind: ErrorKind) {
        self.inner.failures.lock().push((operation, kind));
    }

    /// Store a document verbatim, bypassing validation. A missing `_id` is
    /// assigned. Returns the document's id.
    pub fn insert_raw(&self, mut document: serde_json::Value) -> AssetId {
        let id = match document.get("_id").and_then(serde_json::Value::as_str) {
            Some(id) => AssetId::new(id),
            None => {
                let id = self.mint_asset_id();
                if let Some(obj) = document.as_object_mut() {
                    obj.insert("_id".into(), serde_json::Value::String(id.to_string()));
                }
                id
            }
        };
        self.inner.assets.insert(id.clone(), document);
        id
    }

    /// Every call recorded so far, oldest first.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.calls.lock().clone()
    }

    /// The `(asset, action)` pairs of every recorded `update_state` call.
    pub fn state_updates(&self) -> Vec<(AssetId, Action)> {
        self.inner
            .calls
            .lock()
            .iter()
            .filter_map(|c| Some((c.asset_id.clone()?, c.action?)))
            .collect()
    }

    /// Number of recorded calls of one operation.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.inner
            .calls
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.inner.calls.lock().clear();
    }

    /// Number of stored assets, including undecodable ones.
    pub fn asset_count(&self) -> usize {
        self.inner.assets.len()
    }

    fn mint_asset_id(&self) -> AssetId {
        let n = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        AssetId::new(format!("{n:024x}"))
    }

    /// Record the call, then apply any pending injected failure.
    fn enter(&self, call: BackendCall) -> Result<(), RepoError> {
        let operation = call.operation;
        let asset_id = call.asset_id.clone();
        self.inner.calls.lock().push(call);

        let mut failures = self.inner.failures.lock();
        if let Some(pos) = failures.iter().position(|(op, _)| *op == operation) {
            let (_, kind) = failures.remove(pos);
            return Err(RepoError::new(kind, format!("injected {operation:?} failure"))
                .for_resource(asset_id));
        }
        Ok(())
    }

    fn load(&self, id: &AssetId) -> Result<Asset, RepoError> {
        let doc = self
            .inner
            .assets
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                RepoError::not_found(format!("no asset with id {id}")).for_resource(Some(id.clone()))
            })?;
        serde_json::from_value(doc).map_err(|e| {
            RepoError::bad_data(format!("undecodable asset document: {e}"))
                .for_resource(Some(id.clone()))
                .with_source(e)
        })
    }

    fn store(&self, asset: &Asset) -> Result<(), RepoError> {
        let id = asset
            .id
            .clone()
            .ok_or_else(|| RepoError::validation("cannot store an asset without an id"))?;
        let doc = serde_json::to_value(asset).map_err(|e| {
            RepoError::bad_data(format!("cannot encode asset: {e}"))
                .for_resource(Some(id.clone()))
                .with_source(e)
        })?;
        self.inner.assets.insert(id, doc);
        Ok(())
    }

    fn read_payload(payload: AttachmentPayload<'_>) -> Result<Option<Vec<u8>>, RepoError> {
        match payload {
            AttachmentPayload::Link => Ok(None),
            AttachmentPayload::Bytes(bytes) => Ok(Some(bytes.to_vec())),
            AttachmentPayload::File(path) => std::fs::read(path).map(Some).map_err(|e| {
                RepoError::validation(format!(
                    "cannot read attachment content from {}: {e}",
                    path.display()
                ))
                .with_source(e)
            }),
        }
    }

    /// Fill in backend-owned attachment fields and store the content.
    fn stamp_attachment(
        &self,
        asset_id: &AssetId,
        attachment_id: AttachmentId,
        mut attachment: Attachment,
        content: Option<Vec<u8>>,
    ) -> Attachment {
        attachment.asset_id = Some(asset_id.clone());
        attachment.upload_on = Some(Utc::now());
        match content {
            Some(bytes) => {
                attachment.size = bytes.len() as u64;
                attachment.crc = Some(crc32fast::hash(&bytes));
                attachment.url = Some(format!(
                    "memory://assets/{asset_id}/attachments/{attachment_id}"
                ));
                attachment.link_type = None;
                self.inner
                    .content
                    .insert((asset_id.clone(), attachment_id.clone()), bytes);
            }
            None => {
                self.inner
                    .content
                    .remove(&(asset_id.clone(), attachment_id.clone()));
            }
        }
        attachment.id = Some(attachment_id);
        attachment
    }
}

impl RepositoryBackend for MemoryBackend {
    fn add_asset(&self, asset: &Asset) -> Result<Asset, RepoError> {
        self.enter(BackendCall::new(Operation::AddAsset, None))?;
        if asset.id.is_some() {
            return Err(RepoError::rejected("a new asset must not carry an id")
                .for_resource(asset.id.clone()));
        }

        let now = Utc::now();
        let mut stored = asset.clone();
        stored.id = Some(self.mint_asset_id());
        stored.state = Some(State::Draft);
        stored.created_on = Some(now);
        stored.last_updated_on = Some(now);
        stored.reviewed_on = None;
        stored.attachments.clear();
        self.store(&stored)?;

        tracing::debug!(asset_id = ?stored.id, name = %stored.name, "memory backend added asset");
        Ok(stored)
    }

    fn get_asset(&self, id: &AssetId) -> Result<Asset, RepoError> {
        self.enter(BackendCall::new(Operation::GetAsset, Some(id)))?;
        self.load(id)
    }

    fn update_asset(&self, asset: &Asset) -> Result<Asset, RepoError> {
        self.enter(BackendCall::new(Operation::UpdateAsset, asset.id.as_ref()))?;
        let id = asset
            .id
            .as_ref()
            .ok_or_else(|| RepoError::rejected("cannot update an asset without an id"))?;
        let existing = self.load(id)?;

        let mut stored = asset.clone();
        stored.state = existing.state;
        stored.created_on = existing.created_on;
        stored.reviewed_on = existing.reviewed_on;
        stored.attachments = existing.attachments;
        stored.last_updated_on = Some(Utc::now());
        self.store(&stored)?;
        Ok(stored)
    }

    fn delete_asset(&self, id: &AssetId) -> Result<(), RepoError> {
        self.enter(BackendCall::new(Operation::DeleteAsset, Some(id)))?;
        if self.inner.assets.remove(id).is_none() {
            return Err(
                RepoError::not_found(format!("no asset with id {id}")).for_resource(Some(id.clone()))
            );
        }
        self.inner.content.retain(|(asset_id, _), _| asset_id != id);
        Ok(())
    }

    fn list_assets(
        &self,
        asset_type: Option<AssetType>,
    ) -> Result<Vec<Result<Asset, RepoError>>, RepoError> {
        self.enter(BackendCall::new(Operation::ListAssets, None))?;

        let mut documents: Vec<(AssetId, serde_json::Value)> = self
            .inner
            .assets
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        documents.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(documents
            .into_iter()
            .filter(|(_, doc)| match asset_type {
                Some(t) => doc.get("type").and_then(serde_json::Value::as_str) == Some(t.as_str()),
                None => true,
            })
            .map(|(id, doc)| {
                serde_json::from_value::<Asset>(doc).map_err(|e| {
                    RepoError::bad_data(format!("undecodable asset document: {e}"))
                        .for_resource(Some(id))
                        .with_source(e)
                })
            })
            .collect())
    }

    fn add_attachment(
        &self,
        asset_id: &AssetId,
        attachment: &Attachment,
        payload: AttachmentPayload<'_>,
    ) -> Result<Attachment, RepoError> {
        self.enter(BackendCall::new(Operation::AddAttachment, Some(asset_id)))?;
        let mut asset = self.load(asset_id)?;
        let content = Self::read_payload(payload).map_err(|e| e.for_resource(Some(asset_id.clone())))?;

        let attachment_id = AttachmentId::new(uuid::Uuid::new_v4().simple().to_string());
        let stored = self.stamp_attachment(asset_id, attachment_id, attachment.clone(), content);
        asset.attachments.push(stored.clone());
        asset.last_updated_on = Some(Utc::now());
        self.store(&asset)?;
        Ok(stored)
    }

    fn update_attachment(
        &self,
        asset_id: &AssetId,
        attachment: &Attachment,
        payload: AttachmentPayload<'_>,
    ) -> Result<Attachment, RepoError> {
        let mut call = BackendCall::new(Operation::UpdateAttachment, Some(asset_id));
        call.attachment_id = attachment.id.clone();
        self.enter(call)?;

        let attachment_id = attachment.id.clone().ok_or_else(|| {
            RepoError::rejected(format!("attachment {} has no id", attachment.name))
                .for_resource(Some(asset_id.clone()))
        })?;
        let mut asset = self.load(asset_id)?;
        let slot = asset
            .attachments
            .iter()
            .position(|a| a.id.as_ref() == Some(&attachment_id))
            .ok_or_else(|| {
                RepoError::not_found(format!("no attachment with id {attachment_id}"))
                    .for_resource(Some(asset_id.clone()))
                    .for_attachment(Some(attachment_id.clone()))
            })?;
        let content = Self::read_payload(payload).map_err(|e| e.for_resource(Some(asset_id.clone())))?;

        let stored = self.stamp_attachment(asset_id, attachment_id, attachment.clone(), content);
        asset.attachments[slot] = stored.clone();
        asset.last_updated_on = Some(Utc::now());
        self.store(&asset)?;
        Ok(stored)
    }

    fn get_attachment_content(
        &self,
        asset_id: &AssetId,
        attachment_id: &AttachmentId,
    ) -> Result<Box<dyn Read + Send>, RepoError> {
        let mut call = BackendCall::new(Operation::GetAttachmentContent, Some(asset_id));
        call.attachment_id = Some(attachment_id.clone());
        self.enter(call)?;

        let bytes = self
            .inner
            .content
            .get(&(asset_id.clone(), attachment_id.clone()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                RepoError::not_found("no stored content")
                    .for_resource(Some(asset_id.clone()))
                    .for_attachment(Some(attachment_id.clone()))
            })?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn delete_attachment(
        &self,
        asset_id: &AssetId,
        attachment_id: &AttachmentId,
    ) -> Result<(), RepoError> {
        let mut call = BackendCall::new(Operation::DeleteAttachment, Some(asset_id));
        call.attachment_id = Some(attachment_id.clone());
        self.enter(call)?;

        let mut asset = self.load(asset_id)?;
        let before = asset.attachments.len();
        asset.attachments.retain(|a| a.id.as_ref() != Some(attachment_id));
        if asset.attachments.len() == before {
            return Err(RepoError::not_found(format!("no attachment with id {attachment_id}"))
                .for_resource(Some(asset_id.clone()))
                .for_attachment(Some(attachment_id.clone())));
        }
        self.inner
            .content
            .remove(&(asset_id.clone(), attachment_id.clone()));
        asset.last_updated_on = Some(Utc::now());
        self.store(&asset)
    }

    fn update_state(&self, asset_id: &AssetId, action: Action) -> Result<(), RepoError> {
        let mut call = BackendCall::new(Operation::UpdateState, Some(asset_id));
        call.action = Some(action);
        self.enter(call)?;

        let mut asset = self.load(asset_id)?;
        let current = asset.state.ok_or_else(|| {
            RepoError::rejected("asset has no state").for_resource(Some(asset_id.clone()))
        })?;
        let next = StandardLifecycle.check(current, action).map_err(|e| {
            RepoError::rejected(e.to_string())
                .for_resource(Some(asset_id.clone()))
                .with_source(e)
        })?;

        let now = Utc::now();
        asset.state = Some(next);
        asset.last_updated_on = Some(now);
        if action == Action::Approve {
            asset.reviewed_on = Some(now);
        }
        self.store(&asset)
    }
}
