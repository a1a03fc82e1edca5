//! # Repository Backend Contract
//!
//! The narrow contract the client core needs from the repository service:
//! store, fetch, list and delete asset documents, manage attachments, and
//! request lifecycle transitions.
//!
//! Every call blocks the calling thread. Implementations must be
//! `Send + Sync` so one backend can be shared behind an `Arc` by every
//! thread using the client. The trait is object-safe to support runtime
//! selection (HTTP vs. in-memory).
//!
//! ## Errors
//!
//! Implementations report failures as [`RepoError`] with one of
//! `NotFound`, `BackendIo` (transport) or `BackendRejected` (the service
//! refused the request), and `BadData` for documents that do not decode.

use std::io::Read;

use lars_core::{Action, AssetId, AttachmentId, RepoError};

use crate::types::{Asset, AssetType, Attachment, AttachmentPayload};

/// Blocking access to an asset repository.
pub trait RepositoryBackend: Send + Sync {
    /// Store a new asset. The document must not carry an id; the returned
    /// document carries the backend-assigned id and state.
    fn add_asset(&self, asset: &Asset) -> Result<Asset, RepoError>;

    /// Fetch an asset, including its attachment metadata.
    fn get_asset(&self, id: &AssetId) -> Result<Asset, RepoError>;

    /// Replace an asset's fields. Attachments and lifecycle state are not
    /// changed by this call.
    fn update_asset(&self, asset: &Asset) -> Result<Asset, RepoError>;

    /// Delete an asset and every attachment it owns.
    fn delete_asset(&self, id: &AssetId) -> Result<(), RepoError>;

    /// List assets, optionally restricted to one type.
    ///
    /// The outer result reports transport failure; each inner result is one
    /// document, so a single undecodable document does not fail the listing.
    fn list_assets(
        &self,
        asset_type: Option<AssetType>,
    ) -> Result<Vec<Result<Asset, RepoError>>, RepoError>;

    /// Add an attachment to an asset.
    fn add_attachment(
        &self,
        asset_id: &AssetId,
        attachment: &Attachment,
        payload: AttachmentPayload<'_>,
    ) -> Result<Attachment, RepoError>;

    /// Replace an existing attachment (identified by `attachment.id`).
    fn update_attachment(
        &self,
        asset_id: &AssetId,
        attachment: &Attachment,
        payload: AttachmentPayload<'_>,
    ) -> Result<Attachment, RepoError>;

    /// Stream the content of a repository-hosted attachment.
    fn get_attachment_content(
        &self,
        asset_id: &AssetId,
        attachment_id: &AttachmentId,
    ) -> Result<Box<dyn Read + Send>, RepoError>;

    fn delete_attachment(
        &self,
        asset_id: &AssetId,
        attachment_id: &AttachmentId,
    ) -> Result<(), RepoError>;

    /// Perform a lifecycle action. The backend validates the transition
    /// independently and is the authority on the result.
    fn update_state(&self, asset_id: &AssetId, action: Action) -> Result<(), RepoError>;
}
