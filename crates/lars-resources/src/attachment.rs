//! # Resource Attachments
//!
//! An attachment is backend metadata ([`Attachment`]) plus, optionally, the
//! local content that will be (or was) uploaded. Content never crosses the
//! wire as part of the document.
//!
//! ## Equivalence
//!
//! Two attachments are equivalent when name, type and CRC agree and their
//! link information agrees: both unlinked, or both linked with the same link
//! type and URL. Backend-assigned fields (id, asset id, upload time, and the
//! URL of an unlinked attachment) are ignored, so this is weaker than `==`
//! on the metadata.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use lars_client::{Attachment, AttachmentPayload, AttachmentType, LinkType};
use lars_core::RepoError;

use crate::resource::Resource;

/// What an upload has to do for a resource or attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateType {
    /// No counterpart exists in the backend.
    Add,
    /// A counterpart exists but differs.
    Update,
    /// The backend already holds an equivalent copy.
    Nothing,
}

/// Local content of an attachment.
#[derive(Debug, Clone)]
pub enum AttachmentContent {
    /// A file on disk, read at upload time.
    File(PathBuf),
    /// In-memory bytes.
    Bytes(Vec<u8>),
    /// A copy of backend-hosted content, removed when the last clone drops.
    Downloaded(Arc<NamedTempFile>),
}

/// Attachment metadata with optional local content.
#[derive(Debug, Clone)]
pub struct ResourceAttachment {
    meta: Attachment,
    content: Option<AttachmentContent>,
}

impl ResourceAttachment {
    /// Attachment with in-memory content. Size and CRC are computed.
    pub fn with_bytes(name: impl Into<String>, attachment_type: AttachmentType, bytes: Vec<u8>) -> Self {
        let meta = Attachment {
            name: name.into(),
            attachment_type: Some(attachment_type),
            size: bytes.len() as u64,
            crc: Some(crc32fast::hash(&bytes)),
            ..Default::default()
        };
        Self {
            meta,
            content: Some(AttachmentContent::Bytes(bytes)),
        }
    }

    /// Attachment whose content is a local file. The file is read once now
    /// to compute size and CRC.
    pub fn with_file(
        name: impl Into<String>,
        attachment_type: AttachmentType,
        path: impl Into<PathBuf>,
    ) -> Result<Self, RepoError> {
        let path = path.into();
        let (size, crc) = checksum_file(&path)?;
        let meta = Attachment {
            name: name.into(),
            attachment_type: Some(attachment_type),
            size,
            crc: Some(crc),
            ..Default::default()
        };
        Ok(Self {
            meta,
            content: Some(AttachmentContent::File(path)),
        })
    }

    /// Attachment hosted elsewhere; only its metadata is uploaded.
    pub fn link(
        name: impl Into<String>,
        attachment_type: AttachmentType,
        url: impl Into<String>,
        link_type: LinkType,
    ) -> Self {
        let meta = Attachment {
            name: name.into(),
            attachment_type: Some(attachment_type),
            url: Some(url.into()),
            link_type: Some(link_type),
            ..Default::default()
        };
        Self { meta, content: None }
    }

    /// Wrap metadata read from the backend.
    pub fn from_remote(meta: Attachment) -> Self {
        Self { meta, content: None }
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn attachment_type(&self) -> Option<AttachmentType> {
        self.meta.attachment_type
    }

    pub fn meta(&self) -> &Attachment {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Attachment {
        &mut self.meta
    }

    pub fn content(&self) -> Option<&AttachmentContent> {
        self.content.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.meta.link_type.is_some()
    }

    /// Hosted by the backend but without local content: the bytes must be
    /// downloaded before they can be uploaded anywhere else.
    pub fn needs_content_copy(&self) -> bool {
        self.content.is_none() && self.meta.link_type.is_none() && self.meta.url.is_some()
    }

    /// Attach downloaded content, dropping the backend URL and id it came
    /// from.
    pub(crate) fn set_downloaded(&mut self, file: NamedTempFile) {
        self.meta.url = None;
        self.meta.id = None;
        self.meta.asset_id = None;
        self.content = Some(AttachmentContent::Downloaded(Arc::new(file)));
    }

    /// Replace the metadata with what the backend stored, keeping local
    /// content.
    pub(crate) fn absorb_remote(&mut self, stored: Attachment) {
        self.meta = stored;
    }

    /// Copy backend-assigned fields from an equivalent remote attachment.
    pub(crate) fn adopt_backend_fields(&mut self, remote: &Attachment) {
        self.meta.id = remote.id.clone();
        self.meta.asset_id = remote.asset_id.clone();
        self.meta.upload_on = remote.upload_on;
        if self.meta.link_type.is_none() {
            self.meta.url = remote.url.clone();
        }
    }

    /// Forget backend-assigned fields so the attachment can be added anew.
    pub(crate) fn reset_backend_fields(&mut self) {
        self.meta.id = None;
        self.meta.asset_id = None;
        self.meta.upload_on = None;
        if self.meta.link_type.is_none() && self.content.is_some() {
            self.meta.url = None;
        }
    }

    /// Metadata to send when adding this attachment.
    pub(crate) fn outgoing_meta(&self) -> Attachment {
        let mut meta = self.meta.clone();
        meta.id = None;
        meta.asset_id = None;
        meta.upload_on = None;
        if meta.link_type.is_none() {
            meta.url = None;
        }
        meta
    }

    /// Content to send alongside the metadata.
    pub(crate) fn payload(&self) -> Result<AttachmentPayload<'_>, RepoError> {
        match &self.content {
            Some(AttachmentContent::Bytes(bytes)) => Ok(AttachmentPayload::Bytes(bytes)),
            Some(AttachmentContent::File(path)) => Ok(AttachmentPayload::File(path)),
            Some(AttachmentContent::Downloaded(file)) => Ok(AttachmentPayload::File(file.path())),
            None if self.is_linked() => Ok(AttachmentPayload::Link),
            None => Err(RepoError::validation(format!(
                "attachment {} has neither content nor a link",
                self.meta.name
            ))
            .for_attachment(self.meta.id.clone())),
        }
    }

    /// Equivalence with another attachment's metadata.
    pub fn equivalent(&self, other: &Attachment) -> bool {
        attachments_equivalent(&self.meta, other)
    }

    /// Whether this attachment has to be added to or updated in `remote`.
    pub fn update_required(&self, remote: Option<&Resource>) -> UpdateType {
        match remote.and_then(|r| r.attachment(self.name())) {
            None => UpdateType::Add,
            Some(existing) if self.equivalent(existing.meta()) => UpdateType::Nothing,
            Some(_) => UpdateType::Update,
        }
    }
}

/// Attachment equivalence, symmetric in its arguments.
pub fn attachments_equivalent(a: &Attachment, b: &Attachment) -> bool {
    if a.name != b.name || a.attachment_type != b.attachment_type || a.crc != b.crc {
        return false;
    }
    match (a.link_type, b.link_type) {
        (None, None) => true,
        (Some(x), Some(y)) => x == y && a.url == b.url,
        _ => false,
    }
}

fn checksum_file(path: &Path) -> Result<(u64, u32), RepoError> {
    let read_error = |e: std::io::Error| {
        RepoError::validation(format!("cannot read attachment file {}: {e}", path.display()))
            .with_source(e)
    };
    let mut file = std::fs::File::open(path).map_err(read_error)?;
    let mut hasher = crc32fast::Hasher::new();
    let mut size = 0u64;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(read_error)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((size, hasher.finalize()))
}
