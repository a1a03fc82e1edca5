//! # Resource Descriptors
//!
//! A descriptor is an asset document, in the same camelCase shape the
//! repository serves, written as YAML or JSON. Backend-owned fields (id,
//! state, timestamps, attachments) are ignored: attachments are given on
//! the command line instead.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use lars_client::{Asset, AttachmentType};
use lars_resources::{Resource, ResourceAttachment};

/// Serialization of a descriptor file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Json,
    Yaml,
}

impl DescriptorFormat {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

pub fn load_descriptor(path: &Path) -> Result<Resource> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read descriptor {}", path.display()))?;
    parse_descriptor(&text, DescriptorFormat::from_path(path))
        .with_context(|| format!("invalid descriptor {}", path.display()))
}

pub fn parse_descriptor(text: &str, format: DescriptorFormat) -> Result<Resource> {
    let mut asset: Asset = match format {
        DescriptorFormat::Json => serde_json::from_str(text)?,
        DescriptorFormat::Yaml => serde_yaml::from_str(text)?,
    };
    if asset.id.is_some() || asset.state.is_some() || !asset.attachments.is_empty() {
        tracing::warn!("descriptor carries backend fields; ignoring id, state and attachments");
    }
    asset.id = None;
    asset.state = None;
    asset.created_on = None;
    asset.last_updated_on = None;
    asset.reviewed_on = None;
    asset.attachments.clear();
    Ok(Resource::from_asset(asset)?)
}

/// Parse `TYPE=PATH`, e.g. `content=build/feature.esa`. The attachment is
/// named after the file.
pub fn parse_attachment_spec(spec: &str) -> Result<(AttachmentType, PathBuf)> {
    let Some((kind, path)) = spec.split_once('=') else {
        bail!("attachment must be given as TYPE=PATH, got {spec:?}");
    };
    let kind = match kind.to_ascii_lowercase().replace('-', "_").as_str() {
        "content" => AttachmentType::Content,
        "thumbnail" => AttachmentType::Thumbnail,
        "illustration" => AttachmentType::Illustration,
        "documentation" => AttachmentType::Documentation,
        "license" => AttachmentType::License,
        "license_information" => AttachmentType::LicenseInformation,
        "license_agreement" => AttachmentType::LicenseAgreement,
        other => bail!("unknown attachment type {other:?}"),
    };
    if path.is_empty() {
        bail!("attachment {spec:?} has no path");
    }
    Ok((kind, PathBuf::from(path)))
}

/// Checksum the file named by `spec` and wrap it as an attachment.
pub fn load_attachment(spec: &str) -> Result<ResourceAttachment> {
    let (kind, path) = parse_attachment_spec(spec)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .with_context(|| format!("attachment path {} has no file name", path.display()))?;
    Ok(ResourceAttachment::with_file(name, kind, path)?)
}
