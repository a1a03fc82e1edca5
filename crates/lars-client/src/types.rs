//! Wire documents exchanged with the repository backend.
//!
//! Fields use `#[serde(default)]` so documents written by newer services
//! still decode; `deny_unknown_fields` is intentionally NOT used. Enum
//! values this client does not know fail to decode, which the resource layer
//! reports as bad data rather than coercing.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lars_core::{AssetId, AttachmentId, State};

// -- Enumerations -------------------------------------------------------------

/// Kind of asset held in the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Feature,
    Install,
    Addon,
    Ifix,
    #[serde(rename = "ADMINSCRIPT")]
    AdminScript,
    #[serde(rename = "CONFIGSNIPPET")]
    ConfigSnippet,
    Tool,
    #[serde(rename = "PRODUCTSAMPLE")]
    ProductSample,
    #[serde(rename = "OPENSOURCE")]
    OpenSource,
}

impl AssetType {
    pub const ALL: [AssetType; 9] = [
        AssetType::Feature,
        AssetType::Install,
        AssetType::Addon,
        AssetType::Ifix,
        AssetType::AdminScript,
        AssetType::ConfigSnippet,
        AssetType::Tool,
        AssetType::ProductSample,
        AssetType::OpenSource,
    ];

    /// Canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "FEATURE",
            Self::Install => "INSTALL",
            Self::Addon => "ADDON",
            Self::Ifix => "IFIX",
            Self::AdminScript => "ADMINSCRIPT",
            Self::ConfigSnippet => "CONFIGSNIPPET",
            Self::Tool => "TOOL",
            Self::ProductSample => "PRODUCTSAMPLE",
            Self::OpenSource => "OPENSOURCE",
        }
    }

    /// Parse a wire name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }

    /// First path segment of the public vanity URL for this type.
    pub fn url_prefix(&self) -> &'static str {
        match self {
            Self::Feature => "features",
            Self::Install => "runtimes",
            Self::Addon => "addons",
            Self::Ifix => "ifixes",
            Self::AdminScript => "scripts",
            Self::ConfigSnippet => "configs",
            Self::Tool => "tools",
            Self::ProductSample => "samples",
            Self::OpenSource => "opensource",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of an attachment within its asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentType {
    /// The installable payload. At most one per asset.
    Content,
    Thumbnail,
    Illustration,
    Documentation,
    License,
    LicenseInformation,
    LicenseAgreement,
}

/// How an externally hosted attachment is reached.
///
/// An attachment without a link type has a URL minted by the repository
/// itself, which says nothing about the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkType {
    Direct,
    Efd,
    WebPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayPolicy {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadPolicy {
    All,
    Installer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallPolicy {
    WhenSatisfied,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Install,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseType {
    Ipla,
    Ilan,
    Ilar,
    Unspecified,
}

// -- Documents ----------------------------------------------------------------

/// Organisation providing an asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One bound of an applies-to version range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterVersion {
    pub value: String,
    #[serde(default = "default_true")]
    pub inclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Parsed form of one clause of an asset's applies-to header: the product
/// it applies to and the accepted version range, editions and install type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliesToFilterInfo {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<FilterVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_version: Option<FilterVersion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub editions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_type: Option<String>,
}

/// Type-specific extension block of an asset document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WlpInformation {
    /// Document schema version, e.g. `"1.0"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wlp_information_version: Option<String>,
    /// Raw applies-to header; parsing it is the caller's concern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to_filter_info: Vec<AppliesToFilterInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provide_feature: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require_feature: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supersedes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superseded_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_policy: Option<InstallPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_policy: Option<DisplayPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_display_policy: Option<DisplayPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_policy: Option<DownloadPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vanity_relative_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_edition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_install_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provide_fix: Vec<String>,
}

/// Attachment metadata as stored by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AttachmentId>,
    /// Owning asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<AssetId>,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<AttachmentType>,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_on: Option<DateTime<Utc>>,
}

/// An asset document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AssetId>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<AssetType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_type: Option<LicenseType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_on: Option<DateTime<Utc>>,
    /// Set by the backend when the asset is approved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub wlp_information: WlpInformation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Content sent along with attachment metadata.
#[derive(Debug, Clone, Copy)]
pub enum AttachmentPayload<'a> {
    /// Metadata only; the attachment points at an external URL.
    Link,
    /// In-memory content.
    Bytes(&'a [u8]),
    /// Content read from a local file.
    File(&'a Path),
}
