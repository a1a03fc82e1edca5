//! # Typed Resources
//!
//! A [`Resource`] is the client-side view of an asset: the fields every
//! asset shares ([`CommonFields`]), one type-specific block
//! ([`ResourceDetails`]) and the attachments.
//!
//! Behaviour that differs per asset type (which fields identify a
//! duplicate, which version appears in the vanity URL, how the block maps
//! onto the wire document) is the [`Capability`] trait, implemented once per
//! detail struct.
//!
//! ## Conversion
//!
//! [`Resource::from_asset`] refuses documents it cannot represent faithfully
//! (no type, or a `wlpInformationVersion` with a major version above 1) with
//! a bad-data error.

use chrono::{DateTime, Utc};

use lars_client::{
    AppliesToFilterInfo, Asset, AssetType, AttachmentType, DisplayPolicy, DownloadPolicy,
    InstallPolicy, LicenseType, Provider, Visibility, WlpInformation,
};
use lars_core::{AssetId, RepoError, State};

use crate::attachment::{attachments_equivalent, ResourceAttachment, UpdateType};

/// Document schema version written by this client.
pub const WLP_INFORMATION_VERSION: &str = "1.0";

/// Highest schema major version this client understands.
const SUPPORTED_MAJOR_VERSION: u32 = 1;

/// Fields shared by every asset type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommonFields {
    pub id: Option<AssetId>,
    pub name: String,
    pub provider: Option<Provider>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub state: Option<State>,
    pub license_type: Option<LicenseType>,
    pub license_id: Option<String>,
    pub download_policy: Option<DownloadPolicy>,
    pub display_policy: Option<DisplayPolicy>,
    pub web_display_policy: Option<DisplayPolicy>,
    /// Raw applies-to header, carried through unparsed.
    pub applies_to: Option<String>,
    pub wlp_information_version: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub last_updated_on: Option<DateTime<Utc>>,
    pub reviewed_on: Option<DateTime<Utc>>,
}

// -- Type-specific blocks -----------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureDetails {
    pub provide_feature: Vec<String>,
    pub require_feature: Vec<String>,
    pub supersedes: Vec<String>,
    pub superseded_by: Vec<String>,
    pub install_policy: Option<InstallPolicy>,
    pub visibility: Option<Visibility>,
    pub short_name: Option<String>,
    pub applies_to_filter_info: Vec<AppliesToFilterInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductKind {
    Install,
    Addon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetails {
    pub kind: ProductKind,
    pub product_id: Option<String>,
    pub product_edition: Option<String>,
    pub product_version: Option<String>,
    pub product_install_type: Option<String>,
    pub provide_feature: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IfixDetails {
    pub provide_fix: Vec<String>,
    pub applies_to_filter_info: Vec<AppliesToFilterInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Product,
    OpenSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleDetails {
    pub kind: SampleKind,
    pub short_name: Option<String>,
    pub require_feature: Vec<String>,
    pub applies_to_filter_info: Vec<AppliesToFilterInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Tool,
    AdminScript,
    ConfigSnippet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentDetails {
    pub kind: ContentKind,
    pub require_feature: Vec<String>,
    pub applies_to_filter_info: Vec<AppliesToFilterInfo>,
}

/// Type-specific block of a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceDetails {
    Feature(FeatureDetails),
    Product(ProductDetails),
    Ifix(IfixDetails),
    Sample(SampleDetails),
    Content(ContentDetails),
}

/// Per-type behaviour of a resource.
pub trait Capability {
    fn asset_type(&self) -> AssetType;

    /// Identity fields beyond name, provider and type.
    fn matching_extra(&self) -> Vec<String>;

    /// Version segment of the vanity URL, if any.
    fn version_for_vanity_url(&self) -> Option<String>;

    fn applies_to_filter_info(&self) -> &[AppliesToFilterInfo];

    /// Write this block into a wire extension block.
    fn write_wlp(&self, wlp: &mut WlpInformation);
}

fn filter_keys(filters: &[AppliesToFilterInfo]) -> Vec<String> {
    filters
        .iter()
        .map(|f| {
            format!(
                "{}|{}|{}",
                f.product_id,
                f.min_version.as_ref().map_or("", |v| v.value.as_str()),
                f.max_version.as_ref().map_or("", |v| v.value.as_str()),
            )
        })
        .collect()
}

fn first_min_version(filters: &[AppliesToFilterInfo]) -> Option<String> {
    filters
        .first()
        .and_then(|f| f.min_version.as_ref())
        .map(|v| v.value.clone())
}

impl Capability for FeatureDetails {
    fn asset_type(&self) -> AssetType {
        AssetType::Feature
    }

    fn matching_extra(&self) -> Vec<String> {
        let mut extra = self.provide_feature.clone();
        extra.extend(filter_keys(&self.applies_to_filter_info));
        extra
    }

    fn version_for_vanity_url(&self) -> Option<String> {
        first_min_version(&self.applies_to_filter_info)
    }

    fn applies_to_filter_info(&self) -> &[AppliesToFilterInfo] {
        &self.applies_to_filter_info
    }

    fn write_wlp(&self, wlp: &mut WlpInformation) {
        wlp.provide_feature = self.provide_feature.clone();
        wlp.require_feature = self.require_feature.clone();
        wlp.supersedes = self.supersedes.clone();
        wlp.superseded_by = self.superseded_by.clone();
        wlp.install_policy = self.install_policy;
        wlp.visibility = self.visibility;
        wlp.short_name = self.short_name.clone();
        wlp.applies_to_filter_info = self.applies_to_filter_info.clone();
    }
}

impl Capability for ProductDetails {
    fn asset_type(&self) -> AssetType {
        match self.kind {
            ProductKind::Install => AssetType::Install,
            ProductKind::Addon => AssetType::Addon,
        }
    }

    fn matching_extra(&self) -> Vec<String> {
        vec![
            self.product_id.clone().unwrap_or_default(),
            self.product_version.clone().unwrap_or_default(),
            self.product_edition.clone().unwrap_or_default(),
        ]
    }

    fn version_for_vanity_url(&self) -> Option<String> {
        self.product_version.clone()
    }

    fn applies_to_filter_info(&self) -> &[AppliesToFilterInfo] {
        &[]
    }

    fn write_wlp(&self, wlp: &mut WlpInformation) {
        wlp.product_id = self.product_id.clone();
        wlp.product_edition = self.product_edition.clone();
        wlp.product_version = self.product_version.clone();
        wlp.product_install_type = self.product_install_type.clone();
        wlp.provide_feature = self.provide_feature.clone();
    }
}

impl Capability for IfixDetails {
    fn asset_type(&self) -> AssetType {
        AssetType::Ifix
    }

    fn matching_extra(&self) -> Vec<String> {
        filter_keys(&self.applies_to_filter_info)
    }

    fn version_for_vanity_url(&self) -> Option<String> {
        first_min_version(&self.applies_to_filter_info)
    }

    fn applies_to_filter_info(&self) -> &[AppliesToFilterInfo] {
        &self.applies_to_filter_info
    }

    fn write_wlp(&self, wlp: &mut WlpInformation) {
        wlp.provide_fix = self.provide_fix.clone();
        wlp.applies_to_filter_info = self.applies_to_filter_info.clone();
    }
}

impl Capability for SampleDetails {
    fn asset_type(&self) -> AssetType {
        match self.kind {
            SampleKind::Product => AssetType::ProductSample,
            SampleKind::OpenSource => AssetType::OpenSource,
        }
    }

    fn matching_extra(&self) -> Vec<String> {
        filter_keys(&self.applies_to_filter_info)
    }

    fn version_for_vanity_url(&self) -> Option<String> {
        first_min_version(&self.applies_to_filter_info)
    }

    fn applies_to_filter_info(&self) -> &[AppliesToFilterInfo] {
        &self.applies_to_filter_info
    }

    fn write_wlp(&self, wlp: &mut WlpInformation) {
        wlp.short_name = self.short_name.clone();
        wlp.require_feature = self.require_feature.clone();
        wlp.applies_to_filter_info = self.applies_to_filter_info.clone();
    }
}

impl Capability for ContentDetails {
    fn asset_type(&self) -> AssetType {
        match self.kind {
            ContentKind::Tool => AssetType::Tool,
            ContentKind::AdminScript => AssetType::AdminScript,
            ContentKind::ConfigSnippet => AssetType::ConfigSnippet,
        }
    }

    fn matching_extra(&self) -> Vec<String> {
        filter_keys(&self.applies_to_filter_info)
    }

    fn version_for_vanity_url(&self) -> Option<String> {
        first_min_version(&self.applies_to_filter_info)
    }

    fn applies_to_filter_info(&self) -> &[AppliesToFilterInfo] {
        &self.applies_to_filter_info
    }

    fn write_wlp(&self, wlp: &mut WlpInformation) {
        wlp.require_feature = self.require_feature.clone();
        wlp.applies_to_filter_info = self.applies_to_filter_info.clone();
    }
}

impl ResourceDetails {
    /// Empty block for an asset type.
    pub fn for_type(asset_type: AssetType) -> Self {
        Self::from_wlp(asset_type, &WlpInformation::default())
    }

    /// Read the block for `asset_type` out of a wire extension block.
    pub fn from_wlp(asset_type: AssetType, wlp: &WlpInformation) -> Self {
        let product = |kind| {
            Self::Product(ProductDetails {
                kind,
                product_id: wlp.product_id.clone(),
                product_edition: wlp.product_edition.clone(),
                product_version: wlp.product_version.clone(),
                product_install_type: wlp.product_install_type.clone(),
                provide_feature: wlp.provide_feature.clone(),
            })
        };
        let sample = |kind| {
            Self::Sample(SampleDetails {
                kind,
                short_name: wlp.short_name.clone(),
                require_feature: wlp.require_feature.clone(),
                applies_to_filter_info: wlp.applies_to_filter_info.clone(),
            })
        };
        let content = |kind| {
            Self::Content(ContentDetails {
                kind,
                require_feature: wlp.require_feature.clone(),
                applies_to_filter_info: wlp.applies_to_filter_info.clone(),
            })
        };

        match asset_type {
            AssetType::Feature => Self::Feature(FeatureDetails {
                provide_feature: wlp.provide_feature.clone(),
                require_feature: wlp.require_feature.clone(),
                supersedes: wlp.supersedes.clone(),
                superseded_by: wlp.superseded_by.clone(),
                install_policy: wlp.install_policy,
                visibility: wlp.visibility,
                short_name: wlp.short_name.clone(),
                applies_to_filter_info: wlp.applies_to_filter_info.clone(),
            }),
            AssetType::Install => product(ProductKind::Install),
            AssetType::Addon => product(ProductKind::Addon),
            AssetType::Ifix => Self::Ifix(IfixDetails {
                provide_fix: wlp.provide_fix.clone(),
                applies_to_filter_info: wlp.applies_to_filter_info.clone(),
            }),
            AssetType::ProductSample => sample(SampleKind::Product),
            AssetType::OpenSource => sample(SampleKind::OpenSource),
            AssetType::Tool => content(ContentKind::Tool),
            AssetType::AdminScript => content(ContentKind::AdminScript),
            AssetType::ConfigSnippet => content(ContentKind::ConfigSnippet),
        }
    }

    /// The per-type behaviour of this block.
    pub fn capability(&self) -> &dyn Capability {
        match self {
            Self::Feature(d) => d,
            Self::Product(d) => d,
            Self::Ifix(d) => d,
            Self::Sample(d) => d,
            Self::Content(d) => d,
        }
    }

    pub fn asset_type(&self) -> AssetType {
        self.capability().asset_type()
    }

    /// Mutable access to the applies-to filters, for types that have them.
    pub fn applies_to_filter_info_mut(&mut self) -> Option<&mut Vec<AppliesToFilterInfo>> {
        match self {
            Self::Feature(d) => Some(&mut d.applies_to_filter_info),
            Self::Ifix(d) => Some(&mut d.applies_to_filter_info),
            Self::Sample(d) => Some(&mut d.applies_to_filter_info),
            Self::Content(d) => Some(&mut d.applies_to_filter_info),
            Self::Product(_) => None,
        }
    }
}

// -- Resource -----------------------------------------------------------------

/// Client-side view of one asset.
#[derive(Debug, Clone)]
pub struct Resource {
    pub common: CommonFields,
    pub details: ResourceDetails,
    attachments: Vec<ResourceAttachment>,
}

impl Resource {
    /// New, unpersisted resource of the given type.
    pub fn new(asset_type: AssetType, name: impl Into<String>) -> Self {
        Self {
            common: CommonFields {
                name: name.into(),
                ..Default::default()
            },
            details: ResourceDetails::for_type(asset_type),
            attachments: Vec::new(),
        }
    }

    pub fn with_provider(mut self, name: impl Into<String>) -> Self {
        self.common.provider = Some(Provider {
            name: name.into(),
            url: None,
        });
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.common.version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.common.description = Some(description.into());
        self
    }

    pub fn with_details(mut self, details: ResourceDetails) -> Self {
        self.details = details;
        self
    }

    /// Build a resource from a backend document.
    pub fn from_asset(asset: Asset) -> Result<Self, RepoError> {
        let id = asset.id.clone();
        let asset_type = asset.asset_type.ok_or_else(|| {
            RepoError::bad_data("asset document has no type").for_resource(id.clone())
        })?;
        let wlp = asset.wlp_information;

        if let Some(version) = &wlp.wlp_information_version {
            let major = version
                .split('.')
                .next()
                .and_then(|m| m.trim().parse::<u32>().ok());
            match major {
                Some(m) if m <= SUPPORTED_MAJOR_VERSION => {}
                _ => {
                    return Err(RepoError::bad_data(format!(
                        "unsupported wlpInformationVersion {version}"
                    ))
                    .for_resource(id))
                }
            }
        }

        let details = ResourceDetails::from_wlp(asset_type, &wlp);
        let common = CommonFields {
            id: asset.id,
            name: asset.name,
            provider: asset.provider,
            version: asset.version,
            description: asset.description,
            short_description: asset.short_description,
            state: asset.state,
            license_type: asset.license_type,
            license_id: asset.license_id,
            download_policy: wlp.download_policy,
            display_policy: wlp.display_policy,
            web_display_policy: wlp.web_display_policy,
            applies_to: wlp.applies_to,
            wlp_information_version: wlp.wlp_information_version,
            created_on: asset.created_on,
            last_updated_on: asset.last_updated_on,
            reviewed_on: asset.reviewed_on,
        };
        let attachments = asset
            .attachments
            .into_iter()
            .map(ResourceAttachment::from_remote)
            .collect();

        Ok(Self {
            common,
            details,
            attachments,
        })
    }

    /// The wire document for this resource, including attachment metadata.
    pub fn to_asset(&self) -> Asset {
        let c = &self.common;
        let mut wlp = WlpInformation {
            wlp_information_version: Some(
                c.wlp_information_version
                    .clone()
                    .unwrap_or_else(|| WLP_INFORMATION_VERSION.to_string()),
            ),
            applies_to: c.applies_to.clone(),
            display_policy: c.display_policy,
            web_display_policy: c.web_display_policy,
            download_policy: c.download_policy,
            vanity_relative_url: Some(self.vanity_url()),
            ..Default::default()
        };
        self.details.capability().write_wlp(&mut wlp);

        Asset {
            id: c.id.clone(),
            name: c.name.clone(),
            provider: c.provider.clone(),
            asset_type: Some(self.asset_type()),
            version: c.version.clone(),
            description: c.description.clone(),
            short_description: c.short_description.clone(),
            state: c.state,
            license_type: c.license_type,
            license_id: c.license_id.clone(),
            created_on: c.created_on,
            last_updated_on: c.last_updated_on,
            reviewed_on: c.reviewed_on,
            wlp_information: wlp,
            attachments: self.attachments.iter().map(|a| a.meta().clone()).collect(),
        }
    }

    pub fn id(&self) -> Option<&AssetId> {
        self.common.id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.common.name
    }

    pub fn state(&self) -> Option<State> {
        self.common.state
    }

    pub fn asset_type(&self) -> AssetType {
        self.details.asset_type()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.common.provider.as_ref().map(|p| p.name.as_str())
    }

    /// Forget the backend id so the resource can be added again. Attachment
    /// ids go with it.
    pub fn reset_id(&mut self) {
        self.common.id = None;
        for attachment in &mut self.attachments {
            attachment.reset_backend_fields();
        }
    }

    /// Visible on the public web catalog. Absent policies mean visible.
    pub fn is_web_visible(&self) -> bool {
        let policy = self
            .common
            .web_display_policy
            .or(self.common.display_policy)
            .unwrap_or(DisplayPolicy::Visible);
        policy == DisplayPolicy::Visible
    }

    /// Relative URL under which the resource is shown publicly.
    pub fn vanity_url(&self) -> String {
        let mut raw = format!("{}-{}", self.asset_type().url_prefix(), self.common.name);
        if let Some(version) = self.details.capability().version_for_vanity_url() {
            raw.push('-');
            raw.push_str(&version);
        }
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    // -- Attachments --

    pub fn attachments(&self) -> &[ResourceAttachment] {
        &self.attachments
    }

    pub(crate) fn attachments_mut(&mut self) -> &mut [ResourceAttachment] {
        &mut self.attachments
    }

    pub fn attachment(&self, name: &str) -> Option<&ResourceAttachment> {
        self.attachments.iter().find(|a| a.name() == name)
    }

    /// Add an attachment. Names must be unique and at most one attachment
    /// may be CONTENT.
    pub fn add_attachment(&mut self, attachment: ResourceAttachment) -> Result<(), RepoError> {
        if self.attachment(attachment.name()).is_some() {
            return Err(RepoError::validation(format!(
                "duplicate attachment name {}",
                attachment.name()
            ))
            .for_resource(self.common.id.clone()));
        }
        if attachment.attachment_type() == Some(AttachmentType::Content)
            && self
                .attachments
                .iter()
                .any(|a| a.attachment_type() == Some(AttachmentType::Content))
        {
            return Err(
                RepoError::validation("a resource may have only one CONTENT attachment")
                    .for_resource(self.common.id.clone()),
            );
        }
        self.attachments.push(attachment);
        Ok(())
    }

    pub fn remove_attachment(&mut self, name: &str) -> Option<ResourceAttachment> {
        let pos = self.attachments.iter().position(|a| a.name() == name)?;
        Some(self.attachments.remove(pos))
    }

    pub(crate) fn set_attachments(&mut self, attachments: Vec<ResourceAttachment>) {
        self.attachments = attachments;
    }

    // -- Equivalence and merging --

    /// Equivalence of everything except backend-assigned fields and
    /// attachments.
    pub fn equivalent_without_attachments(&self, other: &Resource) -> bool {
        fn stripped(resource: &Resource) -> Asset {
            let mut asset = resource.to_asset();
            asset.id = None;
            asset.state = None;
            asset.created_on = None;
            asset.last_updated_on = None;
            asset.reviewed_on = None;
            asset.wlp_information.vanity_relative_url = None;
            asset.wlp_information.wlp_information_version = None;
            asset.attachments.clear();
            asset
        }
        stripped(self) == stripped(other)
    }

    /// Full equivalence: core fields and attachment sets.
    pub fn equivalent(&self, other: &Resource) -> bool {
        self.equivalent_without_attachments(other)
            && self.attachments.len() == other.attachments.len()
            && self.attachments.iter().all(|a| {
                other
                    .attachment(a.name())
                    .is_some_and(|b| attachments_equivalent(a.meta(), b.meta()))
            })
    }

    /// What uploading this resource over `first_match` involves.
    pub fn update_required(&self, first_match: Option<&Resource>) -> UpdateType {
        let Some(existing) = first_match else {
            return UpdateType::Add;
        };
        if !self.equivalent_without_attachments(existing) {
            return UpdateType::Update;
        }
        let attachment_changed = self
            .attachments
            .iter()
            .any(|a| a.update_required(Some(existing)) != UpdateType::Nothing);
        let attachment_dropped = existing
            .attachments
            .iter()
            .any(|a| self.attachment(a.name()).is_none());
        if attachment_changed || attachment_dropped {
            UpdateType::Update
        } else {
            UpdateType::Nothing
        }
    }

    /// Overwrite the user-editable fields with those of `other`. Id, state,
    /// timestamps and attachments are kept.
    pub fn copy_fields_from(&mut self, other: &Resource) {
        let src = &other.common;
        let dst = &mut self.common;
        dst.name = src.name.clone();
        dst.provider = src.provider.clone();
        dst.version = src.version.clone();
        dst.description = src.description.clone();
        dst.short_description = src.short_description.clone();
        dst.license_type = src.license_type;
        dst.license_id = src.license_id.clone();
        dst.download_policy = src.download_policy;
        dst.display_policy = src.display_policy;
        dst.web_display_policy = src.web_display_policy;
        dst.applies_to = src.applies_to.clone();
        self.details = other.details.clone();
    }

    /// Take over the backend-assigned fields of an equivalent stored copy:
    /// id, state, timestamps and, per attachment name, attachment ids and
    /// URLs.
    pub fn copy_backend_fields_from(&mut self, stored: &Resource) {
        self.common.id = stored.common.id.clone();
        self.common.state = stored.common.state;
        self.common.created_on = stored.common.created_on;
        self.common.last_updated_on = stored.common.last_updated_on;
        self.common.reviewed_on = stored.common.reviewed_on;
        self.common.wlp_information_version = stored.common.wlp_information_version.clone();
        for attachment in &mut self.attachments {
            if let Some(remote) = stored.attachment(attachment.name()) {
                attachment.adopt_backend_fields(remote.meta());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lars_client::FilterVersion;

    fn filter(product: &str, min: &str) -> AppliesToFilterInfo {
        AppliesToFilterInfo {
            product_id: product.into(),
            min_version: Some(FilterVersion {
                value: min.into(),
                inclusive: true,
                label: None,
            }),
            ..Default::default()
        }
    }

    fn feature(name: &str) -> Resource {
        Resource::new(AssetType::Feature, name).with_provider("Acme")
    }

    #[test]
    fn vanity_url_sanitizes_and_uses_first_min_version() {
        let mut r = feature("web profile/7");
        if let ResourceDetails::Feature(d) = &mut r.details {
            d.applies_to_filter_info = vec![filter("com.acme", "8.5.5.0"), filter("other", "1.0")];
        }
        assert_eq!(r.vanity_url(), "features-web_profile_7-8.5.5.0");
    }

    #[test]
    fn product_vanity_url_uses_product_version() {
        let r = Resource::new(AssetType::Addon, "extended").with_details(ResourceDetails::Product(
            ProductDetails {
                kind: ProductKind::Addon,
                product_id: Some("com.acme".into()),
                product_edition: None,
                product_version: Some("9.0".into()),
                product_install_type: None,
                provide_feature: vec![],
            },
        ));
        assert_eq!(r.vanity_url(), "addons-extended-9.0");
    }

    #[test]
    fn vanity_url_without_version() {
        assert_eq!(Resource::new(AssetType::Tool, "cli").vanity_url(), "tools-cli");
    }

    #[test]
    fn asset_round_trip_keeps_type_specific_fields() {
        let mut r = feature("webProfile").with_version("1.0");
        if let ResourceDetails::Feature(d) = &mut r.details {
            d.provide_feature = vec!["webProfile-7.0".into()];
            d.visibility = Some(Visibility::Public);
        }
        let back = Resource::from_asset(r.to_asset()).unwrap();
        assert_eq!(back.details, r.details);
        assert_eq!(back.common.version.as_deref(), Some("1.0"));
        assert_eq!(back.common.wlp_information_version.as_deref(), Some("1.0"));
    }

    #[test]
    fn newer_schema_major_is_bad_data() {
        let mut asset = feature("x").to_asset();
        asset.wlp_information.wlp_information_version = Some("2.0".into());
        let err = Resource::from_asset(asset).unwrap_err();
        assert_eq!(err.kind(), lars_core::ErrorKind::BadData);

        let mut asset = feature("x").to_asset();
        asset.wlp_information.wlp_information_version = Some("1.3".into());
        assert!(Resource::from_asset(asset).is_ok());
    }

    #[test]
    fn missing_type_is_bad_data() {
        let mut asset = feature("x").to_asset();
        asset.asset_type = None;
        assert!(Resource::from_asset(asset).is_err());
    }

    #[test]
    fn equivalence_ignores_backend_fields() {
        let a = feature("x").with_description("d");
        let mut b = a.clone();
        b.common.id = Some(AssetId::new("1"));
        b.common.state = Some(State::Published);
        b.common.created_on = Some(Utc::now());
        assert!(a.equivalent(&b));

        b.common.description = Some("other".into());
        assert!(!a.equivalent_without_attachments(&b));
    }

    #[test]
    fn update_required_decisions() {
        let candidate = feature("x");
        assert_eq!(candidate.update_required(None), UpdateType::Add);

        let stored = candidate.clone();
        assert_eq!(candidate.update_required(Some(&stored)), UpdateType::Nothing);

        let changed = candidate.clone().with_description("new");
        assert_eq!(changed.update_required(Some(&stored)), UpdateType::Update);

        let mut with_extra = stored.clone();
        with_extra
            .add_attachment(ResourceAttachment::with_bytes(
                "readme",
                AttachmentType::Documentation,
                b"r".to_vec(),
            ))
            .unwrap();
        assert_eq!(candidate.update_required(Some(&with_extra)), UpdateType::Update);
    }

    #[test]
    fn attachment_invariants() {
        let mut r = feature("x");
        r.add_attachment(ResourceAttachment::with_bytes("a", AttachmentType::Content, vec![1]))
            .unwrap();
        let dup = r.add_attachment(ResourceAttachment::with_bytes("a", AttachmentType::Thumbnail, vec![2]));
        assert!(dup.is_err());
        let second_content =
            r.add_attachment(ResourceAttachment::with_bytes("b", AttachmentType::Content, vec![3]));
        assert_eq!(second_content.unwrap_err().kind(), lars_core::ErrorKind::Validation);
        assert!(r.remove_attachment("a").is_some());
        assert!(r.attachments().is_empty());
    }

    #[test]
    fn copy_fields_keeps_identity_and_state() {
        let mut stored = feature("x");
        stored.common.id = Some(AssetId::new("1"));
        stored.common.state = Some(State::Published);
        let candidate = feature("x").with_description("new text");
        stored.copy_fields_from(&candidate);
        assert_eq!(stored.common.description.as_deref(), Some("new text"));
        assert_eq!(stored.id(), Some(&AssetId::new("1")));
        assert_eq!(stored.state(), Some(State::Published));
    }

    #[test]
    fn web_visibility_defaults_to_visible() {
        let mut r = feature("x");
        assert!(r.is_web_visible());
        r.common.web_display_policy = Some(DisplayPolicy::Hidden);
        assert!(!r.is_web_visible());
    }
}
