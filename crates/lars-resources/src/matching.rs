//! Duplicate detection: the identity of a resource as far as uploads are
//! concerned.

use lars_client::AssetType;

use crate::resource::Resource;

/// Fingerprint of a resource. Two resources with equal keys are treated as
/// versions of the same logical asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    pub name: String,
    pub provider: Option<String>,
    pub asset_type: AssetType,
    /// Type-specific identity fields.
    pub extra: Vec<String>,
}

/// Compute the matching key of a resource.
pub fn create_matching_data(resource: &Resource) -> MatchKey {
    MatchKey {
        name: resource.name().to_string(),
        provider: resource.provider_name().map(str::to_string),
        asset_type: resource.asset_type(),
        extra: resource.details.capability().matching_extra(),
    }
}
