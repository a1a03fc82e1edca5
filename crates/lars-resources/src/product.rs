//! # Product Definition Matching
//!
//! Decides whether a resource applies to an installed product, using the
//! resource's parsed applies-to filters.
//!
//! Versions compare numerically segment by segment (`8.5.5.10` is newer than
//! `8.5.5.9`); missing trailing segments count as zero. A segment that is
//! not a number compares by its leading digits, then as text.

use std::cmp::Ordering;

use lars_client::{AppliesToFilterInfo, FilterVersion, LicenseType};

use crate::resource::Resource;

/// An installed product a resource may apply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDefinition {
    pub id: String,
    pub version: String,
    pub install_type: Option<String>,
    pub license_type: Option<LicenseType>,
    pub edition: Option<String>,
}

/// Outcome of [`Resource::matches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchResult {
    Matched,
    /// No filter names this product.
    NotApplicable,
    InvalidVersion,
    InvalidEdition,
    InvalidInstallType,
    InvalidLicense,
}

impl Resource {
    /// Evaluate this resource against a product definition.
    ///
    /// A resource without applies-to filters matches everything. Otherwise
    /// the first filter for the product that accepts it yields `Matched`;
    /// if none does, the first filter's rejection reason is returned.
    pub fn matches(&self, product: &ProductDefinition) -> MatchResult {
        let filters = self.details.capability().applies_to_filter_info();
        if filters.is_empty() {
            return MatchResult::Matched;
        }

        let mut first_failure = None;
        for filter in filters.iter().filter(|f| f.product_id == product.id) {
            match evaluate(filter, product) {
                MatchResult::Matched => return self.check_license(product),
                failure => {
                    first_failure.get_or_insert(failure);
                }
            }
        }
        first_failure.unwrap_or(MatchResult::NotApplicable)
    }

    fn check_license(&self, product: &ProductDefinition) -> MatchResult {
        match (self.common.license_type, product.license_type) {
            (Some(required), Some(installed)) if required != installed => MatchResult::InvalidLicense,
            _ => MatchResult::Matched,
        }
    }
}

fn evaluate(filter: &AppliesToFilterInfo, product: &ProductDefinition) -> MatchResult {
    if !version_in_range(&product.version, filter.min_version.as_ref(), filter.max_version.as_ref()) {
        return MatchResult::InvalidVersion;
    }
    if let Some(edition) = &product.edition {
        if !filter.editions.is_empty() && !filter.editions.iter().any(|e| e == edition) {
            return MatchResult::InvalidEdition;
        }
    }
    if let (Some(wanted), Some(actual)) = (&filter.install_type, &product.install_type) {
        if wanted != actual {
            return MatchResult::InvalidInstallType;
        }
    }
    MatchResult::Matched
}

fn version_in_range(version: &str, min: Option<&FilterVersion>, max: Option<&FilterVersion>) -> bool {
    if let Some(min) = min {
        match compare_versions(version, &min.value) {
            Ordering::Less => return false,
            Ordering::Equal if !min.inclusive => return false,
            _ => {}
        }
    }
    if let Some(max) = max {
        match compare_versions(version, &max.value) {
            Ordering::Greater => return false,
            Ordering::Equal if !max.inclusive => return false,
            _ => {}
        }
    }
    true
}

/// Compare dotted version strings segment by segment.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a: Vec<&str> = a.split('.').collect();
    let b: Vec<&str> = b.split('.').collect();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or("0");
        let y = b.get(i).copied().unwrap_or("0");
        let ord = compare_segment(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn compare_segment(x: &str, y: &str) -> Ordering {
    fn leading_number(s: &str) -> Option<u64> {
        let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
    match (leading_number(x), leading_number(y)) {
        (Some(m), Some(n)) if m != n => m.cmp(&n),
        _ => x.cmp(y),
    }
}
