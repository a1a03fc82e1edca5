use std::collections::HashSet;
use std::sync::Arc;

use lars_client::DisplayPolicy;
use lars_core::{AssetId, RepoError};

use super::{AddThenDelete, TargetStates, UploadStrategy};
use crate::repository::Repository;
use crate::resource::Resource;
use crate::vanity::{is_visible_published, VanityUrlCache};

/// Add-Then-Delete, then make the new resource the only one visible at its
/// vanity URL.
///
/// If another published resource (one this upload did not delete) is
/// visible at the same URL, it is re-fetched, marked hidden on the web and
/// replaced by a hidden copy through a forced Add-Then-Delete.
#[derive(Debug)]
pub struct AddThenHideOld {
    inner: AddThenDelete,
    cache: Arc<VanityUrlCache>,
}

impl AddThenHideOld {
    pub fn new(targets: TargetStates, cache: Arc<VanityUrlCache>) -> Self {
        Self {
            inner: AddThenDelete::new(targets),
            cache,
        }
    }

    pub fn force_replace(mut self, force: bool) -> Self {
        self.inner = self.inner.force_replace(force);
        self
    }

    /// Resources deleted by uploads through this strategy, including
    /// visible resources replaced by hidden copies.
    pub fn deleted_resources(&self) -> &[Resource] {
        self.inner.deleted_resources()
    }
}

impl UploadStrategy for AddThenHideOld {
    fn upload_asset(
        &mut self,
        repo: &Repository,
        candidate: &mut Resource,
        matching: &[Resource],
    ) -> Result<(), RepoError> {
        let mut cache = self.cache.lock(repo)?;
        let already_deleted = self.inner.deleted_resources().len();
        self.inner.upload_asset(repo, candidate, matching)?;

        let deleted: HashSet<AssetId> = self.inner.deleted_resources()[already_deleted..]
            .iter()
            .filter_map(|r| r.id().cloned())
            .collect();
        cache.evict(&deleted);

        if !is_visible_published(candidate) {
            return Ok(());
        }
        let url = candidate.vanity_url();

        let previous = cache.get(&url).and_then(|r| r.id().cloned()).filter(|id| {
            Some(id) != candidate.id() && !deleted.contains(id)
        });
        if let Some(previous_id) = previous {
            let mut old = repo.get_resource(&previous_id)?;
            old.common.web_display_policy = Some(DisplayPolicy::Hidden);
            tracing::info!(
                asset_id = %previous_id,
                vanity_url = %url,
                "hiding previously visible resource"
            );
            let snapshot = old.clone();
            let mut hide = AddThenDelete::new(TargetStates::default()).force_replace(true);
            hide.upload_asset(repo, &mut old, std::slice::from_ref(&snapshot))?;
            self.inner.record_deleted(hide.deleted_resources());
        }

        cache.insert(url, candidate.clone());
        Ok(())
    }
}
