//! # Vanity-URL Visibility Cache
//!
//! Maps each vanity URL to the one published, web-visible resource shown
//! there. Built once per process and shared via `Arc`; populated lazily on
//! first use and rebuilt on [`VanityUrlCache::refresh`].
//!
//! One mutex guards the whole map. [`VanityUrlCache::lock`] hands out the
//! guard so a caller can populate, read, check and write under a single
//! critical section.

use std::collections::{HashMap, HashSet};

use parking_lot::{Mutex, MutexGuard};

use lars_core::{AssetId, RepoError, State};

use crate::repository::Repository;
use crate::resource::Resource;

#[derive(Debug, Default)]
struct CacheState {
    populated: bool,
    entries: HashMap<String, Resource>,
}

/// Process-wide map from vanity URL to the visible resource.
#[derive(Debug, Default)]
pub struct VanityUrlCache {
    state: Mutex<CacheState>,
}

/// Exclusive access to a populated cache.
#[derive(Debug)]
pub struct VanityCacheGuard<'a> {
    state: MutexGuard<'a, CacheState>,
}

impl VanityUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the cache, populating it first if needed.
    pub fn lock(&self, repo: &Repository) -> Result<VanityCacheGuard<'_>, RepoError> {
        let mut state = self.state.lock();
        if !state.populated {
            state.entries = build(repo)?;
            state.populated = true;
        }
        Ok(VanityCacheGuard { state })
    }

    /// Rebuild from the repository. The current contents are kept if the
    /// rebuild fails.
    pub fn refresh(&self, repo: &Repository) -> Result<(), RepoError> {
        let mut state = self.state.lock();
        let fresh = build(repo)?;
        state.entries = fresh;
        state.populated = true;
        Ok(())
    }

    /// Drop every entry; the next use repopulates.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.populated = false;
    }

    /// Resource currently visible at `url`.
    pub fn get(&self, repo: &Repository, url: &str) -> Result<Option<Resource>, RepoError> {
        Ok(self.lock(repo)?.get(url).cloned())
    }

    pub fn is_populated(&self) -> bool {
        self.state.lock().populated
    }
}

impl VanityCacheGuard<'_> {
    pub fn get(&self, url: &str) -> Option<&Resource> {
        self.state.entries.get(url)
    }

    pub fn insert(&mut self, url: String, resource: Resource) {
        self.state.entries.insert(url, resource);
    }

    pub fn remove(&mut self, url: &str) -> Option<Resource> {
        self.state.entries.remove(url)
    }

    /// Remove every entry naming one of `ids`.
    pub fn evict(&mut self, ids: &HashSet<AssetId>) {
        self.state
            .entries
            .retain(|_, r| r.id().map_or(true, |id| !ids.contains(id)));
    }

    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }
}

/// Should `resource` occupy its vanity URL?
pub(crate) fn is_visible_published(resource: &Resource) -> bool {
    resource.state() == Some(State::Published) && resource.is_web_visible()
}

fn build(repo: &Repository) -> Result<HashMap<String, Resource>, RepoError> {
    let mut scratch: HashMap<String, Resource> = HashMap::new();
    for resource in repo.get_all_resources(None)?.resources {
        if !is_visible_published(&resource) {
            continue;
        }
        let url = resource.vanity_url();
        if let Some(existing) = scratch.get(&url) {
            return Err(RepoError::consistency(format!(
                "resources {} and {} are both visible at vanity URL {url}",
                describe(existing),
                describe(&resource)
            ))
            .for_resource(resource.id().cloned()));
        }
        scratch.insert(url, resource);
    }
    tracing::debug!(entries = scratch.len(), "vanity URL cache built");
    Ok(scratch)
}

fn describe(resource: &Resource) -> String {
    resource
        .id()
        .map_or_else(|| "<unsaved>".to_string(), ToString::to_string)
}
