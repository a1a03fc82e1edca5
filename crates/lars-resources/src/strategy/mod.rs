//! # Upload Reconciliation Strategies
//!
//! A strategy decides what uploading a candidate resource does to the
//! resources already stored under the same identity.
//!
//! | Strategy | Effect on existing matches |
//! |---|---|
//! | [`AddNew`] | ignored; a new resource is always added |
//! | [`AddThenDelete`] | replaced by a fresh copy when anything changed, duplicates removed |
//! | [`UpdateInPlace`] | first match updated field by field and attachment by attachment |
//! | [`AssetOnlyReplace`] | first match's fields replaced, attachments untouched |
//! | [`AddThenHideOld`] | as Add-Then-Delete, then any other resource visible at the same vanity URL is hidden |
//!
//! Every strategy ends by moving the resource to its target state (see
//! [`TargetStates`]), except Asset-Only-Replace which restores the match's
//! original state.

mod add_new;
mod add_then_delete;
mod add_then_hide_old;
mod asset_only_replace;
mod update_in_place;

pub use add_new::AddNew;
pub use add_then_delete::AddThenDelete;
pub use add_then_hide_old::AddThenHideOld;
pub use asset_only_replace::AssetOnlyReplace;
pub use update_in_place::UpdateInPlace;

use lars_core::{RepoError, State};

use crate::repository::Repository;
use crate::resource::Resource;

/// How a candidate resource is reconciled with what the repository holds.
pub trait UploadStrategy {
    /// Upload `candidate` given its `matching` resources (earliest first).
    /// On success the candidate reflects what was persisted.
    fn upload_asset(
        &mut self,
        repo: &Repository,
        candidate: &mut Resource,
        matching: &[Resource],
    ) -> Result<(), RepoError>;

    /// The stored resources `candidate` would replace or update.
    fn find_matching_resources(
        &self,
        repo: &Repository,
        candidate: &Resource,
    ) -> Result<Vec<Resource>, RepoError> {
        repo.find_matching_resources(candidate)
    }
}

/// Lifecycle state an uploaded resource should end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetStates {
    /// Target when a match exists. `None` keeps the match's current state.
    pub if_matching: Option<State>,
    /// Target when nothing matched.
    pub no_match: State,
}

impl Default for TargetStates {
    fn default() -> Self {
        Self {
            if_matching: None,
            no_match: State::Draft,
        }
    }
}

impl TargetStates {
    /// Fixed target regardless of matches.
    pub fn always(state: State) -> Self {
        Self {
            if_matching: Some(state),
            no_match: state,
        }
    }

    pub fn calculate(&self, first_match: Option<&Resource>) -> State {
        match first_match {
            Some(existing) => self
                .if_matching
                .or(existing.state())
                .unwrap_or(self.no_match),
            None => self.no_match,
        }
    }
}
