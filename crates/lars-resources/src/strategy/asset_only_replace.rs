use lars_core::{Action, RepoError, State};

use super::UploadStrategy;
use crate::repository::Repository;
use crate::resource::Resource;

/// Replace the first match's fields, leaving its attachments alone, and
/// return it to the state it was in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetOnlyReplace;

impl UploadStrategy for AssetOnlyReplace {
    fn upload_asset(
        &mut self,
        repo: &Repository,
        candidate: &mut Resource,
        matching: &[Resource],
    ) -> Result<(), RepoError> {
        let first = matching.first().ok_or_else(|| {
            RepoError::validation(format!(
                "no existing resource matches {}; nothing to replace",
                candidate.name()
            ))
        })?;
        let original_state = first.state();

        let mut merged = first.clone();
        if original_state == Some(State::Published) {
            repo.perform_action(&mut merged, Action::Unpublish)?;
        }
        merged.copy_fields_from(candidate);
        repo.update_resource(&mut merged)?;
        if let Some(state) = original_state {
            repo.move_to_state(&mut merged, state)?;
        }

        *candidate = merged;
        Ok(())
    }
}
