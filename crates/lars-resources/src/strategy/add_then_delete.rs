use lars_core::RepoError;

use super::{TargetStates, UploadStrategy};
use crate::attachment::UpdateType;
use crate::repository::Repository;
use crate::resource::Resource;

/// Replace matches with a fresh copy of the candidate.
///
/// When anything changed (or `force_replace` is set) the candidate is added
/// as a new resource, moved to its target state, and every match is deleted.
/// When nothing changed the first match is kept, the candidate takes over
/// its backend fields and moves to the target state, and any further
/// duplicates are deleted.
#[derive(Debug, Clone, Default)]
pub struct AddThenDelete {
    pub targets: TargetStates,
    pub force_replace: bool,
    deleted: Vec<Resource>,
}

impl AddThenDelete {
    pub fn new(targets: TargetStates) -> Self {
        Self {
            targets,
            force_replace: false,
            deleted: Vec::new(),
        }
    }

    pub fn force_replace(mut self, force: bool) -> Self {
        self.force_replace = force;
        self
    }

    /// Resources deleted by uploads through this strategy, in order.
    pub fn deleted_resources(&self) -> &[Resource] {
        &self.deleted
    }

    pub(crate) fn record_deleted(&mut self, resources: &[Resource]) {
        self.deleted.extend_from_slice(resources);
    }

    fn delete_all(&mut self, repo: &Repository, resources: &[Resource]) -> Result<(), RepoError> {
        for resource in resources {
            repo.delete_resource(resource)?;
            self.deleted.push(resource.clone());
        }
        Ok(())
    }
}

impl UploadStrategy for AddThenDelete {
    fn upload_asset(
        &mut self,
        repo: &Repository,
        candidate: &mut Resource,
        matching: &[Resource],
    ) -> Result<(), RepoError> {
        let first = matching.first();
        let target = self.targets.calculate(first);
        let update = candidate.update_required(first);

        match first {
            Some(existing) if !self.force_replace && update == UpdateType::Nothing => {
                tracing::debug!(
                    asset_id = ?existing.id(),
                    duplicates = matching.len() - 1,
                    "resource unchanged, keeping existing copy"
                );
                candidate.copy_backend_fields_from(existing);
                repo.move_to_state(candidate, target)?;
                self.delete_all(repo, &matching[1..])
            }
            _ => {
                repo.copy_attachment_content(candidate)?;
                candidate.reset_id();
                repo.add_resource(candidate)?;
                repo.move_to_state(candidate, target)?;
                self.delete_all(repo, matching)
            }
        }
    }
}
