use lars_core::RepoError;

use super::{TargetStates, UploadStrategy};
use crate::repository::Repository;
use crate::resource::Resource;

/// Always add the candidate as a new resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddNew {
    pub targets: TargetStates,
}

impl AddNew {
    pub fn new(targets: TargetStates) -> Self {
        Self { targets }
    }
}

impl UploadStrategy for AddNew {
    fn upload_asset(
        &mut self,
        repo: &Repository,
        candidate: &mut Resource,
        matching: &[Resource],
    ) -> Result<(), RepoError> {
        let target = self.targets.calculate(matching.first());
        repo.copy_attachment_content(candidate)?;
        candidate.reset_id();
        repo.add_resource(candidate)?;
        repo.move_to_state(candidate, target)
    }
}
