use lars_core::{Action, ErrorKind, RepoError, State};

use super::{TargetStates, UploadStrategy};
use crate::attachment::UpdateType;
use crate::repository::Repository;
use crate::resource::Resource;

/// Update the first match where it stands.
///
/// A published match is unpublished before anything is written to it, so
/// content changes never land on a published resource. Core fields are
/// merged over the match when they changed; each attachment is added,
/// updated or left alone on its own merits, and attachments the candidate
/// no longer has are deleted. With no match the candidate is added.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateInPlace {
    pub targets: TargetStates,
    pub force_replace: bool,
}

impl UpdateInPlace {
    pub fn new(targets: TargetStates) -> Self {
        Self {
            targets,
            force_replace: false,
        }
    }

    pub fn force_replace(mut self, force: bool) -> Self {
        self.force_replace = force;
        self
    }
}

impl UploadStrategy for UpdateInPlace {
    fn upload_asset(
        &mut self,
        repo: &Repository,
        candidate: &mut Resource,
        matching: &[Resource],
    ) -> Result<(), RepoError> {
        let Some(first) = matching.first() else {
            repo.copy_attachment_content(candidate)?;
            candidate.reset_id();
            repo.add_resource(candidate)?;
            return repo.move_to_state(candidate, self.targets.calculate(None));
        };
        let target = self.targets.calculate(Some(first));

        // Hosted content is fetched before the match is touched.
        let owner = candidate.id().cloned();
        for attachment in candidate.attachments_mut() {
            if attachment.update_required(Some(first)) != UpdateType::Nothing {
                repo.copy_hosted_content(owner.as_ref(), attachment)?;
            }
        }

        let mut existing = first.clone();
        if existing.state() == Some(State::Published) {
            repo.perform_action(&mut existing, Action::Unpublish)?;
        }

        if self.force_replace || candidate.update_required(Some(&existing)) != UpdateType::Nothing {
            let mut merged = existing.clone();
            merged.copy_fields_from(candidate);
            repo.update_resource(&mut merged)?;
        }

        let Some(id) = existing.id().cloned() else {
            return Err(RepoError::validation("matching resource has no id"));
        };
        candidate.common.id = Some(id.clone());

        for attachment in candidate.attachments_mut() {
            let remote = existing.attachment(attachment.name());
            let written = match (attachment.update_required(Some(&existing)), remote) {
                (UpdateType::Nothing, Some(remote)) => {
                    attachment.adopt_backend_fields(remote.meta());
                    Ok(())
                }
                (UpdateType::Update, Some(remote)) => match remote.meta().id.as_ref() {
                    Some(remote_id) => repo.update_attachment(&id, remote_id, attachment),
                    None => repo.add_attachment(&id, attachment),
                },
                _ => repo.add_attachment(&id, attachment),
            };
            written.map_err(|e| RepoError::wrap(ErrorKind::Update, Some(id.clone()), e))?;
        }

        for stale in existing
            .attachments()
            .iter()
            .filter(|a| candidate.attachment(a.name()).is_none())
        {
            if let Some(stale_id) = &stale.meta().id {
                repo.backend()
                    .delete_attachment(&id, stale_id)
                    .map_err(|e| RepoError::wrap(ErrorKind::Deletion, Some(id.clone()), e))?;
                tracing::debug!(asset_id = %id, attachment = stale.name(), "deleted stale attachment");
            }
        }

        repo.refresh(candidate)?;
        repo.move_to_state(candidate, target)
    }
}
