//! # Error Types: Unified Repository Error
//!
//! Every fallible operation in the workspace returns [`RepoError`]. Instead
//! of one error type per failure mode, the error carries an [`ErrorKind`]
//! and the ids of the asset and attachment it concerns, so tooling running a
//! batch can always report which asset failed.
//!
//! ## Design
//!
//! - Validation and lifecycle errors are raised before any backend call.
//! - Backend errors distinguish not-found, transport failure and rejection.
//! - Bad data (a document this client does not understand) is its own kind
//!   so bulk listings can skip the one bad document.
//! - Lifecycle errors carry a [`LifecycleError`] naming the state and the
//!   attempted action.

use thiserror::Error;

use crate::identity::{AssetId, AttachmentId};
use crate::lifecycle::{Action, State};

/// Category of a [`RepoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input detected before any backend call.
    Validation,
    /// Transport-level failure talking to the backend.
    BackendIo,
    /// The backend answered but refused the request.
    BackendRejected,
    /// The requested asset or attachment does not exist.
    NotFound,
    /// The backend returned a document this client does not understand.
    BadData,
    /// Illegal state/action combination or non-converging state move.
    Lifecycle,
    /// Adding an asset or attachment failed.
    Creation,
    /// Updating an asset or attachment failed.
    Update,
    /// Deleting an asset or attachment failed.
    Deletion,
    /// The catalog holds contradictory data (e.g. two visible assets on one URL).
    Consistency,
}

impl ErrorKind {
    /// Whether this kind originates in the backend transport or server.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::BackendIo | Self::BackendRejected | Self::NotFound)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::BackendIo => "backend I/O",
            Self::BackendRejected => "backend rejection",
            Self::NotFound => "not found",
            Self::BadData => "bad data",
            Self::Lifecycle => "lifecycle",
            Self::Creation => "creation",
            Self::Update => "update",
            Self::Deletion => "deletion",
            Self::Consistency => "consistency",
        };
        f.write_str(s)
    }
}

/// Failure of the lifecycle state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The action is not legal from the current state.
    #[error("action {action} is not allowed in state {state}")]
    IllegalTransition {
        /// State the asset was in.
        state: State,
        /// Action that was attempted.
        action: Action,
    },

    /// No action leads from `from` towards `target`.
    #[error("state {target} cannot be reached from state {from}")]
    Unreachable {
        /// Current state.
        from: State,
        /// Requested state.
        target: State,
    },

    /// The state move did not converge within the configured bound.
    #[error("unable to move from {state} to {target} after {steps} transitions")]
    NotConverged {
        /// State the asset was left in.
        state: State,
        /// Requested state.
        target: State,
        /// Number of transitions performed.
        steps: usize,
    },

    /// The asset carries no state (never persisted).
    #[error("asset has no lifecycle state")]
    NoState,
}

/// The single error type of the repository client.
#[derive(Error, Debug)]
#[error("{kind} error{}: {message}", describe_target(.resource_id, .attachment_id))]
pub struct RepoError {
    kind: ErrorKind,
    resource_id: Option<AssetId>,
    attachment_id: Option<AttachmentId>,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

fn describe_target(resource: &Option<AssetId>, attachment: &Option<AttachmentId>) -> String {
    match (resource, attachment) {
        (Some(r), Some(a)) => format!(" for asset {r} attachment {a}"),
        (Some(r), None) => format!(" for asset {r}"),
        (None, Some(a)) => format!(" for attachment {a}"),
        (None, None) => String::new(),
    }
}

impl RepoError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            resource_id: None,
            attachment_id: None,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the id of the asset concerned. `None` means not yet assigned.
    pub fn for_resource(mut self, id: Option<AssetId>) -> Self {
        self.resource_id = id;
        self
    }

    /// Attach the id of the attachment concerned.
    pub fn for_attachment(mut self, id: Option<AttachmentId>) -> Self {
        self.attachment_id = id;
        self
    }

    /// Record the underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn backend_io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendIo, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendRejected, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn bad_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadData, message)
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Consistency, message)
    }

    /// Lifecycle failure for the given asset.
    pub fn lifecycle(resource_id: Option<AssetId>, error: LifecycleError) -> Self {
        Self::new(ErrorKind::Lifecycle, error.to_string())
            .for_resource(resource_id)
            .with_source(error)
    }

    /// Wrap a lower-level error as a creation/update/deletion failure.
    ///
    /// The resource id of `cause` is kept unless `resource_id` is given.
    pub fn wrap(kind: ErrorKind, resource_id: Option<AssetId>, cause: RepoError) -> Self {
        let resource_id = resource_id.or_else(|| cause.resource_id.clone());
        let attachment_id = cause.attachment_id.clone();
        let message = match kind {
            ErrorKind::Creation => "failed to create",
            ErrorKind::Update => "failed to update",
            ErrorKind::Deletion => "failed to delete",
            _ => "operation failed",
        };
        Self::new(kind, message)
            .for_resource(resource_id)
            .for_attachment(attachment_id)
            .with_source(cause)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn resource_id(&self) -> Option<&AssetId> {
        self.resource_id.as_ref()
    }

    pub fn attachment_id(&self) -> Option<&AttachmentId> {
        self.attachment_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The structured lifecycle failure, if this error (or a wrapped cause)
    /// is a lifecycle error.
    pub fn lifecycle_error(&self) -> Option<&LifecycleError> {
        let source = self.source.as_deref()?;
        if let Some(lifecycle) = source.downcast_ref::<LifecycleError>() {
            return Some(lifecycle);
        }
        source
            .downcast_ref::<RepoError>()
            .and_then(RepoError::lifecycle_error)
    }

    /// The kind of the innermost wrapped [`RepoError`], or this error's kind.
    pub fn root_kind(&self) -> ErrorKind {
        self.source
            .as_deref()
            .and_then(|s| s.downcast_ref::<RepoError>())
            .map_or(self.kind, RepoError::root_kind)
    }
}
