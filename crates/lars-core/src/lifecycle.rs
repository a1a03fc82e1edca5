//! # Lifecycle Vocabulary
//!
//! The publication workflow every asset goes through:
//!
//! ```text
//! DRAFT ──publish──▶ AWAITING_APPROVAL ──approve──▶ PUBLISHED
//!   ▲                   │         │                    │
//!   └──────cancel───────┘   need_more_info             │
//!   │                             ▼                    │
//!   │                      NEED_MORE_INFO ──publish──▶ AWAITING_APPROVAL
//!   └──────────────────────unpublish───────────────────┘
//! ```
//!
//! Only the names live here. Which (state, action) pairs are legal is
//! defined by the tables in `lars-state`.

use serde::{Deserialize, Serialize};

/// Publication state of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// Editable, not visible to consumers.
    Draft,
    /// Submitted and waiting for a reviewer.
    AwaitingApproval,
    /// Sent back to the submitter by a reviewer.
    NeedMoreInfo,
    /// Approved and publicly visible.
    Published,
}

/// A state-changing request sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Submit for approval.
    Publish,
    /// Reviewer approves the submission.
    Approve,
    /// Withdraw a submission back to draft.
    Cancel,
    /// Reviewer asks the submitter for more information.
    NeedMoreInfo,
    /// Withdraw a published asset back to draft.
    Unpublish,
}

impl State {
    /// All states, in workflow order.
    pub const ALL: [State; 4] = [
        State::Draft,
        State::AwaitingApproval,
        State::NeedMoreInfo,
        State::Published,
    ];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::AwaitingApproval => "AWAITING_APPROVAL",
            Self::NeedMoreInfo => "NEED_MORE_INFO",
            Self::Published => "PUBLISHED",
        }
    }

    /// Parse a canonical name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name))
    }
}

impl Action {
    /// All actions.
    pub const ALL: [Action; 5] = [
        Action::Publish,
        Action::Approve,
        Action::Cancel,
        Action::NeedMoreInfo,
        Action::Unpublish,
    ];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "PUBLISH",
            Self::Approve => "APPROVE",
            Self::Cancel => "CANCEL",
            Self::NeedMoreInfo => "NEED_MORE_INFO",
            Self::Unpublish => "UNPUBLISH",
        }
    }

    /// Name used on the wire (`{"action": "publish"}`).
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Approve => "approve",
            Self::Cancel => "cancel",
            Self::NeedMoreInfo => "need_more_info",
            Self::Unpublish => "unpublish",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
