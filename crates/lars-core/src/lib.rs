//! # lars-core: Foundational Types for the Asset Repository Client
//!
//! Every other crate in the workspace depends on `lars-core`; it depends on
//! nothing internal.
//!
//! ## Contents
//!
//! - **Identifiers** (`identity.rs`): `AssetId` and `AttachmentId` newtypes.
//!   Ids are minted by the repository backend, never by the client, so they
//!   are opaque strings rather than UUIDs.
//!
//! - **Lifecycle vocabulary** (`lifecycle.rs`): the four asset `State`s and
//!   the five `Action`s that move an asset between them. The transition
//!   tables themselves live in `lars-state`.
//!
//! - **Errors** (`error.rs`): a single `RepoError` carrying an `ErrorKind`,
//!   the id of the asset (and attachment) it concerns, and the underlying
//!   cause. Lifecycle failures carry a structured `LifecycleError`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lars-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod lifecycle;

pub use error::{ErrorKind, LifecycleError, RepoError};
pub use identity::{AssetId, AttachmentId};
pub use lifecycle::{Action, State};
