//! # lars-resources: Asset Resources and Upload Reconciliation
//!
//! The client core: typed resources, duplicate matching, lifecycle driving,
//! attachment synchronization and the strategies that reconcile an upload
//! with what the repository already holds.
//!
//! ## Contents
//!
//! - **Resources** (`resource.rs`, `attachment.rs`): `Resource` with shared
//!   `CommonFields`, a per-type `ResourceDetails` block, and
//!   `ResourceAttachment`s carrying optional local content. Equivalence
//!   ignores backend-assigned fields.
//! - **Matching** (`matching.rs`): the `MatchKey` identity of a resource.
//! - **Repository** (`repository.rs`): resource-level operations over a
//!   `RepositoryBackend`, including `move_to_state` and attachment copy.
//! - **Strategies** (`strategy/`): Add-New, Add-Then-Delete,
//!   Update-In-Place, Asset-Only-Replace and Add-Then-Hide-Old.
//! - **Vanity cache** (`vanity.rs`): which resource is visible at each
//!   vanity URL.
//! - **Product matching** (`product.rs`): whether a resource applies to an
//!   installed product.
//!
//! ## Concurrency
//!
//! Everything here blocks. A `Repository` is cheap to clone and can be
//! used from many threads; mutating a `Resource` takes `&mut`, so one
//! resource is never modified concurrently. The vanity cache is the only
//! shared mutable state.

pub mod attachment;
pub mod matching;
pub mod product;
pub mod repository;
pub mod resource;
pub mod strategy;
pub mod vanity;

pub use attachment::{attachments_equivalent, AttachmentContent, ResourceAttachment, UpdateType};
pub use matching::{create_matching_data, MatchKey};
pub use product::{compare_versions, MatchResult, ProductDefinition};
pub use repository::{Listing, Repository, RepositoryOptions};
pub use resource::{
    Capability, CommonFields, ContentDetails, ContentKind, FeatureDetails, IfixDetails,
    ProductDetails, ProductKind, Resource, ResourceDetails, SampleDetails, SampleKind,
};
pub use strategy::{
    AddNew, AddThenDelete, AddThenHideOld, AssetOnlyReplace, TargetStates, UpdateInPlace,
    UploadStrategy,
};
pub use vanity::{VanityCacheGuard, VanityUrlCache};
