//! # lars-client: Asset Repository Backend Contract
//!
//! The boundary between the client core and the repository service.
//!
//! ## Contents
//!
//! - **Wire documents** (`types.rs`): `Asset`, `Attachment` and the
//!   enumerations the service uses, as serde types.
//! - **Contract** (`backend.rs`): the blocking `RepositoryBackend` trait.
//! - **HTTP backend** (`http.rs`): `HttpBackend` over `reqwest::blocking`,
//!   with transport retry (`retry.rs`) and configuration (`config.rs`).
//! - **In-memory backend** (`memory.rs`): `MemoryBackend`, used by tests and
//!   offline tooling; enforces the same lifecycle rules as the service and
//!   records every call.
//!
//! ## Crate Policy
//!
//! - Depends on `lars-core` and `lars-state` only.
//! - Every backend is `Send + Sync` and meant to be shared via `Arc`.

pub mod backend;
pub mod config;
pub mod http;
pub mod memory;
mod retry;
pub mod types;

pub use backend::RepositoryBackend;
pub use config::{ConfigError, RepositoryConfig};
pub use http::HttpBackend;
pub use memory::{BackendCall, MemoryBackend, Operation};
pub use types::{
    AppliesToFilterInfo, Asset, AssetType, Attachment, AttachmentPayload, AttachmentType,
    DisplayPolicy, DownloadPolicy, FilterVersion, InstallPolicy, LicenseType, LinkType, Provider,
    Visibility, WlpInformation,
};
