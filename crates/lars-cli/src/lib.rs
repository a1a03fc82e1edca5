//! # lars-cli: Asset Repository Command-Line Client
//!
//! Thin clap front end over `lars-resources`. Connection settings come from
//! the environment (see `RepositoryConfig::from_env`).
//!
//! ## Subcommands
//!
//! - `upload`: upload a resource descriptor with a reconciliation strategy
//! - `move` / `action`: drive an asset through its lifecycle
//! - `get`, `list`, `matches`, `applies`, `delete`: inspect and remove assets
//! - `vanity`: look up or verify the vanity URL cache
//!
//! Handlers take a `Repository` so they run unchanged against the
//! in-memory backend. Results go to stdout; logs go to stderr.

pub mod descriptor;
pub mod lifecycle;
pub mod resource;
pub mod upload;
pub mod vanity;
