//! # Vanity Subcommand
//!
//! - `vanity lookup <URL>` prints the resource visible at a vanity URL.
//! - `vanity check` rebuilds the cache from the repository, failing if two
//!   published resources are visible at the same URL.

use anyhow::Result;
use clap::{Args, Subcommand};

use lars_resources::{Repository, VanityUrlCache};

use crate::resource::summary_line;

/// Arguments for `lars vanity`.
#[derive(Args, Debug)]
pub struct VanityArgs {
    #[command(subcommand)]
    pub command: VanityCommand,
}

#[derive(Subcommand, Debug)]
pub enum VanityCommand {
    /// Show the resource visible at a vanity URL.
    Lookup {
        /// Relative vanity URL, e.g. `features-JSON_Processing-1.0`.
        url: String,
    },
    /// Verify that every vanity URL has at most one visible resource.
    Check,
}

pub fn run_vanity(args: &VanityArgs, repo: &Repository, cache: &VanityUrlCache) -> Result<u8> {
    match &args.command {
        VanityCommand::Lookup { url } => match cache.get(repo, url)? {
            Some(resource) => {
                println!("{}", summary_line(&resource));
                Ok(0)
            }
            None => {
                eprintln!("nothing visible at {url}");
                Ok(2)
            }
        },
        VanityCommand::Check => {
            cache.refresh(repo)?;
            let entries = cache.lock(repo)?.len();
            println!("{entries} vanity URLs, no conflicts");
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lars_client::{AssetType, MemoryBackend};
    use lars_core::State;
    use lars_resources::{AddNew, Resource, TargetStates};

    fn publish(repo: &Repository, provider: &str) -> Resource {
        let mut r = Resource::new(AssetType::Feature, "F").with_provider(provider);
        repo.upload(&mut r, &mut AddNew::new(TargetStates::always(State::Published)))
            .unwrap();
        r
    }

    #[test]
    fn lookup_finds_published_resource() {
        let repo = Repository::new(Arc::new(MemoryBackend::new()));
        let r = publish(&repo, "P");
        let cache = VanityUrlCache::new();

        let found = VanityArgs {
            command: VanityCommand::Lookup { url: r.vanity_url() },
        };
        assert_eq!(run_vanity(&found, &repo, &cache).unwrap(), 0);

        let missing = VanityArgs {
            command: VanityCommand::Lookup { url: "features-none".into() },
        };
        assert_eq!(run_vanity(&missing, &repo, &cache).unwrap(), 2);
    }

    #[test]
    fn check_reports_conflicts() {
        let repo = Repository::new(Arc::new(MemoryBackend::new()));
        publish(&repo, "P1");
        let cache = VanityUrlCache::new();
        let check = VanityArgs {
            command: VanityCommand::Check,
        };
        assert_eq!(run_vanity(&check, &repo, &cache).unwrap(), 0);

        publish(&repo, "P2");
        assert!(run_vanity(&check, &repo, &cache).is_err());
    }
}
