//! # Upload Subcommand
//!
//! `lars upload <DESCRIPTOR> [--attach TYPE=PATH]... [--strategy S]`
//!
//! Builds a resource from a descriptor and local files, finds what the
//! repository already holds under the same identity, and reconciles the two
//! with the chosen strategy. Prints the resulting id, state and vanity URL,
//! followed by one `deleted <id>` line per replaced resource.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, ValueEnum};

use lars_resources::{
    AddNew, AddThenDelete, AddThenHideOld, AssetOnlyReplace, Repository, Resource, TargetStates,
    UpdateInPlace, VanityUrlCache,
};

use crate::descriptor::{load_attachment, load_descriptor};
use crate::lifecycle::StateArg;

/// Reconciliation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Always add a new resource.
    AddNew,
    /// Add a fresh copy when anything changed, then delete the matches.
    AddThenDelete,
    /// Update the first match field by field and attachment by attachment.
    UpdateInPlace,
    /// Replace the first match's fields only.
    AssetOnlyReplace,
    /// Add-then-delete, and hide any other resource visible at the same
    /// vanity URL.
    AddThenHideOld,
}

/// Arguments for `lars upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Resource descriptor (YAML or JSON).
    pub descriptor: PathBuf,

    /// Attach a local file, as TYPE=PATH. Repeatable.
    #[arg(long = "attach", value_name = "TYPE=PATH")]
    pub attachments: Vec<String>,

    #[arg(long, value_enum, default_value = "add-then-delete")]
    pub strategy: StrategyKind,

    /// State for a resource with no existing match.
    #[arg(long, value_enum, default_value = "draft")]
    pub state: StateArg,

    /// State when a match exists. Defaults to the match's current state.
    #[arg(long, value_enum)]
    pub matching_state: Option<StateArg>,

    /// Replace matches even when nothing changed.
    #[arg(long)]
    pub force: bool,
}

impl UploadArgs {
    pub fn targets(&self) -> TargetStates {
        TargetStates {
            if_matching: self.matching_state.map(Into::into),
            no_match: self.state.into(),
        }
    }
}

/// Build the candidate from the descriptor and attachment files.
pub fn build_candidate(args: &UploadArgs) -> Result<Resource> {
    let mut resource = load_descriptor(&args.descriptor)?;
    for spec in &args.attachments {
        resource.add_attachment(load_attachment(spec)?)?;
    }
    Ok(resource)
}

/// Upload `candidate` and return the resources the upload deleted.
pub fn upload(
    repo: &Repository,
    cache: &Arc<VanityUrlCache>,
    candidate: &mut Resource,
    kind: StrategyKind,
    targets: TargetStates,
    force: bool,
) -> Result<Vec<Resource>> {
    let deleted = match kind {
        StrategyKind::AddNew => {
            repo.upload(candidate, &mut AddNew::new(targets))?;
            Vec::new()
        }
        StrategyKind::AddThenDelete => {
            let mut strategy = AddThenDelete::new(targets).force_replace(force);
            repo.upload(candidate, &mut strategy)?;
            strategy.deleted_resources().to_vec()
        }
        StrategyKind::UpdateInPlace => {
            repo.upload(candidate, &mut UpdateInPlace::new(targets).force_replace(force))?;
            Vec::new()
        }
        StrategyKind::AssetOnlyReplace => {
            repo.upload(candidate, &mut AssetOnlyReplace)?;
            Vec::new()
        }
        StrategyKind::AddThenHideOld => {
            let mut strategy = AddThenHideOld::new(targets, Arc::clone(cache)).force_replace(force);
            repo.upload(candidate, &mut strategy)?;
            strategy.deleted_resources().to_vec()
        }
    };
    Ok(deleted)
}

pub fn run_upload(args: &UploadArgs, repo: &Repository, cache: &Arc<VanityUrlCache>) -> Result<u8> {
    let mut candidate = build_candidate(args)?;
    let deleted = upload(repo, cache, &mut candidate, args.strategy, args.targets(), args.force)?;

    println!(
        "{}\t{}\t{}",
        candidate.id().map_or("-", |id| id.as_str()),
        candidate.state().map_or("-", |s| s.as_str()),
        candidate.vanity_url()
    );
    for resource in &deleted {
        if let Some(id) = resource.id() {
            println!("deleted {id}");
        }
    }
    Ok(0)
}
