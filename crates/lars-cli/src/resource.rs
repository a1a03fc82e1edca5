//! # Inspection Subcommands
//!
//! Read-only views of the repository, plus `delete`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use lars_client::{AssetType, LicenseType};
use lars_core::AssetId;
use lars_resources::{MatchResult, ProductDefinition, Repository, Resource};

use crate::descriptor::load_descriptor;

fn parse_asset_type(s: &str) -> Result<AssetType, String> {
    AssetType::from_name(s).ok_or_else(|| format!("unknown asset type {s:?}"))
}

fn parse_license_type(s: &str) -> Result<LicenseType, String> {
    match s.to_ascii_uppercase().as_str() {
        "IPLA" => Ok(LicenseType::Ipla),
        "ILAN" => Ok(LicenseType::Ilan),
        "ILAR" => Ok(LicenseType::Ilar),
        "UNSPECIFIED" => Ok(LicenseType::Unspecified),
        _ => Err(format!("unknown license type {s:?}")),
    }
}

/// One line per resource: id, type, state, name, provider.
pub fn summary_line(resource: &Resource) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        resource.id().map_or("-", AssetId::as_str),
        resource.asset_type(),
        resource.state().map_or("-", |s| s.as_str()),
        resource.name(),
        resource.provider_name().unwrap_or("-"),
    )
}

/// Arguments for `lars get`.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Asset id.
    pub id: String,
}

/// Print the stored document as JSON.
pub fn run_get(args: &GetArgs, repo: &Repository) -> Result<u8> {
    let resource = repo.get_resource(&AssetId::new(&args.id))?;
    println!("{}", serde_json::to_string_pretty(&resource.to_asset())?);
    Ok(0)
}

/// Arguments for `lars list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list assets of this type (e.g. FEATURE, ADDON).
    #[arg(long = "type", value_parser = parse_asset_type)]
    pub asset_type: Option<AssetType>,
}

/// List resources. Unreadable documents are reported on stderr and turn
/// the exit code to 2.
pub fn run_list(args: &ListArgs, repo: &Repository) -> Result<u8> {
    let listing = repo.get_all_resources(args.asset_type)?;
    for resource in &listing.resources {
        println!("{}", summary_line(resource));
    }
    for error in &listing.bad_data {
        eprintln!("unreadable: {error}");
    }
    Ok(if listing.bad_data.is_empty() { 0 } else { 2 })
}

/// Arguments for `lars matches`.
#[derive(Args, Debug)]
pub struct MatchesArgs {
    /// Resource descriptor (YAML or JSON).
    pub descriptor: PathBuf,
}

/// List the stored resources an upload of the descriptor would reconcile
/// with, earliest first.
pub fn run_matches(args: &MatchesArgs, repo: &Repository) -> Result<u8> {
    let candidate = load_descriptor(&args.descriptor)?;
    for resource in repo.find_matching_resources(&candidate)? {
        println!("{}", summary_line(&resource));
    }
    Ok(0)
}

/// Arguments for `lars applies`.
#[derive(Args, Debug)]
pub struct AppliesArgs {
    /// Asset id.
    pub id: String,
    /// Installed product id.
    #[arg(long)]
    pub product: String,
    /// Installed product version.
    #[arg(long)]
    pub version: String,
    #[arg(long)]
    pub install_type: Option<String>,
    #[arg(long)]
    pub edition: Option<String>,
    #[arg(long, value_parser = parse_license_type)]
    pub license: Option<LicenseType>,
}

/// Check a resource against an installed product. Exit code 0 when it
/// applies, 2 otherwise.
pub fn run_applies(args: &AppliesArgs, repo: &Repository) -> Result<u8> {
    let resource = repo.get_resource(&AssetId::new(&args.id))?;
    let product = ProductDefinition {
        id: args.product.clone(),
        version: args.version.clone(),
        install_type: args.install_type.clone(),
        license_type: args.license,
        edition: args.edition.clone(),
    };
    let result = resource.matches(&product);
    println!("{result:?}");
    Ok(if result == MatchResult::Matched { 0 } else { 2 })
}

/// Arguments for `lars delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Asset id.
    pub id: String,
    /// Delete even if the asset is published.
    #[arg(long)]
    pub force: bool,
}

pub fn run_delete(args: &DeleteArgs, repo: &Repository) -> Result<u8> {
    let id = AssetId::new(&args.id);
    let resource = repo
        .get_resource(&id)
        .with_context(|| format!("failed to fetch asset {id}"))?;
    if resource.state() == Some(lars_core::State::Published) && !args.force {
        bail!("asset {id} is published; unpublish it first or pass --force");
    }
    repo.delete_resource(&resource)?;
    println!("deleted {id}");
    Ok(0)
}
