//! # Lifecycle Subcommands
//!
//! - `move <ID> <STATE>` drives an asset to a state using the next-action
//!   table.
//! - `action <ID> <ACTION>` performs a single action.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use lars_core::{Action, AssetId, State};
use lars_resources::Repository;

/// Lifecycle state as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Draft,
    AwaitingApproval,
    NeedMoreInfo,
    Published,
}

impl From<StateArg> for State {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Draft => State::Draft,
            StateArg::AwaitingApproval => State::AwaitingApproval,
            StateArg::NeedMoreInfo => State::NeedMoreInfo,
            StateArg::Published => State::Published,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    Publish,
    Approve,
    Cancel,
    NeedMoreInfo,
    Unpublish,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Publish => Action::Publish,
            ActionArg::Approve => Action::Approve,
            ActionArg::Cancel => Action::Cancel,
            ActionArg::NeedMoreInfo => Action::NeedMoreInfo,
            ActionArg::Unpublish => Action::Unpublish,
        }
    }
}

/// Arguments for `lars move`.
#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Asset id.
    pub id: String,
    /// Target state.
    #[arg(value_enum)]
    pub state: StateArg,
}

/// Arguments for `lars action`.
#[derive(Args, Debug)]
pub struct ActionArgs {
    /// Asset id.
    pub id: String,
    #[arg(value_enum)]
    pub action: ActionArg,
}

pub fn run_move(args: &MoveArgs, repo: &Repository) -> Result<u8> {
    let id = AssetId::new(&args.id);
    let mut resource = repo
        .get_resource(&id)
        .with_context(|| format!("failed to fetch asset {id}"))?;
    let target = State::from(args.state);
    repo.move_to_state(&mut resource, target)?;
    println!("{id} {target}");
    Ok(0)
}

pub fn run_action(args: &ActionArgs, repo: &Repository) -> Result<u8> {
    let id = AssetId::new(&args.id);
    let mut resource = repo
        .get_resource(&id)
        .with_context(|| format!("failed to fetch asset {id}"))?;
    repo.perform_action(&mut resource, args.action.into())?;
    match resource.state() {
        Some(state) => println!("{id} {state}"),
        None => println!("{id} -"),
    }
    Ok(0)
}
