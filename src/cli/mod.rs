//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{HistoryCommand, InitCommand, ListCommand, RunCommand, ValidateCommand};

/// A small CI runner: match repository events to workflows and run their steps
#[derive(Debug, Parser, Clone)]
#[command(name = "checkrun")]
#[command(version = "0.1.0")]
#[command(about = "Match repository events to workflows and run their steps", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Deliver an event to a workflow and run it if a trigger matches
    Run(RunCommand),

    /// Validate a workflow file
    Validate(ValidateCommand),

    /// Write a starter workflow file
    Init(InitCommand),

    /// List workflows with recorded runs
    List(ListCommand),

    /// Show run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;
