//! CLI module for Neoquent.
//!
//! Subcommands:
//! - `check`: Verify the configured Neo4j connection
//! - `query`: Build a query against a label and print the matches

mod check;
mod query;

use clap::{Parser, Subcommand};

pub use query::QueryCommand;

/// Neoquent - entity mapper and query builder for Neo4j
#[derive(Parser)]
#[command(name = "neoquent")]
#[command(about = "Entity mapper and fluent query builder for Neo4j")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Connect to the configured database and run a trivial statement
    Check,

    /// Query nodes of a label
    Query(QueryCommand),
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Check => self.run_check().await,
            Command::Query(ref cmd) => cmd.run().await,
        }
    }
}
