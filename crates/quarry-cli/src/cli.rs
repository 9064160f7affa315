//! Command-line arguments.

use clap::{Parser, Subcommand};
use quarry_fts::QueryMode;

/// Quarry: full-text search over structured records
#[derive(Parser, Debug)]
#[command(name = "quarry", author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild a search index from the record store
    UpdateIndex {
        /// Backend short name or locator
        #[arg(short, long, default_value = "default")]
        backend: String,

        /// Records staged per batch
        #[arg(long, default_value_t = 100)]
        batch_size: usize,
    },

    /// Search one record type
    Search {
        /// Free text to match
        text: String,

        /// Record type to search; subtypes are included
        #[arg(short = 't', long = "type")]
        record_type: String,

        /// Filter as `field=value` or `field__in=a,b` (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Backend short name or locator
        #[arg(short, long, default_value = "default")]
        backend: String,

        /// Maximum results to print (backend default when omitted)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Results to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Term combination: smart, and, or
        #[arg(long, value_parser = parse_mode)]
        mode: Option<QueryMode>,
    },

    /// List configured and built-in backends
    Backends,

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print a value by dotted key
    Get { key: String },
    /// Write a starter config file
    Init {
        /// Destination (defaults to the resolved config path)
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_mode(s: &str) -> Result<QueryMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "smart" => Ok(QueryMode::Smart),
        "and" => Ok(QueryMode::And),
        "or" => Ok(QueryMode::Or),
        other => Err(format!("unknown query mode '{other}' (expected smart, and, or)")),
    }
}

// ============================================================================
// Tests
// ============================================================================
