//! Command-line interface for findit.

mod commands;

use clap::{Args, Parser, Subcommand};

use crate::models::SortOrder;

/// findit - cached business search over the Yelp Fusion API
#[derive(Parser)]
#[command(name = "findit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API and web UI (default)
    #[command(alias = "daemon", alias = "web")]
    Serve,

    /// Search businesses, using the local cache when possible
    #[command(alias = "s")]
    Search(SearchArgs),

    /// Export cached businesses to CSV
    Export {
        /// Search term; omit together with location to export everything
        #[arg(long, requires = "location")]
        term: Option<String>,

        /// Location; omit together with term to export everything
        #[arg(long, requires = "term")]
        location: Option<String>,

        #[arg(long, default_value = "best_match")]
        sort_by: SortOrder,

        /// Maximum number of rows to write
        #[arg(long)]
        max_results: Option<u32>,
    },

    /// Delete every cached query and business
    Clear,
}

#[derive(Args)]
pub struct SearchArgs {
    /// What to search for, e.g. "pizza"
    pub term: String,

    /// City or region, e.g. "Boston"
    pub location: String,

    /// best_match, rating, review_count or distance
    #[arg(long, default_value = "best_match")]
    pub sort_by: SortOrder,

    /// Page size per upstream request (1-50)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=50))]
    pub limit: u32,

    /// Total results to collect (clamped to 1000)
    #[arg(long, default_value = "50")]
    pub max_results: u32,
}

pub use commands::*;
