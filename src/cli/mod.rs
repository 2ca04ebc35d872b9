//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the biggo-pms binary.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::{
    DownloadOptions, PmsClient, PmsError, ReportFormat, ReportListOptions, Result, SortOrder,
};

/// BigGo PMS command-line interface.
#[derive(Parser, Debug)]
#[command(name = "biggo-pms", about = "BigGo PMS API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// OAuth2 client ID.
    #[arg(long, global = true, env = "BIGGO_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth2 client secret.
    #[arg(long, global = true, env = "BIGGO_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Override the API base URL.
    #[arg(long, global = true, env = "BIGGO_API_URL")]
    pub api_url: Option<String>,

    /// Override the token endpoint URL.
    #[arg(long, global = true, env = "BIGGO_AUTH_URL")]
    pub auth_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Build a client from the credential and endpoint flags.
    ///
    /// # Errors
    ///
    /// Returns an error if either credential is missing or a URL is invalid.
    pub fn client(&self) -> Result<PmsClient> {
        let client_id = self.client_id.clone().ok_or_else(|| {
            PmsError::ConfigMissing("--client-id or BIGGO_CLIENT_ID required".to_string())
        })?;
        let client_secret = self.client_secret.clone().ok_or_else(|| {
            PmsError::ConfigMissing("--client-secret or BIGGO_CLIENT_SECRET required".to_string())
        })?;

        let mut builder = PmsClient::builder(client_id, client_secret);
        if let Some(api_url) = &self.api_url {
            builder = builder.api_url(api_url.clone());
        }
        if let Some(auth_url) = &self.auth_url {
            builder = builder.auth_url(auth_url.clone());
        }
        builder.build()
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the platforms visible to the client.
    Platforms,

    /// List the groups of a platform.
    Groups {
        /// The platform ID.
        platform: String,
    },

    /// List the report history of a platform.
    Reports {
        /// The platform ID.
        platform: String,

        #[command(flatten)]
        filter: ReportFilterArgs,
    },

    /// Download a report.
    Download {
        /// The platform ID.
        platform: String,

        /// The report ID.
        report: String,

        /// File format.
        #[arg(long, value_enum, default_value = "csv")]
        format: ReportFormat,

        /// Directory to save into.
        #[arg(long, conflicts_with = "stdout")]
        dir: Option<PathBuf>,

        /// File name (defaults to the server's suggestion).
        #[arg(long, conflicts_with = "stdout")]
        file_name: Option<String>,

        /// Write the report to stdout instead of a file.
        #[arg(long)]
        stdout: bool,
    },
}

/// Report history paging and filters.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ReportFilterArgs {
    /// Maximum number of reports.
    #[arg(long)]
    pub size: Option<u32>,

    /// Offset of the first report.
    #[arg(long)]
    pub start_index: Option<u32>,

    /// Sort order by creation time.
    #[arg(long, value_enum)]
    pub sort: Option<SortOrder>,

    /// Only reports of this group (repeatable).
    #[arg(long = "group")]
    pub groups: Vec<String>,

    /// Only reports created on or after this date (YYYY-MM-DD).
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Only reports created on or before this date (YYYY-MM-DD).
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
}

impl From<ReportFilterArgs> for ReportListOptions {
    fn from(args: ReportFilterArgs) -> Self {
        Self {
            size: args.size,
            start_index: args.start_index,
            sort: args.sort,
            group_ids: args.groups,
            start_date: args.start_date.map(midnight_utc),
            end_date: args.end_date.map(midnight_utc),
        }
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Build download options from the `download` subcommand flags.
pub fn download_options(
    dir: Option<PathBuf>,
    file_name: Option<String>,
    stdout: bool,
) -> DownloadOptions {
    if stdout {
        DownloadOptions::InMemory
    } else {
        DownloadOptions::SaveAsFile {
            save_dir: dir,
            file_name,
        }
    }
}
