//! BigGo PMS CLI binary.
//!
//! A command-line interface for browsing platforms, groups, and reports, and
//! for downloading report files.

use std::io::Write;
use std::process::ExitCode;

use biggo_pms::cli::{download_options, Cli, Command};
use biggo_pms::{
    export_report, get_groups, get_platforms, get_reports, Group, Platform, PmsClient,
    ReportListItem, ReportOutput,
};
use clap::Parser;
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = match cli.client() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Set BIGGO_CLIENT_ID and BIGGO_CLIENT_SECRET environment variables");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &PmsClient, cli: Cli) -> biggo_pms::Result<()> {
    match cli.command {
        Command::Platforms => {
            let platforms = get_platforms(client).await?;
            output_list(&platforms, cli.json, |p| PlatformRow::from(p))?;
        }
        Command::Groups { platform } => {
            let groups = get_groups(client, &platform).await?;
            output_list(&groups, cli.json, |g| GroupRow::from(g))?;
        }
        Command::Reports { platform, filter } => {
            let reports = get_reports(client, &platform, filter.into()).await?;
            output_list(&reports, cli.json, |r| ReportRow::from(r))?;
        }
        Command::Download {
            platform,
            report,
            format,
            dir,
            file_name,
            stdout,
        } => {
            let options = download_options(dir, file_name, stdout);
            match export_report(client, &platform, &report, format, options).await? {
                ReportOutput::File(path) => println!("{}", path.display()),
                ReportOutput::Text(text) => print!("{text}"),
                ReportOutput::Binary(raw) => std::io::stdout().write_all(&raw)?,
            }
        }
    }
    Ok(())
}

fn output_list<T, R, F>(items: &[T], json: bool, to_row: F) -> biggo_pms::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
        println!("\n{} total", items.len());
    }
    Ok(())
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct PlatformRow {
    id: String,
    name: String,
    status: String,
    users: usize,
    emails: usize,
}

impl From<&Platform> for PlatformRow {
    fn from(p: &Platform) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            status: p.status.to_string(),
            users: p.user_list.len(),
            emails: p.email_list.len(),
        }
    }
}

#[derive(Tabled)]
struct GroupRow {
    id: String,
    name: String,
    district: String,
    status: String,
    schedule: String,
    samples: u64,
    exports: u64,
}

impl From<&Group> for GroupRow {
    fn from(g: &Group) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            district: g.district.clone(),
            status: g.status.to_string(),
            schedule: if g.is_schedule_on {
                g.schedule.to_string()
            } else {
                "off".to_string()
            },
            samples: g.sample_count,
            exports: g.export_count,
        }
    }
}

#[derive(Tabled)]
struct ReportRow {
    id: String,
    created: String,
    group: String,
    district: String,
    #[tabled(rename = "sample size")]
    sample_size: u64,
}

impl From<&ReportListItem> for ReportRow {
    fn from(r: &ReportListItem) -> Self {
        Self {
            id: r.id.clone(),
            created: r.create_time.clone(),
            group: r.group_name.clone(),
            district: r.district.clone(),
            sample_size: r.sample_size,
        }
    }
}
