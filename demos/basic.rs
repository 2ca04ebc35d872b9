//! Basic example demonstrating the BigGo PMS client.
//!
//! Run with:
//! ```
//! BIGGO_CLIENT_ID=your-id BIGGO_CLIENT_SECRET=your-secret cargo run --example basic
//! ```

use biggo_pms::{
    export_report, get_groups, get_platforms, get_reports, DownloadOptions, PmsClient,
    ReportFormat, ReportListOptions,
};

#[tokio::main]
async fn main() -> biggo_pms::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating BigGo PMS client...");
    let client = PmsClient::from_env()?;
    println!("Connected to: {}", client.base_url());

    println!("\n--- Listing Platforms ---");
    let platforms = get_platforms(&client).await?;
    println!("Found {} platforms", platforms.len());

    for platform in &platforms {
        println!(
            "  - {} ({}, {}, {} admins)",
            platform.name,
            platform.id,
            platform.status,
            platform.administrators().count()
        );
    }

    let Some(platform) = platforms.iter().find(|p| p.is_enabled()) else {
        println!("\nNo enabled platform to explore.");
        return Ok(());
    };

    println!("\n--- Groups of {} ---", platform.name);
    let groups = get_groups(&client, &platform.id).await?;
    for group in &groups {
        let schedule = if group.is_schedule_on {
            group.schedule.to_string()
        } else {
            "off".to_string()
        };
        println!(
            "  - {} [{}] schedule: {}, samples: {}",
            group.name, group.district, schedule, group.sample_count
        );
    }

    println!("\n--- Latest Reports ---");
    let options = ReportListOptions {
        size: Some(5),
        ..Default::default()
    };
    let reports = get_reports(&client, &platform.id, options).await?;
    for (i, report) in reports.iter().enumerate() {
        println!(
            "  {}. {} - {} ({} samples)",
            i + 1,
            report.create_time,
            report.group_name,
            report.sample_size
        );
    }

    // Download the newest report as CSV into ./reports
    if let Some(report) = reports.first() {
        println!("\n--- Downloading {} ---", report.id);
        let saved = export_report(
            &client,
            &platform.id,
            &report.id,
            ReportFormat::Csv,
            DownloadOptions::save_to("reports"),
        )
        .await?;
        if let Some(path) = saved.path() {
            println!("Saved to {}", path.display());
        }
    }

    println!("\nDone!");
    Ok(())
}
