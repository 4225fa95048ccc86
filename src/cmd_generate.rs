//! `generate` subcommand: run the full pipeline against a live browser.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use casetrail_browser_cdp::{
    BrowserLauncher, CdpRecordPage, CdpTabHost, DataUrlReportSink, default_extractors,
};
use casetrail_config::Config;
use casetrail_core::{BatchOrchestrator, Coordinator, ReportJob};
use casetrail_protocols::TracingProgressSink;

/// Default report file name.
pub(crate) fn report_file_name(generated_at: DateTime<Utc>) -> String {
    format!("casetrail-report-{}.html", generated_at.format("%Y%m%d-%H%M%S"))
}

/// Where the report is written.
pub(crate) fn report_path(config: &Config, output: Option<PathBuf>, generated_at: DateTime<Utc>) -> PathBuf {
    output.unwrap_or_else(|| config.report.output_dir.join(report_file_name(generated_at)))
}

async fn write_report(path: &Path, document: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, document).await
}

/// Handle `generate`.
pub(crate) async fn handle_generate(
    config: &Config,
    record_url: &str,
    output: Option<PathBuf>,
    no_open: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let launcher = BrowserLauncher::new(config.browser.clone());
    let client = Arc::new(launcher.connect().await?);

    let host = Arc::new(CdpTabHost::new(client.clone(), config.fetch.channel_capacity));
    let orchestrator = Arc::new(BatchOrchestrator::new(
        host.clone(),
        default_extractors(),
        &config.fetch,
    ));
    let reports = Arc::new(DataUrlReportSink::new(client.clone()));
    let coordinator = Arc::new(Coordinator::new(orchestrator, reports));

    let page = CdpRecordPage::open(&client, record_url, config.fetch.load_timeout()).await?;
    let job = ReportJob::new(Arc::new(page), coordinator, Arc::new(TracingProgressSink));

    let open = config.report.open_in_browser && !no_open;
    let generated_at = Utc::now();
    let document = if open {
        job.run_at(generated_at).await
    } else {
        job.generate_at(generated_at).await
    };

    let path = report_path(config, output, generated_at);
    write_report(&path, &document).await?;
    info!("Report written to {}", path.display());
    println!("{}", path.display());

    if host.open_count() > 0 {
        warn!("{} tab(s) still open after the run", host.open_count());
    }
    if !open && launcher.launched() {
        launcher.shutdown().await;
    }

    Ok(())
}
