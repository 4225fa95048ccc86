use chrono::TimeZone;
use serde_json::json;

use super::*;
use crate::orchestrator::BatchOrchestrator;
use crate::test_support::{
    FakeTabHost, JournalProgressSink, Load, RecordingReportSink, Script, StaticRecordSource,
};
use casetrail_config::FetchConfig;
use casetrail_protocols::{ExtractorSet, FetchRequestItem, HeaderRecord, ObjectType};

fn header() -> HeaderRecord {
    HeaderRecord {
        subject: "Broken widget".to_string(),
        record_number: "00042".to_string(),
        ..HeaderRecord::unknown(ObjectType::Case)
    }
}

struct Fixture {
    host: Arc<FakeTabHost>,
    reports: Arc<RecordingReportSink>,
    progress: Arc<JournalProgressSink>,
}

impl Fixture {
    fn new() -> Self {
        let host = Arc::new(FakeTabHost::new());
        let progress = Arc::new(JournalProgressSink::new(host.journal()));
        Self {
            host,
            reports: Arc::default(),
            progress,
        }
    }

    fn job(&self, source: StaticRecordSource) -> ReportJob {
        let orchestrator = BatchOrchestrator::new(
            self.host.clone(),
            ExtractorSet::new("note-extractor", "email-extractor"),
            &FetchConfig::default(),
        );
        let coordinator = Coordinator::new(Arc::new(orchestrator), self.reports.clone());
        ReportJob::new(Arc::new(source), Arc::new(coordinator), self.progress.clone())
    }
}

fn generated() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn test_missing_details_section_yields_error_document_only() {
    let fixture = Fixture::new();
    let source = StaticRecordSource::new(None);

    let html = fixture.job(source).generate_at(generated()).await;

    assert!(html.contains("<h1>Extraction Error</h1>"));
    assert!(!html.contains("Timeline"));
    assert_eq!(fixture.host.opens(), 0);
}

#[tokio::test]
async fn test_full_report_merges_notes_and_emails_chronologically() {
    let fixture = Fixture::new();
    fixture.host.script("https://x/n/1", Script::ok(json!({"description": "<p>first note</p>", "isPublic": true})));
    fixture.host.script("https://x/n/2", Script::load(Load::Error("net::ERR_ABORTED".into())));
    fixture.host.script("https://x/e/1", Script::ok(json!({"bodyHTML": "<p>mail</p>", "subject": "Re: widget"})));

    let mut source = StaticRecordSource::new(Some(header()));
    source.notes = Ok(vec![
        FetchRequestItem::note("https://x/n/1", "03/01/2024 10:00", "Call", "Ann"),
        FetchRequestItem::note("https://x/n/2", "not a date", "Lost", "Ann"),
    ]);
    source.emails = Ok(vec![FetchRequestItem::email(
        "https://x/e/1",
        "02/01/2024 10:00",
        "Widget",
        "c@x",
        "s@x",
    )]);

    let html = fixture.job(source).generate_at(generated()).await;

    assert!(html.contains("Case 00042: Broken widget"));
    assert!(html.contains("Timeline (2 items)"));
    let email_at = html.find("<p>mail</p>").unwrap();
    let note_at = html.find("<p>first note</p>").unwrap();
    assert!(email_at < note_at);
    assert!(html.contains("Re: widget"));
    assert!(!html.contains("Lost"));
    assert_eq!(fixture.host.closes(), 3);
}

#[tokio::test]
async fn test_empty_listings_skip_dispatch() {
    let fixture = Fixture::new();
    let html = fixture
        .job(StaticRecordSource::new(Some(header())))
        .generate_at(generated())
        .await;

    assert!(html.contains("No Notes or Emails"));
    assert_eq!(fixture.host.opens(), 0);
    assert!(fixture.progress.received.lock().is_empty());
}

#[tokio::test]
async fn test_listing_error_leaves_other_kind_intact() {
    let fixture = Fixture::new();
    let mut source = StaticRecordSource::new(Some(header()));
    source.notes = Err("related list missing".to_string());
    source.emails = Ok(vec![FetchRequestItem::email(
        "https://x/e/1",
        "02/01/2024 10:00",
        "Widget",
        "c@x",
        "s@x",
    )]);

    let html = fixture.job(source).generate_at(generated()).await;

    assert!(html.contains("Timeline (1 items)"));
    assert_eq!(fixture.host.opens(), 1);
}

#[tokio::test]
async fn test_rejected_batch_yields_empty_collection() {
    let fixture = Fixture::new();
    let mut source = StaticRecordSource::new(Some(header()));
    source.notes = Ok(vec![
        FetchRequestItem::note("https://x/n/1", "03/01/2024 10:00", "Call", "Ann"),
        FetchRequestItem::note("https://x/n/1", "03/01/2024 10:00", "Call", "Ann"),
    ]);

    let html = fixture.job(source).generate_at(generated()).await;

    assert!(html.contains("Timeline (0 items)"));
    assert_eq!(fixture.host.opens(), 0);
}

#[tokio::test]
async fn test_run_opens_the_report() {
    let fixture = Fixture::new();
    let job = fixture.job(StaticRecordSource::new(Some(header())));

    let html = job.run().await;

    let opened = fixture.reports.opened.lock();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0], html);
}

#[tokio::test]
async fn test_run_at_stamps_the_opened_report() {
    let fixture = Fixture::new();
    let job = fixture.job(StaticRecordSource::new(Some(header())));

    let html = job.run_at(generated()).await;

    assert!(html.contains("Generated: 2025-03-01 12:00 UTC"));
    assert_eq!(*fixture.reports.opened.lock(), vec![html]);
}
