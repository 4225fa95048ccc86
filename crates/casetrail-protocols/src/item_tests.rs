use chrono::TimeZone;

use super::*;

#[test]
fn test_item_kind_display_and_css_name() {
    assert_eq!(ItemKind::Note.to_string(), "Note");
    assert_eq!(ItemKind::Email.to_string(), "Email");
    assert_eq!(ItemKind::Email.as_str(), "email");
}

#[test]
fn test_fetch_request_item_from_listing_json() {
    let json = r#"{
        "type": "Email",
        "url": "https://example.lightning.force.com/lightning/r/EmailMessage/02s1/view",
        "title": "Re: outage",
        "author": "ops@example.com",
        "to": "support@example.com",
        "dateStr": "25/12/2024 09:30"
    }"#;
    let item: FetchRequestItem = serde_json::from_str(json).unwrap();
    assert_eq!(item.kind, ItemKind::Email);
    assert_eq!(item.date_str, "25/12/2024 09:30");
    assert_eq!(item.to.as_deref(), Some("support@example.com"));
    assert!(item.description_snippet.is_none());
}

#[test]
fn test_note_builder_serializes_snippet_camel_case() {
    let item = FetchRequestItem::note("https://x/n/1", "01/01/2024 10:00", "Call", "Ann")
        .with_snippet("customer called");
    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["type"], "Note");
    assert_eq!(value["descriptionSnippet"], "customer called");
    assert!(value.get("to").is_none());
}

#[test]
fn test_note_payload_defaults_missing_fields() {
    let payload: NotePayload = serde_json::from_str(r#"{"isPublic": true}"#).unwrap();
    assert_eq!(payload.description, "");
    assert_eq!(payload.is_public, Some(true));
}

#[test]
fn test_email_payload_body_html_field_name() {
    let payload: EmailPayload =
        serde_json::from_str(r#"{"bodyHTML": "<p>hi</p>", "subject": "S"}"#).unwrap();
    assert_eq!(payload.body_html, "<p>hi</p>");
    assert_eq!(payload.subject, "S");
    assert_eq!(payload.from, "");
}

#[test]
fn test_fetched_detail_accessors() {
    let when = Utc.with_ymd_and_hms(2024, 12, 25, 9, 30, 0).unwrap();
    let ok = FetchedDetail::Fetched {
        payload: ExtractionPayload::Note(NotePayload::default()),
        date_object: Some(when),
    };
    let failed = FetchedDetail::Failed {
        reason: "timeout".to_string(),
        date_object: None,
    };
    assert_eq!(ok.date_object(), Some(when));
    assert!(!ok.is_failure());
    assert!(failed.is_failure());
    assert_eq!(failed.date_object(), None);
}

#[test]
fn test_fetched_detail_wire_shape() {
    let failed = FetchedDetail::Failed {
        reason: "boom".to_string(),
        date_object: None,
    };
    let value = serde_json::to_value(&failed).unwrap();
    assert_eq!(value["status"], "failed");
    assert_eq!(value["reason"], "boom");
}

#[test]
fn test_notice_content() {
    assert!(ItemContent::Notice("x".into()).is_notice());
    assert!(!ItemContent::Html("x".into()).is_notice());
}
