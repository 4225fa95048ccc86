//! Self-contained HTML report rendering.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use casetrail_protocols::{HeaderRecord, ItemContent, ItemKind, TimelineItem};

const STYLESHEET: &str = include_str!("assets/report.css");

/// Escape text for use in HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn or_na(value: &str) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        escape_html(value)
    }
}

/// Render the full report for a record and its merged timeline.
///
/// Plain-text fields are escaped. Scraped bodies and the record
/// description are embedded as they are.
pub fn render_report(
    header: &HeaderRecord,
    items: &[TimelineItem],
    generated_at: DateTime<Utc>,
) -> String {
    let object_type = escape_html(&header.object_type.to_string());
    let number = or_na(&header.record_number);
    let subject = or_na(&header.subject);

    let mut html = String::with_capacity(16 * 1024);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{ty} {number}: {subject}</title>\n<style>\n{css}</style>\n</head>\n<body>\n\
         <h1>{ty} {number}: {subject}</h1>\n\
         <div class=\"generated\">Generated: {generated}</div>\n",
        ty = object_type,
        number = number,
        subject = subject,
        css = STYLESHEET,
        generated = generated_at.format("%Y-%m-%d %H:%M UTC"),
    );

    let _ = write!(
        html,
        "<div class=\"record\">\n<h2>Details</h2>\n<dl class=\"details\">\n\
         <dt>{ty}:</dt><dd>{number}</dd>\n\
         <dt>Customer Account:</dt><dd>{account}</dd>\n\
         <dt>Subject:</dt><dd>{subject}</dd>\n\
         <dt>Date Created:</dt><dd>{created}</dd>\n\
         <dt>Created By:</dt><dd>{creator}</dd>\n\
         <dt>Status:</dt><dd>{status}</dd>\n\
         <dt>Owner:</dt><dd>{owner}</dd>\n</dl>\n\
         <span class=\"description-label\">Description:</span>\n<div class=\"description\">{description}</div>\n</div>\n",
        ty = object_type,
        number = number,
        account = or_na(&header.account_name),
        subject = subject,
        created = or_na(&header.created_date_str),
        creator = or_na(&header.creator_name),
        status = or_na(&header.status),
        owner = or_na(&header.owner),
        description = if header.description.trim().is_empty() {
            "<p><i>No description found or extracted.</i></p>"
        } else {
            header.description.as_str()
        },
    );

    let _ = writeln!(html, "<h2>Timeline ({} items)</h2>", items.len());
    if items.is_empty() {
        html.push_str("<p>No Notes or Emails found or extracted successfully.</p>\n");
    }
    for item in items {
        render_item(&mut html, item);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_item(html: &mut String, item: &TimelineItem) {
    let class = item.kind.as_str();

    let visibility = match (item.kind, item.is_public) {
        (ItemKind::Note, Some(true)) => "<span class=\"visibility public\">(public)</span>",
        (ItemKind::Note, Some(false)) => "<span class=\"visibility internal\">(internal)</span>",
        _ => "",
    };

    let timestamp = match item.date_object {
        Some(when) => when.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => or_na(&item.date_str),
    };

    let meta = match item.kind {
        ItemKind::Email => format!(
            "<b>From:</b> {} | <b>To:</b> {}",
            or_na(&item.author),
            or_na(item.to.as_deref().unwrap_or_default())
        ),
        ItemKind::Note => format!("<b>By:</b> <strong>{}</strong>", or_na(&item.author)),
    };

    let content = match &item.content {
        ItemContent::Html(body) => body.clone(),
        ItemContent::Notice(text) => format!("<span class=\"notice\">{}</span>", escape_html(text)),
    };

    let _ = write!(
        html,
        "<div class=\"item {class}\">\n<div class=\"item-header\">\
         <span class=\"item-kind\">{kind}</span>{visibility}\
         <span class=\"timestamp\">[{timestamp}]</span>\
         <span class=\"title\">{title}</span>\
         <span class=\"meta\">{meta}</span></div>\n\
         <div class=\"content\">{content}</div>\n\
         <div class=\"attachments\">Attachments: {attachments}</div>\n</div>\n",
        class = class,
        kind = item.kind,
        visibility = visibility,
        timestamp = timestamp,
        title = or_na(&item.title),
        meta = meta,
        content = content,
        attachments = or_na(&item.attachments),
    );
}

/// Minimal document shown when no report could be produced.
pub fn render_error_document(title: &str, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"UTF-8\"><title>Error</title></head>\n\
         <body>\n<h1>{}</h1>\n<p>{}</p>\n</body>\n</html>\n",
        escape_html(title),
        escape_html(message)
    )
}
