//! HTML rendering of the reconciliation view. Pure functions of their input.

use std::fmt::Write;

use shared::api::ErrorResponse;
use shared::calendar::NormalizedEvent;

use super::display::DisplayRecord;
use super::ContactView;

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 2rem; color: #222; }
.columns { display: flex; gap: 2rem; }
.column { flex: 1; }
.record { border: 1px solid #ddd; border-radius: 6px; padding: 12px; margin-bottom: 12px; }
.field-name { font-weight: 600; }
.delete-btn { margin-top: 8px; background: #c0392b; color: #fff; border: none; border-radius: 4px; padding: 6px 10px; cursor: pointer; }
.merge-btn { margin-bottom: 20px; padding: 8px 12px; background-color: #0077cc; color: white; border: none; border-radius: 4px; cursor: pointer; }
.merge-btn:hover { background-color: #005fa3; }
.merge-checkbox { margin: 10px; }
.empty { color: #888; }
.error { color: #c0392b; }
"#;

const SCRIPT: &str = r#"
const contactKey = document.body.dataset.contact;
let selectedRecords = [];

function updateMergeSelection(checkbox) {
  if (checkbox.checked) {
    selectedRecords.push(checkbox.value);
  } else {
    selectedRecords = selectedRecords.filter(id => id !== checkbox.value);
  }
}

function runAction(query) {
  return fetch(`?contact=${encodeURIComponent(contactKey)}&${query}`)
    .then(response => response.json())
    .then(data => {
      if (data.error) {
        throw new Error(data.details || data.error);
      }
      alert(data.message);
      window.location.reload();
    });
}

function deleteRecord(button) {
  const source = encodeURIComponent(button.dataset.source);
  const recordId = encodeURIComponent(button.dataset.recordId);
  if (confirm("Delete this record? This cannot be undone.")) {
    runAction(`action=delete&source=${source}&recordId=${recordId}`)
      .catch(error => alert("Error deleting record: " + error.message));
  }
}

function mergeRecords() {
  if (selectedRecords.length < 2) {
    alert("Please select at least 2 records to merge");
    return;
  }
  if (confirm("Merge these records? This cannot be undone.")) {
    runAction(`action=merge&records=${selectedRecords.map(encodeURIComponent).join(",")}`)
      .catch(error => alert("Error merging records: " + error.message));
  }
}

function syncIds(action) {
  runAction(`action=${action}`)
    .catch(error => alert("Error syncing records: " + error.message));
}
"#;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body_attrs: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body{}>\n{}\n</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body_attrs,
        body
    )
}

fn render_record(out: &mut String, record: &DisplayRecord, mergeable: bool) {
    let id = escape_html(&record.id);
    out.push_str("<div class=\"record\">\n");
    if mergeable {
        let _ = writeln!(
            out,
            "<input type=\"checkbox\" class=\"merge-checkbox\" value=\"{}\" onchange=\"updateMergeSelection(this)\">",
            id
        );
    }
    for field in &record.fields {
        let _ = writeln!(
            out,
            "<div><span class=\"field-name\">{}:</span> <span>{}</span></div>",
            escape_html(field.label),
            escape_html(&field.value)
        );
    }
    let _ = writeln!(
        out,
        "<button class=\"delete-btn\" data-source=\"{}\" data-record-id=\"{}\" onclick=\"deleteRecord(this)\">Delete</button>",
        record.source.label().to_lowercase(),
        id
    );
    out.push_str("</div>\n");
}

fn render_column(out: &mut String, title: &str, records: &[DisplayRecord], mergeable: bool) {
    let _ = writeln!(out, "<div class=\"column\">\n<h2>{}</h2>", title);
    if mergeable && records.len() > 1 {
        out.push_str(
            "<button class=\"merge-btn\" onclick=\"mergeRecords()\">Merge Selected Records</button>\n",
        );
    }
    if records.is_empty() {
        let _ = writeln!(out, "<div class=\"empty\">No {} found.</div>", title.to_lowercase());
    }
    for record in records {
        render_record(out, record, mergeable && records.len() > 1);
    }
    out.push_str("</div>\n");
}

fn render_meetings(out: &mut String, meetings: &[NormalizedEvent]) {
    out.push_str("<h2>Recent meetings</h2>\n");
    if meetings.is_empty() {
        out.push_str("<div class=\"empty\">No meetings in the last or next 24 hours.</div>\n");
        return;
    }
    out.push_str("<ul>\n");
    for meeting in meetings {
        let _ = writeln!(
            out,
            "<li>{} <span class=\"empty\">{}</span></li>",
            escape_html(&meeting.summary),
            escape_html(meeting.meeting_date.as_deref().unwrap_or(""))
        );
    }
    out.push_str("</ul>\n");
}

/// Full page for a contact lookup.
pub fn render_view(view: &ContactView) -> String {
    let title = format!("Contact: {}", view.contact);
    let mut body = String::new();
    let _ = writeln!(body, "<h1>{}</h1>", escape_html(&title));

    if view.is_empty() {
        body.push_str("<p class=\"empty\">No records found</p>\n");
    } else {
        body.push_str("<p>\n<button onclick=\"syncIds('syncHubspotId')\">Copy HubSpot ID to Airtable</button>\n<button onclick=\"syncIds('syncAirtableId')\">Copy Airtable ID to HubSpot</button>\n</p>\n");
        body.push_str("<div class=\"columns\">\n");
        render_column(&mut body, "Airtable Records", &view.airtable, false);
        render_column(&mut body, "HubSpot Records", &view.hubspot, true);
        body.push_str("</div>\n");
    }

    if let Some(meetings) = &view.meetings {
        render_meetings(&mut body, meetings);
    }

    let _ = write!(body, "<script>{}</script>", SCRIPT);
    let attrs = format!(" data-contact=\"{}\"", escape_html(&view.contact));
    page(&title, &attrs, &body)
}

/// Page shown when a lookup fails.
pub fn render_error(error: &ErrorResponse) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1 class=\"error\">{}</h1>", escape_html(&error.error));
    if let Some(details) = &error.details {
        let _ = writeln!(body, "<pre>{}</pre>", escape_html(details));
    }
    page("Error", "", &body)
}
