//! Receipt rendering
//!
//! Deterministic, pure transformation of a submitted complaint record into
//! a printable plain-text receipt: a fixed header block, fixed-position
//! fields, then the description word-wrapped to the page width. Identical
//! input always produces identical layout, so the output is snapshot-tested.

use crate::model::ComplaintRecord;

/// Page width in columns for the description block.
pub const PAGE_WIDTH: usize = 72;

const TITLE: &str = "CITYFIX AUTHORITY";
const SUBTITLE: &str = "OFFICIAL CITIZEN COMPLAINT RECEIPT";

/// Render the receipt document for a submitted record.
pub fn render(record: &ComplaintRecord) -> String {
    let mut doc = String::new();

    doc.push_str(TITLE);
    doc.push('\n');
    doc.push_str(SUBTITLE);
    doc.push('\n');
    doc.push_str(&"-".repeat(PAGE_WIDTH));
    doc.push_str("\n\n");

    doc.push_str(&format!("Complaint ID: {}\n", record.complaint_id));
    doc.push_str(&format!("Aadhar: {}\n", record.aadhar));
    doc.push_str(&format!("Reporter: {}\n", record.name));
    doc.push_str(&format!("Phone: {}\n", record.phone));
    doc.push_str(&format!("Location: {}, {}\n", record.lat, record.lng));

    doc.push_str("\nDescription:\n");
    for line in wrap_text(&record.description, PAGE_WIDTH) {
        doc.push_str(&line);
        doc.push('\n');
    }

    doc
}

/// Suggested download filename for a receipt.
pub fn file_name(complaint_id: &str) -> String {
    format!("CityFix_Receipt_{}.txt", complaint_id)
}

/// Greedy word wrap at `width` columns.
///
/// Words longer than the width are hard-split so no output line ever
/// exceeds it. Existing newlines in the input start fresh paragraphs.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let mut word = word;

            // Hard-split words that cannot fit on any line.
            while word.chars().count() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let split_at = word
                    .char_indices()
                    .nth(width)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                lines.push(word[..split_at].to_string());
                word = &word[split_at..];
            }

            let needed = word.chars().count()
                + if current.is_empty() {
                    0
                } else {
                    current.chars().count() + 1
                };
            if !current.is_empty() && needed > width {
                lines.push(std::mem::take(&mut current));
            }

            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }

        lines.push(current);
    }

    lines
}
