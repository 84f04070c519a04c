//! Text preparation for content records.

use crate::models::ContentRecord;

/// Flatten a content record into the text that gets chunked and embedded.
///
/// Present fields are emitted in a fixed order (name, description, price,
/// url), one labelled section each, separated by a blank line.
pub fn prepare_text_content(record: &ContentRecord) -> String {
    let sections: Vec<String> = [
        ("Name", record.name()),
        ("Description", record.description()),
        ("Price", record.price()),
        ("URL", record.url()),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| format!("{}: {}", label, v)))
    .collect();

    let content = sections.join("\n\n");
    tracing::debug!(
        section_count = sections.len(),
        final_length = content.len(),
        "text content prepared"
    );
    content
}
