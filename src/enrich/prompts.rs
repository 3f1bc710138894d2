//! Prompt text sent to the classification service

use crate::enrich::classifier::CANONICAL_LABELS;
use crate::enrich::EnrichedPageRecord;

/// Prompt asking for a single canonical label
pub fn label_prompt(title: &str, excerpt: &str) -> String {
    format!(
        "Classify this section of a web page into exactly ONE of these labels:\n\
         {labels}\n\n\
         Section title: {title}\n\
         Content preview: {excerpt}\n\n\
         Rules:\n\
         - Answer with the label only, nothing else\n\
         - If no label fits, answer \"other\"\n\
         - Do not explain or rewrite anything\n\n\
         Label:",
        labels = CANONICAL_LABELS.join(", "),
    )
}

/// Prompt asking for content type, summary and structured fields as JSON
pub fn extraction_prompt(title: &str, content: &str) -> String {
    format!(
        "You analyze web pages and extract structured information from them.\n\n\
         Page title: {title}\n\n\
         Content:\n{content}\n\n\
         Tasks:\n\
         1. Name the content type (for example \"visa_information\", \"requirements\", \
         \"processing_times\", \"course_details\", \"general_information\")\n\
         2. Summarize the page in two or three sentences\n\
         3. Extract the facts a reader would look up, as fields that suit the content type\n\n\
         Answer with JSON of this shape and nothing else:\n\
         {{\n  \"content_type\": \"...\",\n  \"summary\": \"...\",\n  \"structured_data\": {{ }}\n}}\n\n\
         Use only facts present in the content, keep field names consistent, \
         and keep units with numbers (\"24 months\", \"$7,000 AUD\").\n\n\
         JSON:"
    )
}

/// Prompt asking to merge several enriched pages into one JSON object
pub fn synthesis_prompt(pages: &[EnrichedPageRecord]) -> String {
    let listing: Vec<String> = pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let fields = serde_json::to_string_pretty(&page.structured_fields)
                .unwrap_or_else(|_| "{}".to_string());
            format!(
                "Page {}:\n- URL: {}\n- Title: {}\n- Content type: {}\n- Summary: {}\n- Structured data: {}\n",
                i + 1,
                page.url,
                page.title,
                page.content_type,
                page.summary,
                fields
            )
        })
        .collect();

    format!(
        "You merge information extracted from {count} related web pages.\n\n\
         Combine it into ONE well-organized JSON object: remove duplicates, \
         group related facts, and keep every important detail. Choose a \
         structure that suits the content, for example one entry per visa \
         category or a table of processing times.\n\n\
         Pages:\n{listing}\n\
         Answer with the JSON object only.\n\n\
         JSON:",
        count = pages.len(),
        listing = listing.join("\n"),
    )
}
