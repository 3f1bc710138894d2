//! Markdown summary generation
//!
//! This module generates a human-readable Markdown report of one job run:
//! crawl bounds, page counts, depth breakdown, failures and, when enrichment
//! ran, the classified content types.

use crate::output::stats::RunSummary;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Pages listed individually before the list is cut short
const MAX_LISTED_PAGES: usize = 100;

/// Generates a markdown summary of a run
///
/// # Arguments
///
/// * `summary` - The run summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(dir) = output_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let mut md = String::new();

    // Title
    md.push_str(&format!("# Site-Harvest Summary: {}\n\n", summary.job_name));

    // Job
    md.push_str("## Job\n\n");
    md.push_str(&format!("- **Start URL**: {}\n", summary.start_url));
    md.push_str(&format!("- **Max Depth**: {}\n", summary.max_depth));
    md.push_str(&format!("- **Max Pages**: {}\n", summary.max_pages));
    md.push_str(&format!("- **Link Filter**: {}\n", summary.link_filter));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    md.push_str(&format!(
        "- **Duration**: {:.0} seconds ({:.2} minutes)\n\n",
        summary.duration_secs,
        summary.duration_secs / 60.0
    ));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Pages Recorded This Run**: {}\n",
        summary.pages_recorded
    ));
    md.push_str(&format!("- **Total Pages**: {}\n", summary.total_pages));
    md.push_str(&format!("- **Failed**: {}\n", summary.failed_urls.len()));
    md.push_str(&format!(
        "- **Skipped (visited earlier)**: {}\n",
        summary.skipped
    ));
    md.push_str(&format!(
        "- **Referenced Links**: {}\n",
        summary.referenced_links
    ));
    md.push_str(&format!(
        "- **Interactive Sections**: {}\n",
        summary.interactive_sections
    ));
    if let Some(enriched) = summary.successful_enrichments {
        md.push_str(&format!(
            "- **Enriched Pages**: {} / {}\n",
            enriched, summary.total_pages
        ));
    }
    md.push('\n');

    // Depth breakdown
    if !summary.depth_breakdown.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (depth, count) in &summary.depth_breakdown {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    // Content types
    if !summary.content_types.is_empty() {
        md.push_str("## Content Types\n\n");
        md.push_str("| Content Type | Pages |\n");
        md.push_str("|--------------|-------|\n");
        for (content_type, count) in &summary.content_types {
            md.push_str(&format!("| {} | {} |\n", content_type, count));
        }
        md.push('\n');
    }

    if !summary.synthesized_fields.is_empty() {
        md.push_str("## Synthesized Fields\n\n");
        for field in &summary.synthesized_fields {
            md.push_str(&format!("- {}\n", field));
        }
        md.push('\n');
    }

    // Pages
    if !summary.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| Depth | Title | URL |\n");
        md.push_str("|-------|-------|-----|\n");
        for (title, url, depth) in summary.pages.iter().take(MAX_LISTED_PAGES) {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                depth,
                title.replace('|', "\\|"),
                url
            ));
        }
        if summary.pages.len() > MAX_LISTED_PAGES {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.pages.len() - MAX_LISTED_PAGES
            ));
        }
        md.push('\n');
    }

    // Failures
    if !summary.failed_urls.is_empty() {
        md.push_str("## Failed URLs\n\n");
        for url in &summary.failed_urls {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    md
}
