use std::sync::LazyLock;

use regex::Regex;
use rtcgit_core::{Result, WorkItem};
use tracing::warn;

/// Used when the repository has no issue template of its own.
pub const DEFAULT_ISSUE_TEMPLATE: &str = "\
This issue was created from [RTC Work Item {{id}}]({{locationUri}}).

## Summary

{{summary}}

## Description

{{description}}

**Tags:** {{tags}}
";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").unwrap());

/// Renders an issue body from a Markdown template and a work item.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, work_item: &WorkItem) -> String;
}

/// Substitutes `{{field}}` placeholders. Unknown placeholders render empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, template: &str, work_item: &WorkItem) -> String {
        PLACEHOLDER_RE
            .replace_all(template, |caps: &regex::Captures<'_>| {
                match &caps[1] {
                    "id" => work_item.id.to_string(),
                    "summary" => work_item.summary.clone(),
                    "description" => work_item.description.clone(),
                    "tags" => work_item.tags.join(", "),
                    "locationUri" | "location_uri" => work_item.location_uri.clone(),
                    _ => String::new(),
                }
            })
            .into_owned()
    }
}

/// Pick the fetched template, or the default one if fetching failed.
pub(crate) fn template_or_default(fetched: Result<String>) -> String {
    match fetched {
        Ok(template) if !template.trim().is_empty() => template,
        Ok(_) => DEFAULT_ISSUE_TEMPLATE.to_string(),
        Err(e) => {
            warn!("Couldn't find an issue template, using the default one: {e}");
            DEFAULT_ISSUE_TEMPLATE.to_string()
        }
    }
}

/// Work item tags plus the marker label, without duplicates.
pub(crate) fn issue_labels(work_item: &WorkItem, marker_label: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(work_item.tags.len() + 1);
    let tags = work_item.tags.iter().map(String::as_str);
    for tag in tags.chain(std::iter::once(marker_label)) {
        if !labels.iter().any(|label| label == tag) {
            labels.push(tag.to_string());
        }
    }
    labels
}
