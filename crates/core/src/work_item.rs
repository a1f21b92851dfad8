use serde::{Deserialize, Serialize};

/// The RTC work item a save links artifacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: u64,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location_uri: String,
}

impl WorkItem {
    /// Split RTC's `internalTags` attribute (`"a, b, c"`) into tags.
    pub fn parse_internal_tags(raw: &str) -> Vec<String> {
        raw.split(", ")
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}
