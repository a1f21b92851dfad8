use anyhow::{Context, Result};
use serde::Serialize;

/// Structured output envelope (Terraform/ripgrep pattern).
#[derive(Debug, Serialize)]
pub struct OutputEnvelope<T: Serialize> {
    pub version: &'static str,
    #[serde(rename = "type")]
    pub data_type: &'static str,
    #[serde(rename = "@message")]
    pub message: String,
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    pub data: T,
}

impl<T: Serialize> OutputEnvelope<T> {
    pub fn new(data_type: &'static str, message: impl Into<String>, data: T) -> Self {
        Self {
            version: "0.1",
            data_type,
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }
}

/// Print `data` wrapped in an envelope as pretty JSON on stdout.
pub fn print_json<T: Serialize>(
    data_type: &'static str,
    message: impl Into<String>,
    data: T,
) -> Result<()> {
    let envelope = OutputEnvelope::new(data_type, message, data);
    let rendered = serde_json::to_string_pretty(&envelope).context("Failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_tagged_field_names() {
        let envelope = OutputEnvelope::new("detect", "GitHub", serde_json::json!({"host": "GITHUB"}));
        let value = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(value["type"], "detect");
        assert_eq!(value["@message"], "GitHub");
        assert_eq!(value["data"]["host"], "GITHUB");
        assert!(value["@timestamp"].as_str().is_some());
    }
}
