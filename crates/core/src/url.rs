use crate::error::{ConnectorError, Result};

/// Repository URL broken into the pieces the host clients need.
///
/// Construction never fails: an unparseable URL or one with fewer than two
/// path segments yields an invalid value, and the accessors that need an
/// owner/repo pair report [`ConnectorError::InvalidRepositoryUrl`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlInfo {
    raw: String,
    origin: String,
    host: String,
    path_segments: Vec<String>,
}

impl UrlInfo {
    pub fn parse(raw: &str) -> Self {
        let raw_trimmed = raw.trim();
        let Ok(parsed) = url::Url::parse(raw_trimmed) else {
            return Self {
                raw: raw_trimmed.to_string(),
                ..Self::default()
            };
        };

        let host = parsed.host_str().unwrap_or_default().to_string();
        let origin = match parsed.port() {
            Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
            None => format!("{}://{}", parsed.scheme(), host),
        };

        let mut path_segments: Vec<String> = parsed
            .path()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        if let Some(last) = path_segments.last_mut() {
            if let Some(stripped) = last.strip_suffix(".git") {
                *last = stripped.to_string();
            }
        }
        path_segments.retain(|segment| !segment.is_empty());

        Self {
            raw: raw_trimmed.to_string(),
            origin,
            host,
            path_segments,
        }
    }

    /// The URL as originally supplied (trimmed).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `scheme://host[:port]` without a trailing slash.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Lower-cased host name, empty when the URL did not parse.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    pub fn is_valid(&self) -> bool {
        !self.origin.is_empty() && self.path_segments.len() >= 2
    }

    /// `owner/repo` (or `group/subgroup/repo` on GitLab).
    pub fn joined_id(&self) -> Result<String> {
        self.ensure_valid()?;
        Ok(self.path_segments.join("/"))
    }

    /// The first two segments, as GitHub addresses repositories.
    pub fn owner_repo(&self) -> Result<(&str, &str)> {
        self.ensure_valid()?;
        Ok((&self.path_segments[0], &self.path_segments[1]))
    }

    /// Browser URL of the repository with any `.git` suffix removed.
    pub fn web_url(&self) -> Result<String> {
        Ok(format!("{}/{}", self.origin, self.joined_id()?))
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ConnectorError::InvalidRepositoryUrl(self.raw.clone()))
        }
    }
}
