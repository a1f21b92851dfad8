use rtcgit_runtime_config::ProxySettings;

/// Maps a target URL to the URL that is actually requested.
///
/// The hosting application only allows same-origin requests to GitLab, so
/// those go through its `/proxy?uri=` endpoint. The mapping is a pure
/// function decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Routing {
    #[default]
    Direct,
    Proxy { app_root: String },
}

impl Routing {
    pub fn from_settings(settings: &ProxySettings) -> Self {
        let app_root = settings.app_root.trim().trim_end_matches('/');
        if settings.enabled && !app_root.is_empty() {
            Self::Proxy {
                app_root: app_root.to_string(),
            }
        } else {
            Self::Direct
        }
    }

    pub fn request_url(&self, target: &str) -> String {
        match self {
            Self::Direct => target.to_string(),
            Self::Proxy { app_root } => {
                format!("{app_root}/proxy?uri={}", urlencoding::encode(target))
            }
        }
    }
}
