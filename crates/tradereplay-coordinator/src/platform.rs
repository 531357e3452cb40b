//! Supported trading platform matching.

/// Matches tab URLs against the configured platform host fragments.
#[derive(Debug, Clone)]
pub struct PlatformMatcher {
    hosts: Vec<String>,
}

impl PlatformMatcher {
    pub fn new(hosts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.into().to_lowercase())
                .collect(),
        }
    }

    /// Whether the URL belongs to a supported platform.
    pub fn matches(&self, url: &str) -> bool {
        self.platform_for(url).is_some()
    }

    /// The host fragment the URL matched.
    pub fn platform_for(&self, url: &str) -> Option<&str> {
        let url = url.to_lowercase();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return None;
        }
        self.hosts
            .iter()
            .find(|host| url.contains(host.as_str()))
            .map(String::as_str)
    }
}
