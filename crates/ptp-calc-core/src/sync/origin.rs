//! Origin allowlists

use reqwest::Url;

/// Production host page origins
pub const HOST_ORIGINS: &[&str] = &["https://powertunepro.com", "https://www.powertunepro.com"];

/// Extra origins the widgets themselves are served from
pub const WIDGET_ONLY_ORIGINS: &[&str] = &["https://ptp-calculators.vercel.app", "http://localhost:3000"];

/// Fixed set of origins frames may exchange messages with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginAllowlist {
    origins: Vec<String>,
}

impl OriginAllowlist {
    /// Host pages only; used for all frame messaging
    pub fn host() -> Self {
        Self::from_origins(HOST_ORIGINS.iter().copied())
    }

    /// Host pages plus the widget deployments
    pub fn widget() -> Self {
        Self::from_origins(HOST_ORIGINS.iter().chain(WIDGET_ONLY_ORIGINS).copied())
    }

    /// Allowlist of exactly `origins`
    pub fn from_origins<'a>(origins: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            origins: origins.into_iter().map(str::to_string).collect(),
        }
    }

    /// Exact match against a serialized origin (`scheme://host[:port]`)
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|allowed| allowed == origin)
    }

    /// Origin of `referrer` if it is on the list
    ///
    /// `None` for an empty, unparsable or opaque referrer, and for origins
    /// that are not allowed.
    pub fn referrer_origin(&self, referrer: &str) -> Option<String> {
        let origin = origin_of(referrer)?;
        self.is_allowed(&origin).then_some(origin)
    }

    /// Allowed origins
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }
}

/// Serialized origin of a URL, `None` when it has none
pub fn origin_of(url: &str) -> Option<String> {
    let url = Url::parse(url.trim()).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
