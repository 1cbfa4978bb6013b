//! Shared WebSocket adapter state.

use std::sync::Arc;

use url::{Origin, Url};

use crate::domain::ports::ChangeFeedQuery;

/// Browser origins allowed to open the change feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginPolicy {
    allowed: Vec<Origin>,
}

impl OriginPolicy {
    /// Parse a comma-separated list such as
    /// `https://ledger.example.com,http://localhost:3000`.
    ///
    /// # Examples
    /// ```
    /// use advance_ledger::inbound::ws::state::OriginPolicy;
    /// use url::Url;
    ///
    /// let policy = OriginPolicy::from_list("https://ledger.example.com").expect("valid list");
    /// assert!(policy.allows(&Url::parse("https://ledger.example.com").expect("url")));
    /// assert!(!policy.allows(&Url::parse("https://evil.example.com").expect("url")));
    /// ```
    pub fn from_list(list: &str) -> Result<Self, url::ParseError> {
        let allowed = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| Url::parse(entry).map(|url| url.origin()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { allowed })
    }

    pub fn allows(&self, origin: &Url) -> bool {
        let origin = origin.origin();
        origin.is_tuple() && self.allowed.contains(&origin)
    }
}

/// Dependency bundle for the WebSocket entry point.
#[derive(Clone)]
pub struct WsState {
    pub feed: Arc<dyn ChangeFeedQuery>,
    pub origins: OriginPolicy,
}

impl WsState {
    pub fn new(feed: Arc<dyn ChangeFeedQuery>, origins: OriginPolicy) -> Self {
        Self { feed, origins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:3000", true)]
    #[case("http://localhost:4000", false)]
    #[case("https://ledger.example.com", true)]
    #[case("https://ledger.example.com.evil.com", false)]
    #[case("http://ledger.example.com", false)]
    fn matches_scheme_host_and_port(#[case] origin: &str, #[case] expected: bool) {
        let policy =
            OriginPolicy::from_list("https://ledger.example.com, http://localhost:3000")
                .expect("valid list");
        let origin = Url::parse(origin).expect("url");
        assert_eq!(policy.allows(&origin), expected);
    }

    #[rstest]
    fn empty_list_allows_nothing() {
        let policy = OriginPolicy::from_list("").expect("empty list");
        assert!(!policy.allows(&Url::parse("http://localhost:3000").expect("url")));
    }
}
