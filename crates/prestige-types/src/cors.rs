use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::route::HttpMethod;

/// Request headers allowed on cross-origin requests when no explicit list is given.
pub const DEFAULT_CORS_HEADERS: &[&str] = &[
    "Content-Type",
    "X-Amz-Date",
    "Authorization",
    "X-Api-Key",
    "X-Amz-Security-Token",
    "X-Amz-User-Agent",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowMethods {
    Any,
    List(Vec<HttpMethod>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowHeaders {
    /// [`DEFAULT_CORS_HEADERS`].
    Defaults,
    List(Vec<String>),
}

impl AllowHeaders {
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::Defaults => DEFAULT_CORS_HEADERS.iter().map(|h| h.to_string()).collect(),
            Self::List(list) => list.clone(),
        }
    }
}

/// Cross-origin policy applied uniformly to every registered route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsPolicy {
    pub allow_origins: AllowOrigins,
    pub allow_methods: AllowMethods,
    pub allow_headers: AllowHeaders,
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl CorsPolicy {
    /// Any origin, any method, default headers.
    pub const ALLOW_ALL: CorsPolicy = CorsPolicy {
        allow_origins: AllowOrigins::Any,
        allow_methods: AllowMethods::Any,
        allow_headers: AllowHeaders::Defaults,
        max_age_secs: None,
    };

    /// Returns `true` if a request from `origin` is permitted.
    pub fn allows_origin(&self, origin: &str) -> bool {
        match &self.allow_origins {
            AllowOrigins::Any => true,
            AllowOrigins::List(list) => list.iter().any(|o| o == origin),
        }
    }

    pub fn allows_method(&self, method: HttpMethod) -> bool {
        match &self.allow_methods {
            AllowMethods::Any => true,
            AllowMethods::List(list) => list.contains(&method),
        }
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_secs.map(Duration::from_secs)
    }

    /// Returns `true` if every origin and every method is allowed.
    pub fn is_unrestricted(&self) -> bool {
        matches!(self.allow_origins, AllowOrigins::Any)
            && matches!(self.allow_methods, AllowMethods::Any)
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::ALLOW_ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_all_is_unrestricted() {
        let policy = CorsPolicy::ALLOW_ALL;
        assert!(policy.is_unrestricted());
        assert!(policy.allows_origin("https://example.com"));
        assert!(policy.allows_method(HttpMethod::Delete));
        assert_eq!(policy.allow_headers.names().len(), DEFAULT_CORS_HEADERS.len());
    }

    #[test]
    fn restricted_policy() {
        let policy = CorsPolicy {
            allow_origins: AllowOrigins::List(vec!["https://prestige.dev".into()]),
            allow_methods: AllowMethods::List(vec![HttpMethod::Get]),
            allow_headers: AllowHeaders::List(vec!["Content-Type".into()]),
            max_age_secs: Some(600),
        };
        assert!(!policy.is_unrestricted());
        assert!(policy.allows_origin("https://prestige.dev"));
        assert!(!policy.allows_origin("https://evil.example"));
        assert!(!policy.allows_method(HttpMethod::Post));
        assert_eq!(policy.max_age(), Some(Duration::from_secs(600)));
    }
}
