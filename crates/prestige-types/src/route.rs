use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// HTTP methods the ingress router forwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownMethod(s.to_string()))
    }
}

/// Which methods a route accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodMatch {
    /// Wildcard: every method.
    #[default]
    Any,
    Only(Vec<HttpMethod>),
}

impl MethodMatch {
    pub fn accepts(&self, method: HttpMethod) -> bool {
        match self {
            Self::Any => true,
            Self::Only(methods) => methods.contains(&method),
        }
    }
}

impl fmt::Display for MethodMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "ANY"),
            Self::Only(methods) => {
                let names: Vec<&str> = methods.iter().map(HttpMethod::as_str).collect();
                write!(f, "{}", names.join(","))
            }
        }
    }
}

/// Explicit per-route execution limits.
///
/// `None` means the gateway-wide default applies; the value is still visible
/// in the topology rather than inherited silently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLimits {
    #[serde(default, with = "opt_millis")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

impl RouteLimits {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }
}

/// A resource path bound to exactly one compute unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    /// First path segment, without slashes (`rankings` for `/rankings`).
    pub path_segment: String,
    pub methods: MethodMatch,
    /// Name of the bound compute unit.
    pub unit: String,
    #[serde(default)]
    pub limits: RouteLimits,
}

impl RouteDefinition {
    /// Route accepting any method.
    pub fn any(path_segment: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            path_segment: path_segment.into(),
            methods: MethodMatch::Any,
            unit: unit.into(),
            limits: RouteLimits::default(),
        }
    }

    pub fn with_methods(mut self, methods: MethodMatch) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_limits(mut self, limits: RouteLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Absolute path, e.g. `/rankings`.
    pub fn path(&self) -> String {
        format!("/{}", self.path_segment)
    }

    pub fn validate(&self) -> Result<(), TypeError> {
        let invalid = |reason: &str| TypeError::InvalidPathSegment {
            segment: self.path_segment.clone(),
            reason: reason.to_string(),
        };
        if self.path_segment.is_empty() {
            return Err(invalid("segment is empty"));
        }
        if self.path_segment.contains('/') {
            return Err(invalid("segment must not contain '/'"));
        }
        if !self
            .path_segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
        {
            return Err(invalid("segment must be URL-safe"));
        }
        if let MethodMatch::Only(methods) = &self.methods {
            if methods.is_empty() {
                return Err(TypeError::EmptyMethodSet {
                    segment: self.path_segment.clone(),
                });
            }
        }
        if self.limits.max_concurrency == Some(0) {
            return Err(TypeError::ZeroConcurrency {
                segment: self.path_segment.clone(),
            });
        }
        Ok(())
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_accepts_everything() {
        for m in HttpMethod::ALL {
            assert!(MethodMatch::Any.accepts(m));
        }
    }

    #[test]
    fn only_accepts_listed() {
        let methods = MethodMatch::Only(vec![HttpMethod::Get]);
        assert!(methods.accepts(HttpMethod::Get));
        assert!(!methods.accepts(HttpMethod::Post));
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("PROPFIND".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn path_has_leading_slash() {
        assert_eq!(RouteDefinition::any("rankings", "Rankings").path(), "/rankings");
    }

    #[test]
    fn segment_with_slash_rejected() {
        let route = RouteDefinition::any("a/b", "Unit");
        assert!(matches!(route.validate(), Err(TypeError::InvalidPathSegment { .. })));
    }

    #[test]
    fn empty_segment_rejected() {
        assert!(RouteDefinition::any("", "Unit").validate().is_err());
    }

    #[test]
    fn empty_method_list_rejected() {
        let route = RouteDefinition::any("x", "Unit").with_methods(MethodMatch::Only(vec![]));
        assert_eq!(
            route.validate(),
            Err(TypeError::EmptyMethodSet { segment: "x".into() })
        );
    }

    #[test]
    fn zero_concurrency_rejected() {
        let route = RouteDefinition::any("x", "Unit")
            .with_limits(RouteLimits::default().with_max_concurrency(0));
        assert!(matches!(route.validate(), Err(TypeError::ZeroConcurrency { .. })));
    }

    #[test]
    fn limits_serialize_as_millis() {
        let route = RouteDefinition::any("x", "Unit")
            .with_limits(RouteLimits::default().with_timeout(Duration::from_secs(3)));
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["limits"]["timeout"], 3000);
        let back: RouteDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(back.limits.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn method_match_display() {
        assert_eq!(MethodMatch::Any.to_string(), "ANY");
        let only = MethodMatch::Only(vec![HttpMethod::Get, HttpMethod::Post]);
        assert_eq!(only.to_string(), "GET,POST");
    }
}
