use std::collections::BTreeMap;

use bytes::Bytes;
use prestige_types::HttpMethod;
use serde_json::Value;
use uuid::Uuid;

/// A request as delivered to a compute unit.
///
/// Headers and query parameters come in two forms: the single-value maps
/// hold the last value seen for each name, the `multi_value_*` maps hold
/// every value in arrival order.
#[derive(Clone, Debug)]
pub struct ProxyRequest {
    pub request_id: Uuid,
    pub method: HttpMethod,
    /// Full request path, e.g. `/matchup/abc`.
    pub path: String,
    /// The matched resource, e.g. `/matchup`.
    pub resource: String,
    pub query: BTreeMap<String, String>,
    pub multi_value_query: BTreeMap<String, Vec<String>>,
    /// Header names are lowercased.
    pub headers: BTreeMap<String, String>,
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    pub body: Bytes,
}

impl ProxyRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        let resource = match first_segment(&path) {
            Some(segment) => format!("/{segment}"),
            None => "/".to_string(),
        };
        Self {
            request_id: Uuid::now_v7(),
            method,
            path,
            resource,
            query: BTreeMap::new(),
            multi_value_query: BTreeMap::new(),
            headers: BTreeMap::new(),
            multi_value_headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    /// Append a header value. Repeated names keep every value.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        let name = name.as_ref().to_ascii_lowercase();
        let value = value.into();
        self.multi_value_headers
            .entry(name.clone())
            .or_default()
            .push(value.clone());
        self.headers.insert(name, value);
        self
    }

    /// Append a decoded query parameter. Repeated keys keep every value.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        self.multi_value_query
            .entry(key.clone())
            .or_default()
            .push(value.clone());
        self.query.insert(key, value);
        self
    }

    pub fn with_query_pairs<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(self, |req, (k, v)| req.with_query_param(k, v))
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn header_values(&self, name: &str) -> &[String] {
        self.multi_value_headers
            .get(&name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    pub fn query_values(&self, key: &str) -> &[String] {
        self.multi_value_query.get(key).map_or(&[], Vec::as_slice)
    }

    /// Decode the body as JSON. An empty body is `None`.
    pub fn json_body(&self) -> Result<Option<Value>, serde_json::Error> {
        if self.body.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(&self.body).map(Some)
    }
}

/// First non-empty path segment.
pub fn first_segment(path: &str) -> Option<&str> {
    path.split('/').find(|s| !s.is_empty())
}

/// A response as returned by a compute unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Headers sent once per value, e.g. several `Set-Cookie`. A name present
    /// here takes precedence over the same name in `headers`.
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    pub body: Bytes,
}

impl ProxyResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            multi_value_headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn json(status: u16, value: &Value) -> Self {
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(value.to_string())
    }

    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(text.into())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_multi_value_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.multi_value_headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json_body(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_is_first_segment() {
        assert_eq!(ProxyRequest::new(HttpMethod::Get, "/matchup/abc").resource, "/matchup");
        assert_eq!(ProxyRequest::new(HttpMethod::Get, "/rankings").resource, "/rankings");
        assert_eq!(ProxyRequest::new(HttpMethod::Get, "/").resource, "/");
    }

    #[test]
    fn first_segment_skips_empty() {
        assert_eq!(first_segment("//rankings/x"), Some("rankings"));
        assert_eq!(first_segment(""), None);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let req = ProxyRequest::new(HttpMethod::Post, "/matchup").with_header("Content-Type", "application/json");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn repeated_headers_keep_every_value() {
        let req = ProxyRequest::new(HttpMethod::Get, "/rankings")
            .with_header("X-Id", "one")
            .with_header("x-id", "two");
        assert_eq!(req.header("x-id"), Some("two"));
        assert_eq!(req.header_values("X-ID"), ["one", "two"]);
        assert!(req.header_values("missing").is_empty());
    }

    #[test]
    fn repeated_query_keys_keep_every_value() {
        let req = ProxyRequest::new(HttpMethod::Get, "/rankings")
            .with_query_pairs([("tag", "a"), ("tag", "b"), ("limit", "5")]);
        assert_eq!(req.query["tag"], "b");
        assert_eq!(req.query_values("tag"), ["a", "b"]);
        assert_eq!(req.query_values("limit"), ["5"]);
    }

    #[test]
    fn json_body() {
        let req = ProxyRequest::new(HttpMethod::Post, "/matchup")
            .with_body(r#"{"verificationCode":"abc","winner":1}"#);
        assert_eq!(req.json_body().unwrap().unwrap()["winner"], 1);
        assert!(ProxyRequest::new(HttpMethod::Get, "/").json_body().unwrap().is_none());
    }

    #[test]
    fn json_response() {
        let resp = ProxyResponse::json(200, &json!({"ok": true}));
        assert!(resp.is_success());
        assert_eq!(resp.headers["Content-Type"], "application/json");
        assert_eq!(resp.json_body().unwrap(), json!({"ok": true}));
    }

    #[test]
    fn multi_value_response_headers_accumulate() {
        let resp = ProxyResponse::new(200)
            .with_multi_value_header("Set-Cookie", "a=1")
            .with_multi_value_header("Set-Cookie", "b=2");
        assert_eq!(resp.multi_value_headers["Set-Cookie"], ["a=1", "b=2"]);
    }
}
