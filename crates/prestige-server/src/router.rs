//! Path-based ingress routing in front of compute units.
//!
//! Each registered route answers on `/<segment>` and everything below it.
//! CORS applies to `OPTIONS` on registered routes only; every other method is
//! forwarded to the unit and its response goes back untouched. Unmatched
//! paths fall through to a `404`.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{options, MethodRouter};
use axum::Router;
use prestige_compute::{ComputeUnit, ProxyRequest, ProxyResponse};
use prestige_types::{AllowMethods, AllowOrigins, CorsPolicy, HttpMethod, RouteDefinition};
use serde_json::json;
use tokio::sync::Semaphore;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// A route together with the unit serving it.
#[derive(Clone, Debug)]
pub struct RouteBinding {
    pub route: RouteDefinition,
    pub unit: Arc<ComputeUnit>,
}

/// Builder for the ingress [`Router`].
#[derive(Debug)]
pub struct IngressRouter {
    cors: CorsPolicy,
    config: ServerConfig,
    routes: BTreeMap<String, RouteBinding>,
}

impl IngressRouter {
    pub fn new(cors: CorsPolicy, config: ServerConfig) -> Self {
        Self {
            cors,
            config,
            routes: BTreeMap::new(),
        }
    }

    /// Bind `route` to `unit`. Each path segment can be bound once.
    pub fn bind(&mut self, route: RouteDefinition, unit: Arc<ComputeUnit>) -> ServerResult<()> {
        route.validate()?;
        if route.unit != unit.name() {
            return Err(ServerError::UnitMismatch {
                segment: route.path_segment.clone(),
                expected: route.unit.clone(),
                actual: unit.name().to_string(),
            });
        }
        if self.routes.contains_key(&route.path_segment) {
            return Err(ServerError::DuplicateRoute(route.path()));
        }
        tracing::info!(path = %route.path(), unit = %route.unit, methods = %route.methods, "route bound");
        self.routes
            .insert(route.path_segment.clone(), RouteBinding { route, unit });
        Ok(())
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteBinding> {
        self.routes.values()
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the axum router.
    pub fn build(&self) -> Router {
        let mut router = Router::new();
        for binding in self.routes.values() {
            let path = binding.route.path();
            let state = Arc::new(RouteState {
                methods: binding.route.methods.clone(),
                unit: Arc::clone(&binding.unit),
                timeout: binding
                    .route
                    .limits
                    .timeout
                    .unwrap_or(self.config.integration_timeout),
                limiter: binding
                    .route
                    .limits
                    .max_concurrency
                    .map(|n| Arc::new(Semaphore::new(n))),
                max_body_bytes: self.config.max_body_bytes,
            });
            let methods: MethodRouter<Arc<RouteState>> = options(preflight)
                .route_layer(cors_layer(&self.cors))
                .fallback(dispatch);
            let route: Router = Router::new()
                .route(&path, methods.clone())
                .route(&format!("{path}/*rest"), methods)
                .with_state(state);
            router = router.merge(route);
        }
        router
            .fallback(not_found)
            .layer(TraceLayer::new_for_http())
    }
}

struct RouteState {
    methods: prestige_types::MethodMatch,
    unit: Arc<ComputeUnit>,
    timeout: Duration,
    limiter: Option<Arc<Semaphore>>,
    max_body_bytes: usize,
}

/// Translate a [`CorsPolicy`] into a tower-http layer.
pub fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    let origins = match &policy.allow_origins {
        AllowOrigins::Any => cors::AllowOrigin::any(),
        AllowOrigins::List(list) if list.iter().any(|o| o == "*") => cors::AllowOrigin::any(),
        AllowOrigins::List(list) => {
            cors::AllowOrigin::list(list.iter().filter_map(|o| HeaderValue::from_str(o).ok()))
        }
    };
    let methods = match &policy.allow_methods {
        AllowMethods::Any => cors::AllowMethods::any(),
        AllowMethods::List(list) => cors::AllowMethods::list(
            list.iter()
                .filter_map(|m| Method::from_bytes(m.as_str().as_bytes()).ok()),
        ),
    };
    let headers = cors::AllowHeaders::list(
        policy
            .allow_headers
            .names()
            .iter()
            .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok()),
    );

    let layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers);
    match policy.max_age() {
        Some(max_age) => layer.max_age(max_age),
        None => layer,
    }
}

async fn dispatch(State(state): State<Arc<RouteState>>, request: Request) -> Response {
    let Ok(method) = HttpMethod::from_str(request.method().as_str()) else {
        return message(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    };
    if !state.methods.accepts(method) {
        return message(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    let _permit = match &state.limiter {
        Some(limiter) => match Arc::clone(limiter).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(unit = %state.unit.name(), "concurrency limit reached");
                return message(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests");
            }
        },
        None => None,
    };

    let (parts, body) = request.into_parts();
    let declared_len = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > state.max_body_bytes) {
        return message(StatusCode::PAYLOAD_TOO_LARGE, "Request Too Long");
    }
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => return message(StatusCode::PAYLOAD_TOO_LARGE, "Request Too Long"),
    };

    let Ok(Query(query)) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) else {
        return message(StatusCode::BAD_REQUEST, "Invalid query string");
    };
    let mut proxy = ProxyRequest::new(method, parts.uri.path())
        .with_query_pairs(query)
        .with_body(body);
    for (name, value) in &parts.headers {
        match value.to_str() {
            Ok(value) => proxy = proxy.with_header(name.as_str(), value),
            Err(_) => tracing::warn!(header = %name, "dropping non-UTF-8 request header"),
        }
    }

    let request_id = proxy.request_id;
    match tokio::time::timeout(state.timeout, state.unit.invoke(proxy)).await {
        Ok(Ok(response)) => to_http(response),
        Ok(Err(e)) => {
            tracing::warn!(unit = %state.unit.name(), %request_id, error = %e, "unit invocation failed");
            message(StatusCode::BAD_GATEWAY, "Internal server error")
        }
        Err(_) => {
            tracing::warn!(
                unit = %state.unit.name(),
                %request_id,
                timeout_ms = state.timeout.as_millis() as u64,
                "unit invocation timed out"
            );
            message(StatusCode::GATEWAY_TIMEOUT, "Endpoint request timed out")
        }
    }
}

/// Return the unit's response as-is.
fn to_http(response: ProxyResponse) -> Response {
    let Ok(status) = StatusCode::from_u16(response.status) else {
        tracing::warn!(status = response.status, "unit returned an invalid status code");
        return message(StatusCode::BAD_GATEWAY, "Internal server error");
    };
    let mut out = Response::new(Body::from(response.body));
    *out.status_mut() = status;
    let single = response
        .headers
        .iter()
        .filter(|(name, _)| !response.multi_value_headers.contains_key(*name));
    let multi = response
        .multi_value_headers
        .iter()
        .flat_map(|(name, values)| values.iter().map(move |value| (name, value)));
    for (name, value) in single.chain(multi) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                out.headers_mut().append(name, value);
            }
            _ => tracing::warn!(header = %name, "dropping invalid response header"),
        }
    }
    out
}

/// Inner service of the CORS layer, which answers `OPTIONS` itself.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found() -> Response {
    message(StatusCode::NOT_FOUND, "Not Found")
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}
