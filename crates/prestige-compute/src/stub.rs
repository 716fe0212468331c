use async_trait::async_trait;
use serde_json::json;

use crate::error::InvocationError;
use crate::handler::{Handler, InvocationContext};
use crate::request::{ProxyRequest, ProxyResponse};

/// Local-development handler: answers `200` with a JSON description of the
/// request and the stores the unit can reach.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn invoke(
        &self,
        request: ProxyRequest,
        ctx: &InvocationContext,
    ) -> Result<ProxyResponse, InvocationError> {
        let body = match request.json_body() {
            Ok(Some(value)) => value,
            Ok(None) => serde_json::Value::Null,
            Err(_) => json!(String::from_utf8_lossy(&request.body)),
        };
        let stores: Vec<&str> = ctx.stores.attached().collect();
        tracing::debug!(unit = %ctx.unit, path = %request.path, "echo");
        Ok(ProxyResponse::json(
            200,
            &json!({
                "unit": ctx.unit,
                "requestId": ctx.request_id.to_string(),
                "method": request.method.as_str(),
                "path": request.path,
                "resource": request.resource,
                "query": request.query,
                "multiValueQuery": request.multi_value_query,
                "headers": request.headers,
                "multiValueHeaders": request.multi_value_headers,
                "body": body,
                "stores": stores,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prestige_gate::ScopedStores;
    use prestige_types::HttpMethod;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn echoes_request() {
        let ctx = InvocationContext {
            unit: "Matchup".into(),
            request_id: Uuid::now_v7(),
            stores: Arc::new(ScopedStores::empty("Matchup")),
        };
        let req = ProxyRequest::new(HttpMethod::Post, "/matchup/abc")
            .with_query_param("company", "Acme")
            .with_query_param("tag", "a")
            .with_query_param("tag", "b")
            .with_body(r#"{"winner":1}"#);
        let resp = EchoHandler.invoke(req, &ctx).await.unwrap();
        assert_eq!(resp.status, 200);

        let body = resp.json_body().unwrap();
        assert_eq!(body["unit"], "Matchup");
        assert_eq!(body["method"], "POST");
        assert_eq!(body["resource"], "/matchup");
        assert_eq!(body["query"]["company"], "Acme");
        assert_eq!(body["multiValueQuery"]["tag"], json!(["a", "b"]));
        assert_eq!(body["body"]["winner"], 1);
        assert_eq!(body["stores"], json!([]));
    }

    #[tokio::test]
    async fn non_json_body_echoed_as_text() {
        let ctx = InvocationContext {
            unit: "Rankings".into(),
            request_id: Uuid::now_v7(),
            stores: Arc::new(ScopedStores::empty("Rankings")),
        };
        let req = ProxyRequest::new(HttpMethod::Put, "/rankings").with_body("plain");
        let body = EchoHandler.invoke(req, &ctx).await.unwrap().json_body().unwrap();
        assert_eq!(body["body"], "plain");
    }
}
