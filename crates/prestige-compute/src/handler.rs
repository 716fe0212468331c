use std::sync::Arc;

use async_trait::async_trait;
use prestige_gate::ScopedStores;
use uuid::Uuid;

use crate::error::InvocationError;
use crate::request::{ProxyRequest, ProxyResponse};

/// Per-invocation context handed to a handler.
#[derive(Clone, Debug)]
pub struct InvocationContext {
    pub unit: String,
    pub request_id: Uuid,
    /// The only way a handler reaches storage.
    pub stores: Arc<ScopedStores>,
}

/// The entry point of a compute unit.
///
/// Implementations must be stateless across invocations: anything that
/// outlives one request belongs in a store.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(
        &self,
        request: ProxyRequest,
        ctx: &InvocationContext,
    ) -> Result<ProxyResponse, InvocationError>;
}

#[async_trait]
impl<F> Handler for F
where
    F: Fn(ProxyRequest, &InvocationContext) -> Result<ProxyResponse, InvocationError>
        + Send
        + Sync,
{
    async fn invoke(
        &self,
        request: ProxyRequest,
        ctx: &InvocationContext,
    ) -> Result<ProxyResponse, InvocationError> {
        self(request, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prestige_types::HttpMethod;

    fn ctx() -> InvocationContext {
        InvocationContext {
            unit: "Rankings".into(),
            request_id: Uuid::now_v7(),
            stores: Arc::new(ScopedStores::empty("Rankings")),
        }
    }

    #[tokio::test]
    async fn closure_is_a_handler() {
        let handler = |req: ProxyRequest, ctx: &InvocationContext| -> Result<ProxyResponse, InvocationError> {
            Ok(ProxyResponse::text(200, format!("{} {}", ctx.unit, req.path)))
        };
        let resp = handler
            .invoke(ProxyRequest::new(HttpMethod::Get, "/rankings"), &ctx())
            .await
            .unwrap();
        assert_eq!(resp.body, "Rankings /rankings");
    }

    #[tokio::test]
    async fn handler_errors_pass_through() {
        let handler = |_req: ProxyRequest, _ctx: &InvocationContext| -> Result<ProxyResponse, InvocationError> {
            Err(InvocationError::handler("boom"))
        };
        let err = handler
            .invoke(ProxyRequest::new(HttpMethod::Get, "/rankings"), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, InvocationError::Handler(msg) if msg == "boom"));
    }
}
