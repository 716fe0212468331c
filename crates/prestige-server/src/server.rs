use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// HTTP front end for a built ingress router.
pub struct IngressServer {
    config: ServerConfig,
    router: Router,
}

impl IngressServer {
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self { config, router }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The router being served (useful for testing).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> ServerResult<TcpListener> {
        Ok(TcpListener::bind(self.config.bind_addr).await?)
    }

    /// Start serving requests until the process is stopped.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_until(std::future::pending()).await
    }

    /// Start serving requests until `shutdown` resolves.
    pub async fn serve_until<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!(%addr, "ingress listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        tracing::info!(%addr, "ingress stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn server_construction() {
        let server = IngressServer::new(ServerConfig::default(), Router::new());
        assert_eq!(server.config().bind_addr.port(), 3000);
        let _router = server.router();
    }

    #[tokio::test]
    async fn serves_until_shutdown() {
        let config = ServerConfig::default().with_bind_addr(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)));
        let server = IngressServer::new(config, Router::new());
        let listener = server.bind().await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_on(listener, async {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
