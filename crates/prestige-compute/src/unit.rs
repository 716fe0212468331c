use std::sync::Arc;

use prestige_gate::ScopedStores;
use prestige_types::{ComputeUnitDefinition, Runtime};
use tracing::Instrument;

use crate::catalog::ArtifactCatalog;
use crate::error::{ComputeResult, InvocationError};
use crate::handler::{Handler, InvocationContext};
use crate::request::{ProxyRequest, ProxyResponse};

/// A provisioned, invokable compute unit.
#[derive(Clone)]
pub struct ComputeUnit {
    definition: ComputeUnitDefinition,
    handler: Arc<dyn Handler>,
    stores: Arc<ScopedStores>,
}

impl ComputeUnit {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn runtime(&self) -> Runtime {
        self.definition.runtime
    }

    pub fn definition(&self) -> &ComputeUnitDefinition {
        &self.definition
    }

    pub fn stores(&self) -> &Arc<ScopedStores> {
        &self.stores
    }

    /// Run one invocation. Each call is independent; errors are returned
    /// unchanged.
    pub async fn invoke(&self, request: ProxyRequest) -> Result<ProxyResponse, InvocationError> {
        let ctx = InvocationContext {
            unit: self.definition.name.clone(),
            request_id: request.request_id,
            stores: Arc::clone(&self.stores),
        };
        let span = tracing::info_span!(
            "invoke",
            unit = %ctx.unit,
            request_id = %ctx.request_id,
            method = request.method.as_str(),
            path = %request.path,
        );

        async move {
            tracing::debug!("invocation started");
            let result = self.handler.invoke(request, &ctx).await;
            match &result {
                Ok(resp) => tracing::debug!(status = resp.status, "invocation finished"),
                Err(e) => tracing::warn!(error = %e, "invocation failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for ComputeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeUnit")
            .field("name", &self.definition.name)
            .field("runtime", &self.definition.runtime)
            .field("entry_point", &self.definition.entry_point)
            .finish()
    }
}

/// Provisions compute units from their definitions.
pub struct ComputeProvisioner;

impl ComputeProvisioner {
    /// Resolve the unit's artifact and bind it to its scoped stores.
    ///
    /// An unresolvable artifact or entry point is fatal.
    pub fn provision(
        definition: &ComputeUnitDefinition,
        catalog: &dyn ArtifactCatalog,
        stores: Arc<ScopedStores>,
    ) -> ComputeResult<ComputeUnit> {
        definition.validate()?;
        let handler = catalog.resolve(definition)?;
        tracing::info!(
            unit = %definition.name,
            runtime = %definition.runtime,
            entry_point = %definition.entry_point,
            stores = ?stores.attached().collect::<Vec<_>>(),
            "compute unit provisioned"
        );
        Ok(ComputeUnit {
            definition: definition.clone(),
            handler,
            stores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::error::ComputeError;
    use crate::stub::EchoHandler;
    use prestige_gate::{GateError, GrantResolver};
    use prestige_store::{InMemoryTable, Item, TableStore};
    use prestige_types::{AccessGrant, HttpMethod, KeySchema};
    use std::collections::BTreeMap;

    struct CountCompanies;

    #[async_trait::async_trait]
    impl Handler for CountCompanies {
        async fn invoke(
            &self,
            _request: ProxyRequest,
            ctx: &InvocationContext,
        ) -> Result<ProxyResponse, InvocationError> {
            let mut item = Item::new();
            item.insert("Company".into(), "Acme".into());
            ctx.stores.table("prestige-companies").put_item(item)?;
            let count = ctx.stores.table("prestige-companies").item_count()?;
            ctx.stores.table("prestige-matchups").scan()?;
            Ok(ProxyResponse::text(200, count.to_string()))
        }
    }

    fn rankings_def() -> ComputeUnitDefinition {
        ComputeUnitDefinition::new("Rankings", Runtime::Go1x, "services/rankings-api", "main")
    }

    fn rankings_stores() -> Arc<ScopedStores> {
        let companies: Arc<dyn TableStore> = Arc::new(InMemoryTable::new(
            "prestige-companies",
            KeySchema::string("Company"),
        ));
        let matchups: Arc<dyn TableStore> = Arc::new(InMemoryTable::new(
            "prestige-matchups",
            KeySchema::string("VerificationCode"),
        ));
        let provisioned: BTreeMap<_, _> = [
            ("prestige-companies".to_string(), companies),
            ("prestige-matchups".to_string(), matchups),
        ]
        .into_iter()
        .collect();
        let grants = vec![AccessGrant::read_write("Rankings", "prestige-companies")];
        let mut policies = GrantResolver::resolve(["Rankings"], &grants);
        let policy = policies.remove("Rankings").unwrap();
        Arc::new(ScopedStores::new(policy, &provisioned).unwrap())
    }

    #[tokio::test]
    async fn provision_and_invoke() {
        let catalog = InMemoryCatalog::new().with("services/rankings-api", "main", Arc::new(EchoHandler));
        let unit = ComputeProvisioner::provision(&rankings_def(), &catalog, rankings_stores()).unwrap();
        assert_eq!(unit.name(), "Rankings");
        assert_eq!(unit.runtime(), Runtime::Go1x);

        let req = ProxyRequest::new(HttpMethod::Get, "/rankings");
        let id = req.request_id;
        let resp = unit.invoke(req).await.unwrap();
        let body = resp.json_body().unwrap();
        assert_eq!(body["requestId"], id.to_string());
        assert_eq!(body["stores"], serde_json::json!(["prestige-companies"]));
    }

    #[tokio::test]
    async fn ungranted_store_access_surfaces_as_error() {
        let catalog = InMemoryCatalog::new().with("services/rankings-api", "main", Arc::new(CountCompanies));
        let unit = ComputeProvisioner::provision(&rankings_def(), &catalog, rankings_stores()).unwrap();

        let err = unit
            .invoke(ProxyRequest::new(HttpMethod::Get, "/rankings"))
            .await
            .unwrap_err();
        assert!(matches!(err, InvocationError::Gate(ref e) if e.is_access_denied()));
        assert!(matches!(err, InvocationError::Gate(GateError::AccessDenied { ref store, .. }) if store == "prestige-matchups"));

        // The granted write before the denial went through.
        assert_eq!(unit.stores().table("prestige-companies").item_count().unwrap(), 1);
    }

    #[test]
    fn unresolvable_artifact_fails_provisioning() {
        let catalog = InMemoryCatalog::new();
        let err = ComputeProvisioner::provision(&rankings_def(), &catalog, rankings_stores()).unwrap_err();
        assert!(matches!(err, ComputeError::ArtifactNotFound { .. }));
    }
}
