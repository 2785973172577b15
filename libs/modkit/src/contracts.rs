use async_trait::async_trait;
use axum::Router;
use tokio_util::sync::CancellationToken;

pub use crate::api::OpenApiRegistry;

/// Every module has a stable name; it keys its config section and log target.
pub trait Module: Send + Sync + 'static {
    fn name(&self) -> &'static str;
}

/// Pure wiring; must be sync.
pub trait RestfulModule: Module {
    fn register_rest(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router>;
}

/// Long-running module; `start` returns once `cancel` fires and the module has stopped.
#[async_trait]
pub trait StatefulModule: Module {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}

/// REST host: owns the listener. Prepare/finalize run around module registration
/// and must not start the server.
pub trait RestHostModule: StatefulModule {
    /// Prepare a base Router (e.g. /health) before modules register.
    fn rest_prepare(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router>;

    /// Attach global middleware and keep the Router for `start`.
    fn rest_finalize(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router>;

    fn as_registry(&self) -> &dyn OpenApiRegistry;
}
