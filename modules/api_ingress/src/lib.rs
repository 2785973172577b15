use async_trait::async_trait;
use std::sync::Arc;

use arc_swap::ArcSwap;

use anyhow::Result;
use axum::{extract::DefaultBodyLimit, middleware::from_fn, routing::get, Router};
use modkit::context::ModuleCtx;
use modkit::contracts::{Module, OpenApiRegistry, RestHostModule, StatefulModule};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::openapi::{Info, OpenApi, Paths};

mod config;
pub mod cors;
pub mod request_id;
pub mod web;

pub use config::ApiIngressConfig;

pub const MODULE_NAME: &str = "api_ingress";

/// HTTP host: composes module routers behind the global middleware stack,
/// collects their OpenAPI fragments and serves until cancelled.
pub struct ApiIngress {
    // Read-mostly; swapped once per REST phase
    config: ArcSwap<ApiIngressConfig>,
    default_bind_addr: String,
    request_timeout: Option<Duration>,
    final_router: Mutex<Option<Router>>,
    openapi: Mutex<OpenApi>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new("127.0.0.1:8080", None)
    }
}

impl ApiIngress {
    /// `default_bind_addr` is used when the module section leaves `bind_addr` empty.
    pub fn new(default_bind_addr: impl Into<String>, request_timeout: Option<Duration>) -> Self {
        Self {
            config: ArcSwap::from_pointee(ApiIngressConfig::default()),
            default_bind_addr: default_bind_addr.into(),
            request_timeout,
            final_router: Mutex::new(None),
            openapi: Mutex::new(OpenApi::new(
                Info::new("Users Server API", env!("CARGO_PKG_VERSION")),
                Paths::new(),
            )),
        }
    }

    /// Current configuration (cheap clone from ArcSwap).
    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    /// Replace the configuration; takes effect on the next `rest_finalize`.
    pub fn set_config(&self, cfg: ApiIngressConfig) {
        self.config.store(Arc::new(cfg));
    }

    /// The finalized router, if the REST phase has run.
    pub fn router(&self) -> Option<Router> {
        self.final_router.lock().clone()
    }

    /// Snapshot of the merged OpenAPI document.
    pub fn openapi_doc(&self) -> OpenApi {
        self.openapi.lock().clone()
    }

    fn bind_addr(&self) -> String {
        let cfg = self.config.load();
        if cfg.bind_addr.trim().is_empty() {
            self.default_bind_addr.clone()
        } else {
            cfg.bind_addr.clone()
        }
    }

    /// Attach the fallback and global middleware to a fully registered router.
    ///
    /// Layer order, outermost first:
    /// SetRequestId -> PropagateRequestId -> Trace -> CORS -> Timeout -> BodyLimit
    ///
    /// CORS wraps the routed app as a whole, so `OPTIONS` is answered before
    /// any route or method matching takes place.
    fn apply_middleware(&self, router: Router) -> Router {
        let cfg = self.get_config();
        let x_request_id = request_id::header();

        // The tower-http limit is the only one; axum's 2 MiB extractor default is off.
        let mut routed = router
            .fallback(web::not_found)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));

        if let Some(timeout) = self.request_timeout {
            routed = routed.layer(TimeoutLayer::new(timeout));
        }

        let mut app = Router::new().fallback_service(routed);
        if cfg.cors_enabled {
            app = app.layer(from_fn(cors::permissive_cors));
        }

        app.layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }
}

impl Module for ApiIngress {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }
}

// REST host role: prepare/finalize the router, but do not start the server here.
impl RestHostModule for ApiIngress {
    fn rest_prepare(&self, ctx: &ModuleCtx, router: Router) -> Result<Router> {
        self.set_config(ctx.module_config::<ApiIngressConfig>());
        tracing::debug!("REST host prepared base router with health check");
        Ok(router.route(
            "/health",
            get(web::health_check).fallback(web::not_found),
        ))
    }

    fn rest_finalize(&self, _ctx: &ModuleCtx, mut router: Router) -> Result<Router> {
        if self.get_config().enable_docs {
            let doc = Arc::new(serde_json::to_value(self.openapi_doc())?);
            router = router.route(
                "/openapi.json",
                get(move || {
                    let doc = doc.clone();
                    async move { axum::Json((*doc).clone()) }
                })
                .fallback(web::not_found),
            );
        }

        let router = self.apply_middleware(router);
        *self.final_router.lock() = Some(router.clone());

        tracing::debug!("REST host finalized router");
        Ok(router)
    }

    fn as_registry(&self) -> &dyn OpenApiRegistry {
        self
    }
}

#[async_trait]
impl StatefulModule for ApiIngress {
    /// Bind, serve until cancelled, then drain in-flight requests.
    async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let raw = self.bind_addr();
        let addr: SocketAddr = raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", raw, e))?;

        // Take the finalized router so the MutexGuard is dropped before awaits
        let stored = { self.final_router.lock().clone() };
        let router = match stored {
            Some(r) => r,
            None => {
                tracing::debug!("No router from REST phase, serving middleware-only router");
                self.apply_middleware(Router::new())
            }
        };

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server bound on {}", listener.local_addr()?);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

impl OpenApiRegistry for ApiIngress {
    fn register_openapi(&self, doc: OpenApi) {
        let paths = doc.paths.paths.len();
        self.openapi.lock().merge(doc);
        tracing::debug!(paths, "Merged OpenAPI fragment");
    }
}
