#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use api_ingress::ApiIngress;
use axum::{body::Body, http::Request, response::Response, Router};
use modkit::context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};
use modkit::contracts::RestHostModule;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct MapProvider(HashMap<String, serde_json::Value>);

impl ConfigProvider for MapProvider {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get(module_name)
    }
}

pub fn host_ctx(ingress_cfg: serde_json::Value) -> ModuleCtx {
    let provider = MapProvider(HashMap::from([(
        api_ingress::MODULE_NAME.to_string(),
        ingress_cfg,
    )]));
    ModuleCtxBuilder::new(CancellationToken::new())
        .with_config_provider(Arc::new(provider))
        .build()
        .for_module(api_ingress::MODULE_NAME)
}

/// Run prepare → (extra routes) → finalize the way the runner does.
pub fn finalized_router(
    host: &ApiIngress,
    ingress_cfg: serde_json::Value,
    extra: impl FnOnce(Router) -> Router,
) -> Router {
    let ctx = host_ctx(ingress_cfg);
    let router = host.rest_prepare(&ctx, Router::new()).unwrap();
    host.rest_finalize(&ctx, extra(router)).unwrap()
}

pub async fn send(router: &Router, req: Request<Body>) -> Response {
    router.clone().oneshot(req).await.unwrap()
}

pub async fn body_bytes(resp: Response) -> axum::body::Bytes {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
}
