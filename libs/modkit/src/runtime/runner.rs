//! ModKit runtime runner.
//!
//! One stable `ModuleCtx` is built up front and scoped per module for every
//! phase. Shutdown can be driven by OS signals, an external
//! `CancellationToken`, or an arbitrary future.

use crate::context::{ConfigProvider, ModuleCtxBuilder};
use crate::contracts::{RestHostModule, RestfulModule};
use crate::runtime::shutdown;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

/// How the runtime should decide when to stop.
pub enum ShutdownOptions {
    /// Listen for OS signals (Ctrl+C / SIGTERM).
    Signals,
    /// An external `CancellationToken` controls the lifecycle.
    Token(CancellationToken),
    /// An arbitrary future; when it completes, we initiate shutdown.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

/// Options for running the ModKit runner.
pub struct RunOptions {
    /// Provider of module config sections (raw JSON by module name).
    pub modules_cfg: Arc<dyn ConfigProvider>,
    /// The module that owns the HTTP listener.
    pub host: Arc<dyn RestHostModule>,
    /// REST modules, registered in order.
    pub modules: Vec<Arc<dyn RestfulModule>>,
    /// Shutdown strategy.
    pub shutdown: ShutdownOptions,
}

/// Turn the shutdown option into a token the host can await.
fn shutdown_token(shutdown: ShutdownOptions) -> CancellationToken {
    match shutdown {
        ShutdownOptions::Token(token) => {
            tracing::info!("shutdown: driven by external token");
            token
        }
        ShutdownOptions::Signals => {
            let token = CancellationToken::new();
            let trigger = token.clone();
            tokio::spawn(async move {
                if let Err(e) = shutdown::wait_for_shutdown().await {
                    tracing::warn!(error = %e, "shutdown: signal handler unavailable, waiting for ctrl_c");
                    let _ = tokio::signal::ctrl_c().await;
                }
                tracing::info!("shutdown: signal received");
                trigger.cancel();
            });
            token
        }
        ShutdownOptions::Future(waiter) => {
            let token = CancellationToken::new();
            let trigger = token.clone();
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                trigger.cancel();
            });
            token
        }
    }
}

/// prepare → register → finalize → start; returns once the host has stopped.
pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let RunOptions {
        modules_cfg,
        host,
        modules,
        shutdown,
    } = opts;
    let cancel = shutdown_token(shutdown);

    let base_ctx = ModuleCtxBuilder::new(cancel.clone())
        .with_config_provider(modules_cfg)
        .build();
    let host_ctx = base_ctx.for_module(host.name());

    tracing::info!(modules = modules.len(), "Phase: rest");
    let mut router = host.rest_prepare(&host_ctx, axum::Router::new())?;
    for module in &modules {
        let ctx = base_ctx.for_module(module.name());
        router = module.register_rest(&ctx, router, host.as_registry())?;
        tracing::debug!(module = module.name(), "REST routes registered");
    }
    host.rest_finalize(&host_ctx, router)?;

    tracing::info!("Phase: start");
    host.start(cancel).await?;

    tracing::info!("Phase: stop");
    Ok(())
}
