use std::sync::Arc;

use axum::Router;
use modkit::api::OpenApiRegistry;
use modkit::{Module, ModuleCtx, RestfulModule};

use crate::api::rest::routes;
use crate::domain::store::UserStore;

pub const MODULE_NAME: &str = "users";

/// REST module owning the user store. The store is created by the caller
/// and shared with the handlers through an `Extension`.
#[derive(Default)]
pub struct Users {
    store: Arc<UserStore>,
}

impl Users {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<UserStore> {
        &self.store
    }
}

impl Module for Users {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }
}

impl RestfulModule for Users {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router> {
        tracing::debug!(users = self.store.len(), "registering users routes");
        routes::register_routes(router, openapi, self.store.clone())
    }
}
