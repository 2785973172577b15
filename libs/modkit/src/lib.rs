//! # ModKit - minimal module system
//!
//! Contracts and a runner for composing REST modules behind a single HTTP host.
//!
//! Lifecycle: REST (prepare → register → finalize) → start → wait → stop.
//!
//! ```rust,ignore
//! use modkit::{Module, RestfulModule};
//!
//! struct Users;
//! impl Module for Users { fn name(&self) -> &'static str { "users" } }
//! impl RestfulModule for Users { /* register_rest(...) */ }
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod context;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};

// Core module contracts and traits
pub mod contracts;
pub use contracts::*;

pub mod api;
pub use api::error::{ApiError, ApiResult};

pub mod runtime;
pub use runtime::{run, RunOptions, ShutdownOptions};
