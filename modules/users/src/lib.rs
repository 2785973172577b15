//! In-memory user directory exposed over `/users`.

pub mod api;
pub mod contract;
pub mod domain;
mod module;

pub use module::{Users, MODULE_NAME};
