//! The list view engine and the async services driving it.

pub mod change;
pub mod controller;
pub mod debounce;
pub mod errors;
pub mod export;
pub mod fetch;
pub mod list;
pub mod mutation;
pub mod reconcile;
pub mod store;

pub use errors::{ServiceError, ServiceResult};
