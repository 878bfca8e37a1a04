//! Client-side controller for filterable, sortable, paginated record lists.
//!
//! [`services::controller::ListController`] keeps the query, the loaded page,
//! the selection and the fetch state machine consistent while the user types,
//! filters, pages and edits. The async functions in [`services`] drive it
//! against the collaborators defined in [`endpoints`].

pub mod domain;
pub mod dto;
pub mod endpoints;
mod error_conversions;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod services;

pub use services::controller::{ControllerSettings, ListController};
pub use services::{ServiceError, ServiceResult};
