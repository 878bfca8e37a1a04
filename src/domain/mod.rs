//! Domain values shared by the list controller and its collaborators.

pub mod notification;
pub mod query;
pub mod record;
pub mod types;
