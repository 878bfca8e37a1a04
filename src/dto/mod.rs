//! Wire shapes exchanged with the list, mutation and export endpoints.

pub mod export;
pub mod list;
pub mod mutation;
pub mod record;
