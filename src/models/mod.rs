//! Models loaded from outside the process.

pub mod config;
