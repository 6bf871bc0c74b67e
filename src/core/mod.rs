//! Core module - Configuration, errors, sessions and scope hints

pub mod config;
pub mod error;
pub mod scope;
pub mod sessions;
