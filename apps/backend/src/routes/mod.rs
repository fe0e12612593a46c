//! HTTP route handlers

pub mod auth;
pub mod identity;
pub mod results;
