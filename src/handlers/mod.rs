//! HTTP handlers for the admin pages and the JSON API.

pub mod admin;
pub mod api;
