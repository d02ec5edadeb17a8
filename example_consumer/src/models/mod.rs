//! Host models. Everything under this module is picked up by discovery.

pub mod catalog;
pub mod notes;
