//! Browser-facing pages and the JSON search endpoint.

pub mod handlers;
pub mod pages;
