//! Integration tests for the archive engine

mod engine_catalog;
mod engine_navigation;
mod properties;
mod support;
