//! Integration tests for the application context over in-memory backends.

#[path = "../common/mod.rs"]
mod common;

mod acquittal;
mod cartography;
mod connectors;
mod flush;
mod lifecycle;
