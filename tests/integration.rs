//! Integration tests for the Tabula server.
//!
//! These tests run the complete pipeline and the HTTP surface against a
//! scripted stand-in for the text-generation backend; no network access or
//! API credential is required.

#[path = "integration/stub_backend.rs"]
mod stub_backend;

#[path = "integration/test_api.rs"]
mod test_api;

#[path = "integration/test_pipeline.rs"]
mod test_pipeline;
