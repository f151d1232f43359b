//! End-to-end test harness and fixtures shared by the `scenario_*` integration
//! test binaries: an isolated `SqliteGraphStore` per test, a deterministic
//! stub `LlmClient`, and factory methods for entities/communities/templates.

pub mod harness;
pub mod mocks;
