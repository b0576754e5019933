//! Helpers for tests in this crate and in crates that depend on it. Compiled only with the `test_utils` feature.
pub mod fakes;
pub mod prepare_env;
