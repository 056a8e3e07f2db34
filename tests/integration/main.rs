//! Integration tests for the storefront client
//! These tests drive whole app contexts against a local mock backend

pub mod test_harness;

pub mod api_test;
pub mod session_test;
