// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # authgate Integration Tests
//!
//! Shared utilities plus the integration suites under `tests/`.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p authgate-tests
//! cargo test -p authgate-tests --test integration_auth
//! cargo test -p authgate-tests --test integration_api
//! cargo test -p authgate-tests --test integration_audit
//! cargo test -p authgate-tests --test integration_config
//! ```
//!
//! ## Suites
//!
//! - `integration_auth`: lifecycle operations called directly
//! - `integration_api`: the same flows over HTTP, including the auth gate
//! - `integration_audit`: delivery to a live mock audit service
//! - `integration_config`: loading, overrides and secret resolution
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use authgate_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::new().await;
//!     let token = app.login_user().await;
//!     let response = app.get("/auth/me").bearer(&token).send().await;
//!     assert_status(&response, StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-exports for test files.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::mocks::*;
    pub use crate::common::{init_test_logging, temp_config_file};
    pub use axum::http::StatusCode;
}
