// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handler.

/// GET /health
///
/// Liveness check. Returns `ok` while the process is serving.
pub async fn health() -> &'static str {
    "ok"
}
