// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.
//!
//! Thin adapters: each builds the request context and hands off to the
//! orchestrator, whose [`Outcome`] becomes the response.

use axum::extract::State;

use crate::extractors::{AuthRequest, Payload};
use crate::response::Outcome;
use crate::state::AppState;

/// POST {base}/auth/register
pub async fn register(State(state): State<AppState>, Payload(body): Payload) -> Outcome {
    state.orchestrator().register(&body).await
}

/// POST {base}/auth/login
pub async fn login(
    State(state): State<AppState>,
    AuthRequest(ctx): AuthRequest,
    Payload(body): Payload,
) -> Outcome {
    state.orchestrator().login(&body, &ctx).await
}

/// POST {base}/auth/refresh
pub async fn refresh(State(state): State<AppState>, AuthRequest(ctx): AuthRequest) -> Outcome {
    state.orchestrator().refresh(&ctx).await
}

/// POST {base}/auth/logout
pub async fn logout(State(state): State<AppState>, AuthRequest(ctx): AuthRequest) -> Outcome {
    state.orchestrator().logout(&ctx).await
}

/// GET {base}/auth/me
pub async fn me(State(state): State<AppState>, AuthRequest(ctx): AuthRequest) -> Outcome {
    state.orchestrator().me(&ctx).await
}
