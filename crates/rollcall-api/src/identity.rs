//! Caller identity extraction.
//!
//! The gateway does not authenticate callers itself. Whatever sits in
//! front of it (a wallet-signature proxy, an auth middleware) is expected
//! to have verified the identity and written it into the configured header.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use http::request::Parts;
use rollcall_core::Identity;

use crate::error::ApiError;
use crate::state::AppState;

/// The identity making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Identity);

/// Reads the caller identity from `header`, ignoring blank values.
pub fn caller_from_parts(parts: &Parts, header: &str) -> Option<Identity> {
    parts
        .headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Identity::new)
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        caller_from_parts(parts, state.identity_header())
            .map(Caller)
            .ok_or_else(|| ApiError::MissingIdentity {
                header: state.identity_header().to_string(),
            })
    }
}
