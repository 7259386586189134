//! Shared response envelope types for API handlers.
//!
//! Resource responses use a `{ "data": ... }` envelope. The auth endpoints
//! are the exception and return their token payload bare.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: task }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
