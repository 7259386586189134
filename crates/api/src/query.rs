//! Query-string parameter types shared by list endpoints.

use serde::Deserialize;

/// Default page size for the notification inbox.
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page size a client may request.
pub const MAX_LIMIT: i64 = 100;

/// `?skip=&limit=` pagination.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Offset, never negative.
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Page size clamped to `1..=MAX_LIMIT`.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// `?status=` filter for the task list. Parsed by the handler so an unknown
/// value produces the usual JSON validation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListParams {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_absent() {
        let params = PageParams::default();
        assert_eq!(params.skip(), 0);
        assert_eq!(params.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn limit_is_clamped() {
        let params = PageParams {
            skip: Some(-5),
            limit: Some(1000),
        };
        assert_eq!(params.skip(), 0);
        assert_eq!(params.limit(), MAX_LIMIT);

        let params = PageParams {
            skip: None,
            limit: Some(0),
        };
        assert_eq!(params.limit(), 1);
    }
}
