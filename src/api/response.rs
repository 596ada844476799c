use serde::Serialize;

/// Error codes exposed to clients. Serialized as SCREAMING_SNAKE_CASE
/// strings inside the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    BadRequest,
    Unauthorized,
    Forbidden,
    ValidationError,
    RateLimitExceeded,
    ServerError,
    InternalServerError,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total: i64) -> Self {
        let per = per_page.max(1) as i64;
        Pagination {
            page,
            per_page,
            total,
            total_pages: (total + per - 1) / per,
        }
    }

    /// SQL OFFSET for a 1-based page. Widens before multiplying so a huge
    /// page number cannot wrap.
    pub fn offset(page: u32, per_page: u32) -> i64 {
        (page.max(1) as i64 - 1) * per_page as i64
    }
}

/// The one response shape every handler produces: either a success carrying
/// a payload (and optionally pagination), or a failure carrying an error
/// descriptor. Nothing else ever goes over the wire.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Success {
        success: bool,
        data: T,
        #[serde(skip_serializing_if = "Option::is_none")]
        pagination: Option<Pagination>,
    },
    Failure {
        success: bool,
        error: ErrorDetail,
    },
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse::Success { success: true, data, pagination: None }
    }

    pub fn paginated(data: T, pagination: Pagination) -> Self {
        ApiResponse::Success { success: true, data, pagination: Some(pagination) }
    }

    pub fn failure(code: ErrorCode, message: String) -> Self {
        ApiResponse::Failure { success: false, error: ErrorDetail { code, message } }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_shape() {
        let body = ApiResponse::success(json!({"id": "sermon-1"}));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["id"], json!("sermon-1"));
        assert!(value.get("pagination").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn paginated_envelope_shape() {
        let body = ApiResponse::paginated(json!([]), Pagination::new(2, 10, 35));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["pagination"]["page"], json!(2));
        assert_eq!(value["pagination"]["total_pages"], json!(4));
    }

    #[test]
    fn failure_envelope_shape() {
        let body = ApiResponse::<()>::failure(ErrorCode::RateLimitExceeded, "too fast".into());
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"]["code"], json!("RATE_LIMIT_EXCEEDED"));
        assert_eq!(value["error"]["message"], json!("too fast"));
    }

    #[test]
    fn offsets_are_one_based_and_never_wrap() {
        assert_eq!(Pagination::offset(1, 10), 0);
        assert_eq!(Pagination::offset(3, 10), 20);
        assert_eq!(Pagination::offset(0, 10), 0);
        assert_eq!(Pagination::offset(u32::MAX, 100), (u32::MAX as i64 - 1) * 100);
    }

    #[test]
    fn pagination_rounds_up() {
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 10, 1).total_pages, 1);
        assert_eq!(Pagination::new(1, 10, 10).total_pages, 1);
        assert_eq!(Pagination::new(1, 10, 11).total_pages, 2);
    }
}
