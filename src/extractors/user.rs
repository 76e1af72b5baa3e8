//! Authenticated user forwarded by the auth layer.

use axum::http::HeaderMap;
use uuid::Uuid;

/// Header carrying the authenticated user id. Absent for anonymous visitors.
pub const USER_ID_HEADER: &str = "X-User-ID";

/// User id from `X-User-ID`; a malformed value counts as anonymous.
pub fn user_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn malformed_user_header_is_anonymous() {
        let mut h = HeaderMap::new();
        assert_eq!(user_id_from_headers(&h), None);
        h.insert(USER_ID_HEADER, HeaderValue::from_static("nobody"));
        assert_eq!(user_id_from_headers(&h), None);
        let id = Uuid::new_v4();
        h.insert(USER_ID_HEADER, HeaderValue::from_str(&format!(" {} ", id)).unwrap());
        assert_eq!(user_id_from_headers(&h), Some(id));
    }
}
