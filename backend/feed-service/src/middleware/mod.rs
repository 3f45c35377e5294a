/// Request identity extractors for feed-service
///
/// The upstream gateway authenticates callers and forwards the user id in
/// `x-user-id`. Internal write endpoints additionally accept a shared key.
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const INTERNAL_API_KEY_HEADER: &str = "x-internal-api-key";

/// Authenticated viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

impl FromRequest for UserId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(extract_user_id(req).map(UserId))
    }
}

fn extract_user_id(req: &HttpRequest) -> Result<Uuid, AppError> {
    let header_value = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing x-user-id header".into()))?;

    let value = header_value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid x-user-id header".into()))?;

    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::Unauthorized("Invalid x-user-id header value".into()))
}

/// Expected value of `x-internal-api-key`; `None` disables the check
#[derive(Debug, Clone, Default)]
pub struct InternalApiKey(pub Option<String>);

/// Marker extractor for callers allowed to hit internal endpoints
#[derive(Debug, Clone, Copy)]
pub struct InternalCaller;

impl FromRequest for InternalCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let expected = req
            .app_data::<web::Data<InternalApiKey>>()
            .and_then(|key| key.0.clone());

        let Some(expected) = expected else {
            return ready(Ok(InternalCaller));
        };

        let provided = req
            .headers()
            .get(INTERNAL_API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        ready(match provided {
            Some(value) if constant_time_compare(value.as_bytes(), expected.as_bytes()) => {
                Ok(InternalCaller)
            }
            Some(_) => Err(AppError::Unauthorized("Invalid internal API key".into())),
            None => Err(AppError::Unauthorized("Missing x-internal-api-key header".into())),
        })
    }
}

/// Byte comparison whose timing depends only on the lengths
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_user_id_from_header() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .to_http_request();

        let extracted = UserId::extract(&req).await.unwrap();
        assert_eq!(extracted, UserId(id));
    }

    #[actix_web::test]
    async fn test_missing_or_invalid_user_id_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            UserId::extract(&req).await,
            Err(AppError::Unauthorized(_))
        ));

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .to_http_request();
        assert!(matches!(
            UserId::extract(&req).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[actix_web::test]
    async fn test_internal_key_check() {
        let key = web::Data::new(InternalApiKey(Some("s3cret".into())));

        let req = TestRequest::default()
            .app_data(key.clone())
            .insert_header((INTERNAL_API_KEY_HEADER, "s3cret"))
            .to_http_request();
        assert!(InternalCaller::extract(&req).await.is_ok());

        let req = TestRequest::default().app_data(key).to_http_request();
        assert!(InternalCaller::extract(&req).await.is_err());

        let open = TestRequest::default()
            .app_data(web::Data::new(InternalApiKey(None)))
            .to_http_request();
        assert!(InternalCaller::extract(&open).await.is_ok());
    }

    #[actix_web::test]
    async fn test_internal_key_rejects_near_misses() {
        let key = web::Data::new(InternalApiKey(Some("s3cret".into())));

        for candidate in ["s3creT", "s3cre", "s3cret ", ""] {
            let req = TestRequest::default()
                .app_data(key.clone())
                .insert_header((INTERNAL_API_KEY_HEADER, candidate))
                .to_http_request();
            assert!(
                matches!(InternalCaller::extract(&req).await, Err(AppError::Unauthorized(_))),
                "key {:?}",
                candidate
            );
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"s3cret", b"s3cret"));
        assert!(!constant_time_compare(b"s3cret", b"s3creT"));
        assert!(!constant_time_compare(b"s3cret", b"s3"));
        assert!(constant_time_compare(b"", b""));
    }
}
