use actix_web::{FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use uuid::Uuid;

use crate::modules::media::domain::entities::UserId;

/// This service treats authentication as an external collaborator's job:
/// whatever sits in front of it has already verified the caller and
/// forwards their identity in this header.
const USER_ID_HEADER: &str = "x-user-id";

/// Thin extractor that trusts an upstream-verified identity header, minus
/// any JWT verification of its own.
pub struct RequestingUser(pub UserId);

#[derive(Debug, thiserror::Error)]
pub enum RequestingUserError {
    #[error("missing {USER_ID_HEADER} header")]
    Missing,
    #[error("{USER_ID_HEADER} header is not a valid UUID")]
    Invalid,
}

impl actix_web::ResponseError for RequestingUserError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::UNAUTHORIZED
    }
}

impl FromRequest for RequestingUser {
    type Error = RequestingUserError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .headers()
            .get(USER_ID_HEADER)
            .ok_or(RequestingUserError::Missing)
            .and_then(|value| value.to_str().map_err(|_| RequestingUserError::Invalid))
            .and_then(|value| Uuid::parse_str(value).map_err(|_| RequestingUserError::Invalid))
            .map(RequestingUser);

        ready(result)
    }
}
