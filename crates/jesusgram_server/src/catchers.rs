use jesusgram_common::errors::{ErrorKind, JesusgramError};
use rocket::request::Request;
use rocket::serde::json::Json;
use rocket::{catch, Responder};

/// Error responses, one variant per http status the api can return
#[derive(Responder, Debug)]
pub enum JesusgramResponse {
    #[response(status = 400)]
    BadRequest(Json<JesusgramError>),
    #[response(status = 401)]
    Unauthorized(Json<JesusgramError>),
    #[response(status = 403)]
    Forbidden(Json<JesusgramError>),
    #[response(status = 404)]
    NotFound(Json<JesusgramError>),
    #[response(status = 409)]
    Conflict(Json<JesusgramError>),
    #[response(status = 422)]
    Unprocessable(Json<JesusgramError>),
    #[response(status = 500)]
    InternalError(Json<JesusgramError>),
    #[response(status = 502)]
    BadGateway(Json<JesusgramError>),
}

impl From<JesusgramError> for JesusgramResponse {
    fn from(err: JesusgramError) -> Self {
        match err.kind {
            ErrorKind::BadRequest => JesusgramResponse::BadRequest(Json(err)),
            ErrorKind::Unauthenticated => JesusgramResponse::Unauthorized(Json(err)),
            ErrorKind::Forbidden => JesusgramResponse::Forbidden(Json(err)),
            ErrorKind::NotFound => JesusgramResponse::NotFound(Json(err)),
            ErrorKind::AlreadyExists => JesusgramResponse::Conflict(Json(err)),
            ErrorKind::ExtSvcFail => JesusgramResponse::BadGateway(Json(err)),
            ErrorKind::Fail => JesusgramResponse::InternalError(Json(err)),
        }
    }
}

/// Error stashed in the request-local cache by a failing guard for the catchers to report
pub struct ErrorMessage(pub Option<JesusgramError>);

fn cached_or(req: &Request, fallback: JesusgramError) -> Json<JesusgramError> {
    match req.local_cache(|| ErrorMessage(None)) {
        ErrorMessage(Some(err)) => Json(err.clone()),
        ErrorMessage(None) => Json(fallback),
    }
}

#[catch(400)]
pub fn bad_request(req: &Request) -> JesusgramResponse {
    JesusgramResponse::BadRequest(cached_or(
        req,
        JesusgramError::bad_request("Unknown bad request error has occurred"),
    ))
}

#[catch(401)]
pub fn unauthorized(req: &Request) -> JesusgramResponse {
    JesusgramResponse::Unauthorized(cached_or(
        req,
        JesusgramError::unauthenticated("Unknown authorization error has occurred"),
    ))
}

#[catch(404)]
pub fn not_found(req: &Request) -> JesusgramResponse {
    JesusgramResponse::NotFound(cached_or(
        req,
        JesusgramError::not_found(format!("No route for {}", req.uri())),
    ))
}

#[catch(422)]
pub fn unprocessable(req: &Request) -> JesusgramResponse {
    JesusgramResponse::Unprocessable(cached_or(
        req,
        JesusgramError::bad_request("Request body is not valid json"),
    ))
}

#[catch(500)]
pub fn internal_error(req: &Request) -> JesusgramResponse {
    JesusgramResponse::InternalError(cached_or(
        req,
        JesusgramError::fail("Unknown internal server error"),
    ))
}
