use crate::catchers::ErrorMessage;
use jesusgram_common::errors::JesusgramError;
use rocket::{
    http::Status,
    outcome::Outcome::{Error as Failure, Success},
    request::{FromRequest, Outcome, Request},
};

/**
 * The bearer token a request carries, if any
 * @notice - a missing header is not a failure here; the service layer decides whether the
 *           operation needs a token. Only a malformed header is rejected
 */
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_string = match request.headers().get_one("Authorization") {
            Some(auth_string) => auth_string,
            None => return Success(BearerToken(None)),
        };
        match auth_string.strip_prefix("Bearer ").map(str::trim) {
            Some(token) if !token.is_empty() => Success(BearerToken(Some(token.to_string()))),
            _ => {
                // Improperly formatted authorization header
                request.local_cache(|| {
                    ErrorMessage(Some(JesusgramError::bad_request(
                        "Malformed authorization header",
                    )))
                });
                Failure((Status::BadRequest, ()))
            }
        }
    }
}
