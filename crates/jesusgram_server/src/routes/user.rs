use crate::catchers::JesusgramResponse;
use crate::guards::BearerToken;
use crate::services::Services;
use crate::validation::{create_user_schema, login_schema};
use jesusgram_common::http::requests::{CreateUserRequest, LoginRequest};
use jesusgram_common::http::responses::{PublicUser, SessionResponse};
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::{Json, Value};
use rocket::{get, post, State};

/// POST REQUESTS ///

/**
 * Register a new user
 *
 * @param data - json body containing:
 *             * userId: lowercase letters and digits, 4 to 30 chars
 *             * userName: letters and digits, 3 to 20 chars
 *             * password: 8 to 30 chars with a digit, an uppercase and a lowercase letter
 * @return - the new user and their bearer token
 * @return status:
 *             * 201 if success
 *             * 400 if any field is missing, mistyped or breaks its format rule
 *             * 409 if the userId is taken
 *             * 502 if the database fails
 */
#[post("/create", format = "json", data = "<body>")]
pub async fn create_user(
    body: Json<Value>,
    services: &State<Services>,
) -> Result<status::Custom<Json<SessionResponse>>, JesusgramResponse> {
    let request: CreateUserRequest = create_user_schema().parse(body.into_inner())?;
    let (user, token) = services.create_user(request).await?;
    Ok(status::Custom(
        Status::Created,
        Json(SessionResponse {
            user: PublicUser::from(user),
            token: token.token,
        }),
    ))
}

/**
 * Exchange a userId and password for the user's bearer token
 *
 * @return status:
 *             * 200 if success
 *             * 400 if a credential is missing
 *             * 401 if the userId and password do not match
 */
#[post("/login", format = "json", data = "<body>")]
pub async fn login_user(
    body: Json<Value>,
    services: &State<Services>,
) -> Result<Json<SessionResponse>, JesusgramResponse> {
    let request: LoginRequest = login_schema().parse(body.into_inner())?;
    let (user, token) = services.login_user(request).await?;
    Ok(Json(SessionResponse {
        user: PublicUser::from(user),
        token,
    }))
}

/**
 * Follow another user
 *
 * @param user_id - the follower, must match the bearer token
 * @param target - the user to follow
 * @return status:
 *             * 200 with the updated follower if success
 *             * 400 if user_id == target or the authorization header is malformed
 *             * 401 if the token is missing or not the follower's
 *             * 404 if either user does not exist
 */
#[post("/<user_id>/follow/<target>")]
pub async fn follow_user(
    user_id: &str,
    target: &str,
    token: BearerToken,
    services: &State<Services>,
) -> Result<Json<PublicUser>, JesusgramResponse> {
    let user = services
        .follow_user(user_id, token.as_deref(), target)
        .await?;
    Ok(Json(PublicUser::from(user)))
}

/// Stop following another user, same statuses as follow
#[post("/<user_id>/unfollow/<target>")]
pub async fn unfollow_user(
    user_id: &str,
    target: &str,
    token: BearerToken,
    services: &State<Services>,
) -> Result<Json<PublicUser>, JesusgramResponse> {
    let user = services
        .unfollow_user(user_id, token.as_deref(), target)
        .await?;
    Ok(Json(PublicUser::from(user)))
}

/// GET REQUESTS ///

#[get("/all")]
pub async fn get_all_users(
    services: &State<Services>,
) -> Result<Json<Vec<PublicUser>>, JesusgramResponse> {
    let users = services.get_all_users().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

/**
 * Return the public profile of a user
 *
 * @param user_id - the user to look up
 * @return status:
 *             * 200 if success
 *             * 404 if the user does not exist
 */
#[get("/<user_id>")]
pub async fn get_user(
    user_id: &str,
    services: &State<Services>,
) -> Result<Json<PublicUser>, JesusgramResponse> {
    let user = services.get_user(user_id).await?;
    Ok(Json(PublicUser::from(user)))
}
