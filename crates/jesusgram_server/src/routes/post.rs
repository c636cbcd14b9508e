use crate::catchers::JesusgramResponse;
use crate::guards::BearerToken;
use crate::services::Services;
use crate::validation::new_post_schema;
use jesusgram_common::http::requests::NewPostRequest;
use jesusgram_common::http::responses::PublicUser;
use jesusgram_common::models::FeedPost;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::{Json, Value};
use rocket::{get, post, State};

/**
 * Publish a post as the token's owner
 *
 * @param user_id - the author, must match the bearer token
 * @param data - json body containing:
 *             * post: the text, not blank and at most 500 chars
 *             * image: optional reference to an already uploaded image
 * @return status:
 *             * 201 with the updated author if success
 *             * 400 if the body is invalid
 *             * 401 if the token is missing or not the author's
 *             * 404 if the author does not exist
 */
#[post("/<user_id>/post", format = "json", data = "<body>")]
pub async fn create_post(
    user_id: &str,
    body: Json<Value>,
    token: BearerToken,
    services: &State<Services>,
) -> Result<status::Custom<Json<PublicUser>>, JesusgramResponse> {
    let request: NewPostRequest = new_post_schema().parse(body.into_inner())?;
    let user = services
        .create_post(user_id, token.as_deref(), request)
        .await?;
    Ok(status::Custom(Status::Created, Json(PublicUser::from(user))))
}

/**
 * The user's own posts merged with the posts of everyone they follow, newest first
 *
 * @return status:
 *             * 200 if success
 *             * 401 if the token is missing or not the user's
 *             * 404 if the user does not exist
 */
#[get("/<user_id>/dashboard")]
pub async fn get_user_dashboard(
    user_id: &str,
    token: BearerToken,
    services: &State<Services>,
) -> Result<Json<Vec<FeedPost>>, JesusgramResponse> {
    let dashboard = services
        .get_user_dashboard(user_id, token.as_deref())
        .await?;
    Ok(Json(dashboard))
}
