use crate::config::{DATABASE_NAME, MONGODB_URI, TOKENS_COLLECTION, USERS_COLLECTION};
use crate::store::JesusgramStore;
use futures::TryStreamExt;
use jesusgram_common::errors::JesusgramError;
use jesusgram_common::models::{Post, Token, User};
use mongodb::bson::{self, doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind as MongoErrorKind, WriteFailure};
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOneOptions, IndexOptions, ReturnDocument,
    ServerApi, ServerApiVersion,
};
use mongodb::{Client, Collection, IndexModel};
use tracing::{error, info};

const DUPLICATE_KEY: i32 = 11000;

/**
 * MongoDB backed store
 * @dev the client is created once per process and pools connections internally, so every
 *      operation borrows a connection for exactly its own unit of work
 */
pub struct JesusgramDB {
    client: Client,
    users: Collection<User>,
    tokens: Collection<Token>,
}

/**
 * Log a driver failure and surface it as an infrastructure error
 *
 * @param context - what was being attempted
 * @param e - the driver error
 * @returns - EXT_SVC_FAIL carrying the context
 */
fn mongo_error(context: &str, e: MongoError) -> JesusgramError {
    error!("Mongo error while trying to {}: {}", context, e);
    JesusgramError::ext_svc_fail(format!("Failed to {}", context))
}

fn is_duplicate_key(e: &MongoError) -> bool {
    matches!(
        e.kind.as_ref(),
        MongoErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY
    )
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

impl JesusgramDB {
    /**
     * Connect to the configured database and make sure the unique indexes exist
     *
     * @returns - the store, or EXT_SVC_FAIL if mongo cannot be reached
     */
    pub async fn init() -> Result<Self, JesusgramError> {
        Self::connect(&MONGODB_URI, &DATABASE_NAME).await
    }

    pub async fn connect(uri: &str, database_name: &str) -> Result<Self, JesusgramError> {
        let mut client_options = ClientOptions::parse(uri)
            .await
            .map_err(|e| mongo_error("parse the mongodb uri", e))?;
        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);
        client_options.app_name = Some(String::from("jesusgram"));
        let client = Client::with_options(client_options)
            .map_err(|e| mongo_error("create the mongodb client", e))?;
        let db = client.database(database_name);
        let users = db.collection::<User>(USERS_COLLECTION);
        let tokens = db.collection::<Token>(TOKENS_COLLECTION);

        // userId and token are the natural keys of their collections
        let unique = IndexOptions::builder().unique(true).build();
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await
            .map_err(|e| mongo_error("create the users index", e))?;
        tokens
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "token": 1 })
                    .options(unique)
                    .build(),
                None,
            )
            .await
            .map_err(|e| mongo_error("create the tokens index", e))?;
        // lookups of a user's token go by userId
        tokens
            .create_index(IndexModel::builder().keys(doc! { "userId": 1 }).build(), None)
            .await
            .map_err(|e| mongo_error("create the token owner index", e))?;

        info!("Connected to mongodb database {}", database_name);
        Ok(Self {
            client,
            users,
            tokens,
        })
    }

    /**
     * Drops the entire database to start off with clean state for testing
     */
    pub async fn drop(&self, database_name: &str) -> Result<(), JesusgramError> {
        self.client
            .database(database_name)
            .drop(None)
            .await
            .map_err(|e| mongo_error("drop the database", e))
    }

    /**
     * Apply an update to one user and return the stored result
     *
     * @param user_id - the user to update
     * @param update - the update document
     * @param context - what is being attempted, for logging
     * @returns - the user after the update, NOT_FOUND if no user matched
     */
    async fn update_user(
        &self,
        user_id: &str,
        update: Document,
        context: &str,
    ) -> Result<User, JesusgramError> {
        let filter = doc! { "userId": user_id };
        match self
            .users
            .find_one_and_update(filter, update, return_updated())
            .await
        {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(JesusgramError::not_found(format!(
                "User {} does not exist.",
                user_id
            ))),
            Err(e) => Err(mongo_error(context, e)),
        }
    }
}

#[rocket::async_trait]
impl JesusgramStore for JesusgramDB {
    async fn create_user(
        &self,
        user_id: &str,
        user_name: &str,
        hashed_password: &str,
    ) -> Result<(User, Token), JesusgramError> {
        // check if the userId exists already in the database
        let query = doc! { "userId": user_id };
        let options = FindOneOptions::builder()
            .projection(doc! { "posts": 0 })
            .build();
        match self.users.find_one(query, options).await {
            Ok(Some(_)) => {
                return Err(JesusgramError::already_exists(
                    "User with specified userId already exists.",
                ))
            }
            Ok(None) => (),
            Err(e) => return Err(mongo_error("check for an existing user", e)),
        };

        // insert the user, the unique index catches a concurrent registration
        let mut user = User::new(
            user_id.to_string(),
            user_name.to_string(),
            hashed_password.to_string(),
        );
        match self.users.insert_one(&user, None).await {
            Ok(result) => user.id = result.inserted_id.as_object_id(),
            Err(e) if is_duplicate_key(&e) => {
                return Err(JesusgramError::already_exists(
                    "User with specified userId already exists.",
                ))
            }
            Err(e) => return Err(mongo_error("insert the user", e)),
        };

        let token = self.create_token(user_id).await?;
        info!("Created user {}", user_id);
        Ok((user, token))
    }

    async fn get_user(&self, user_id: &str) -> Result<User, JesusgramError> {
        let filter = doc! { "userId": user_id };
        match self.users.find_one(filter, None).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(JesusgramError::not_found(format!(
                "User {} does not exist.",
                user_id
            ))),
            Err(e) => Err(mongo_error("get the user", e)),
        }
    }

    async fn get_all_users(&self) -> Result<Vec<User>, JesusgramError> {
        let cursor = self
            .users
            .find(doc! {}, None)
            .await
            .map_err(|e| mongo_error("list the users", e))?;
        cursor
            .try_collect::<Vec<User>>()
            .await
            .map_err(|e| mongo_error("read the users", e))
    }

    async fn create_post(&self, user_id: &str, post: Post) -> Result<User, JesusgramError> {
        let post = match bson::to_bson(&post) {
            Ok(post) => post,
            Err(e) => {
                return Err(JesusgramError::fail(format!(
                    "Could not serialize post: {}",
                    e
                )))
            }
        };
        let update = doc! { "$push": { "posts": post } };
        self.update_user(user_id, update, "append the post").await
    }

    async fn follow_user(
        &self,
        user: &mut User,
        user_to_follow: &mut User,
    ) -> Result<(), JesusgramError> {
        let update = doc! { "$addToSet": { "following": user_to_follow.user_id.as_str() } };
        *user = self
            .update_user(&user.user_id, update, "add to following")
            .await?;
        let update = doc! { "$addToSet": { "followers": user.user_id.as_str() } };
        *user_to_follow = self
            .update_user(&user_to_follow.user_id, update, "add to followers")
            .await?;
        Ok(())
    }

    async fn unfollow_user(
        &self,
        user: &mut User,
        user_to_unfollow: &mut User,
    ) -> Result<(), JesusgramError> {
        let update = doc! { "$pull": { "following": user_to_unfollow.user_id.as_str() } };
        *user = self
            .update_user(&user.user_id, update, "remove from following")
            .await?;
        let update = doc! { "$pull": { "followers": user.user_id.as_str() } };
        *user_to_unfollow = self
            .update_user(&user_to_unfollow.user_id, update, "remove from followers")
            .await?;
        Ok(())
    }

    async fn create_token(&self, user_id: &str) -> Result<Token, JesusgramError> {
        let mut token = Token::new(user_id);
        match self.tokens.insert_one(&token, None).await {
            Ok(result) => {
                token.id = result.inserted_id.as_object_id();
                Ok(token)
            }
            Err(e) => Err(mongo_error("insert the token", e)),
        }
    }

    async fn token_to_user_id(&self, token: &str) -> Result<String, JesusgramError> {
        match self.tokens.find_one(doc! { "token": token }, None).await {
            Ok(Some(found)) => Ok(found.user_id),
            Ok(None) => Err(JesusgramError::not_found("Given token does not exist.")),
            Err(e) => Err(mongo_error("resolve the token", e)),
        }
    }

    async fn get_token(&self, user_id: &str) -> Result<String, JesusgramError> {
        match self.tokens.find_one(doc! { "userId": user_id }, None).await {
            Ok(Some(found)) => Ok(found.token),
            Ok(None) => Err(JesusgramError::not_found(
                serde_json::json!({ "token for user": user_id }),
            )),
            Err(e) => Err(mongo_error("get the user token", e)),
        }
    }
}
