use crate::store::JesusgramStore;
use crate::validation::{Violations, MISSING};
use jesusgram_common::crypto::CredentialHasher;
use jesusgram_common::errors::{ErrorKind, JesusgramError};
use jesusgram_common::http::requests::{CreateUserRequest, LoginRequest, NewPostRequest};
use jesusgram_common::models::{FeedPost, Post, Token, User};
use jesusgram_common::utils::{
    is_valid_password, is_valid_post, is_valid_user_id, is_valid_username, PASSWORD_RULE,
    POST_RULE, USERNAME_RULE, USER_ID_RULE,
};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

/**
 * Validation and authorization on top of a store
 * @notice - identity is always passed in explicitly as (userId, token); nothing here reads
 *           ambient session state
 */
pub struct Services {
    store: Box<dyn JesusgramStore>,
    hasher: CredentialHasher,
}

impl Services {
    pub fn new(store: Box<dyn JesusgramStore>, hasher: CredentialHasher) -> Self {
        Services { store, hasher }
    }

    /// AUTH CHECKS ///

    /**
     * Checks that a bearer token belongs to the claimed user
     *
     * @param token - the token presented by the caller, if any
     * @param user_id - the user the caller claims to act as
     * @returns - UNAUTHENTICATED if the token is missing, unknown or owned by someone else
     */
    pub async fn check_authentication(
        &self,
        token: Option<&str>,
        user_id: &str,
    ) -> Result<(), JesusgramError> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(JesusgramError::unauthenticated(
                    "Please insert your user token",
                ))
            }
        };
        let owner = match self.store.token_to_user_id(token).await {
            Ok(owner) => owner,
            Err(e) if e.kind == ErrorKind::NotFound => {
                return Err(JesusgramError::unauthenticated(
                    "Please insert a valid user token",
                ))
            }
            Err(e) => return Err(e),
        };
        match owner == user_id {
            true => Ok(()),
            false => Err(JesusgramError::unauthenticated(
                "Please insert a valid user token",
            )),
        }
    }

    /**
     * Checks that a userId and password belong together
     *
     * @param user_id - the claimed user
     * @param password - the plaintext password
     * @returns - the user, BAD_REQUEST if either is missing, UNAUTHENTICATED if the pair does not
     *            match (an unknown user is reported the same way as a wrong password)
     */
    pub async fn check_credentials(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<User, JesusgramError> {
        let mut violations = Violations::new();
        violations.check("userId", !user_id.is_empty(), MISSING);
        violations.check("password", !password.is_empty(), MISSING);
        violations.into_result()?;

        let user = match self.store.get_user(user_id).await {
            Ok(user) => user,
            Err(e) if e.kind == ErrorKind::NotFound => {
                return Err(JesusgramError::unauthenticated(serde_json::json!({
                    "userId": user_id
                })))
            }
            Err(e) => return Err(e),
        };
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hashed_password = user.hashed_password.clone();
        let verified = spawn_blocking(move || hasher.verify(&password, &hashed_password))
            .await
            .map_err(|e| JesusgramError::fail(format!("Password check did not complete: {}", e)))?;
        match verified {
            true => Ok(user),
            false => Err(JesusgramError::unauthenticated(serde_json::json!({
                "userId": user_id
            }))),
        }
    }

    /// USERS ///

    /**
     * Register a new user
     * @dev every format rule is checked before failing so the caller sees all problems at once
     *
     * @param request - userId, userName and plaintext password
     * @returns - the new user and its first token
     */
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> Result<(User, Token), JesusgramError> {
        let mut violations = Violations::new();
        violations.check("userId", is_valid_user_id(&request.user_id), USER_ID_RULE);
        violations.check("userName", is_valid_username(&request.user_name), USERNAME_RULE);
        violations.check("password", is_valid_password(&request.password), PASSWORD_RULE);
        violations.into_result()?;

        let hasher = self.hasher.clone();
        let password = request.password;
        let hashed_password = spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| JesusgramError::fail(format!("Password hashing did not complete: {}", e)))??;

        let created = self
            .store
            .create_user(&request.user_id, &request.user_name, &hashed_password)
            .await?;
        info!("Registered user {}", request.user_id);
        Ok(created)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, JesusgramError> {
        self.store.get_user(user_id).await
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, JesusgramError> {
        self.store.get_all_users().await
    }

    /**
     * Log a user in
     * @dev a user left without a token (registration failed after the user was stored) is
     *      issued a fresh one here
     *
     * @param request - userId and plaintext password
     * @returns - the user and one of their tokens
     */
    pub async fn login_user(&self, request: LoginRequest) -> Result<(User, String), JesusgramError> {
        let user = self
            .check_credentials(&request.user_id, &request.password)
            .await?;
        let token = match self.get_token(&user.user_id).await {
            Ok(token) => token,
            Err(e) if e.kind == ErrorKind::NotFound => {
                warn!("User {} has no token, minting a new one", user.user_id);
                self.store.create_token(&user.user_id).await?.token
            }
            Err(e) => return Err(e),
        };
        info!("User {} logged in", user.user_id);
        Ok((user, token))
    }

    pub async fn get_token(&self, user_id: &str) -> Result<String, JesusgramError> {
        self.store.get_token(user_id).await
    }

    /// POSTS ///

    /**
     * Append a post to the caller's own posts
     *
     * @param user_id - the author
     * @param token - the author's bearer token
     * @param request - the post content and optional image reference
     * @returns - the updated author
     */
    pub async fn create_post(
        &self,
        user_id: &str,
        token: Option<&str>,
        request: NewPostRequest,
    ) -> Result<User, JesusgramError> {
        let mut violations = Violations::new();
        violations.check("post", is_valid_post(&request.post), POST_RULE);
        violations.into_result()?;

        self.check_authentication(token, user_id).await?;

        let post = Post::new(request.post, request.image);
        let user = self.store.create_post(user_id, post).await?;
        debug!("User {} now has {} posts", user_id, user.posts.len());
        Ok(user)
    }

    pub async fn get_user_dashboard(
        &self,
        user_id: &str,
        token: Option<&str>,
    ) -> Result<Vec<FeedPost>, JesusgramError> {
        self.check_authentication(token, user_id).await?;
        self.store.get_user_dashboard(user_id).await
    }

    /// FOLLOWS ///

    /**
     * Make the caller follow another user
     *
     * @param user_id - the follower
     * @param token - the follower's bearer token
     * @param target_id - the user to follow
     * @returns - the updated follower; BAD_REQUEST on self-follow, NOT_FOUND for unknown users
     */
    pub async fn follow_user(
        &self,
        user_id: &str,
        token: Option<&str>,
        target_id: &str,
    ) -> Result<User, JesusgramError> {
        let (mut user, mut target) = self.relation_parties(user_id, token, target_id).await?;
        self.store.follow_user(&mut user, &mut target).await?;
        info!("{} follows {}", user_id, target_id);
        Ok(user)
    }

    /// Make the caller stop following another user; unfollowing a stranger is a no-op
    pub async fn unfollow_user(
        &self,
        user_id: &str,
        token: Option<&str>,
        target_id: &str,
    ) -> Result<User, JesusgramError> {
        let (mut user, mut target) = self.relation_parties(user_id, token, target_id).await?;
        self.store.unfollow_user(&mut user, &mut target).await?;
        info!("{} unfollowed {}", user_id, target_id);
        Ok(user)
    }

    async fn relation_parties(
        &self,
        user_id: &str,
        token: Option<&str>,
        target_id: &str,
    ) -> Result<(User, User), JesusgramError> {
        if user_id == target_id {
            return Err(JesusgramError::bad_request(serde_json::json!({
                "target": "Users cannot follow themselves"
            })));
        }
        self.check_authentication(token, user_id).await?;
        let user = self.store.get_user(user_id).await?;
        let target = self.store.get_user(target_id).await?;
        Ok((user, target))
    }
}
