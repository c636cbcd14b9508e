use futures::future::try_join_all;
use jesusgram_common::errors::{ErrorKind, JesusgramError};
use jesusgram_common::models::{build_dashboard, FeedPost, Post, Token, User};
use tracing::warn;

/**
 * Persistence of users and tokens
 * @notice - implementations own their connection handles; nothing connection-shaped crosses
 *           this boundary. Absence is NOT_FOUND, backend trouble is EXT_SVC_FAIL
 */
#[rocket::async_trait]
pub trait JesusgramStore: Send + Sync {
    /**
     * Persist a new user with empty posts and relations, then mint its first token
     * @notice - assumes field format checks were already performed
     *
     * @param user_id - the unique id of the new user
     * @param user_name - the display name
     * @param hashed_password - the salted password hash
     * @returns - the stored user and its token, ALREADY_EXISTS if the userId is taken
     */
    async fn create_user(
        &self,
        user_id: &str,
        user_name: &str,
        hashed_password: &str,
    ) -> Result<(User, Token), JesusgramError>;

    async fn get_user(&self, user_id: &str) -> Result<User, JesusgramError>;

    async fn get_all_users(&self) -> Result<Vec<User>, JesusgramError>;

    /// Append a post to a user, returning the updated user. Never creates a user
    async fn create_post(&self, user_id: &str, post: Post) -> Result<User, JesusgramError>;

    /**
     * Add both sides of a follow relation and persist them
     * @notice - two separate writes; a failure in between leaves the relation half applied
     *
     * @param user - the follower, updated in place with the stored state
     * @param user_to_follow - the followee, updated in place with the stored state
     */
    async fn follow_user(
        &self,
        user: &mut User,
        user_to_follow: &mut User,
    ) -> Result<(), JesusgramError>;

    /// Remove both sides of a follow relation, same caveat as follow_user
    async fn unfollow_user(
        &self,
        user: &mut User,
        user_to_unfollow: &mut User,
    ) -> Result<(), JesusgramError>;

    async fn create_token(&self, user_id: &str) -> Result<Token, JesusgramError>;

    /// The userId owning a token, NOT_FOUND if the token is unknown
    async fn token_to_user_id(&self, token: &str) -> Result<String, JesusgramError>;

    /// The first token minted for a user, NOT_FOUND if there is none
    async fn get_token(&self, user_id: &str) -> Result<String, JesusgramError>;

    /**
     * Build the dashboard of a user: their posts plus the posts of everyone they follow
     * @dev followees are fetched concurrently but merged in `following` order before the
     *      newest-first sort, so the result is deterministic
     *
     * @param user_id - the user to build the dashboard for
     * @returns - the merged posts, NOT_FOUND if the user does not exist
     */
    async fn get_user_dashboard(&self, user_id: &str) -> Result<Vec<FeedPost>, JesusgramError> {
        let owner = self.get_user(user_id).await?;
        let lookups = owner.following.iter().map(|followee| async move {
            match self.get_user(followee).await {
                Ok(user) => Ok(Some(user)),
                Err(e) if e.kind == ErrorKind::NotFound => {
                    warn!("{} follows missing user {}, skipping", user_id, followee);
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        });
        let followees: Vec<User> = try_join_all(lookups).await?.into_iter().flatten().collect();
        Ok(build_dashboard(&owner, &followees))
    }
}
