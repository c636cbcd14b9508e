use crate::store::JesusgramStore;
use jesusgram_common::errors::JesusgramError;
use jesusgram_common::models::{Post, Token, User};
use tokio::sync::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

/**
 * Process-local store, selected with JESUSGRAM_STORE=memory and used by the test suite
 * @dev state is lost on restart; users are listed in userId order
 */
#[derive(Default)]
pub struct MemoryDB {
    users: RwLock<BTreeMap<String, User>>,
    tokens: RwLock<Vec<Token>>,
}

impl MemoryDB {
    pub fn new() -> Self {
        Self::default()
    }

    fn user_not_found(user_id: &str) -> JesusgramError {
        JesusgramError::not_found(format!("User {} does not exist.", user_id))
    }

    /**
     * Apply a relation change to the stored copies of two users and hand the results back
     *
     * @param user - the acting user
     * @param other - the followed / unfollowed user
     * @param apply - the mutation, e.g. User::follow
     */
    async fn update_relation(
        &self,
        user: &mut User,
        other: &mut User,
        apply: fn(&mut User, &mut User) -> bool,
    ) -> Result<(), JesusgramError> {
        let mut users = self.users.write().await;
        let mut stored = match users.get(&user.user_id) {
            Some(stored) => stored.clone(),
            None => return Err(Self::user_not_found(&user.user_id)),
        };
        let mut target = match users.get(&other.user_id) {
            Some(target) => target.clone(),
            None => return Err(Self::user_not_found(&other.user_id)),
        };
        apply(&mut stored, &mut target);
        users.insert(stored.user_id.clone(), stored.clone());
        users.insert(target.user_id.clone(), target.clone());
        *user = stored;
        *other = target;
        Ok(())
    }
}

#[rocket::async_trait]
impl JesusgramStore for MemoryDB {
    async fn create_user(
        &self,
        user_id: &str,
        user_name: &str,
        hashed_password: &str,
    ) -> Result<(User, Token), JesusgramError> {
        let user = User::new(
            user_id.to_string(),
            user_name.to_string(),
            hashed_password.to_string(),
        );
        {
            let mut users = self.users.write().await;
            if users.contains_key(user_id) {
                return Err(JesusgramError::already_exists(
                    "User with specified userId already exists.",
                ));
            }
            users.insert(user_id.to_string(), user.clone());
        }
        let token = self.create_token(user_id).await?;
        debug!("Created user {} in memory", user_id);
        Ok((user, token))
    }

    async fn get_user(&self, user_id: &str) -> Result<User, JesusgramError> {
        match self.users.read().await.get(user_id) {
            Some(user) => Ok(user.clone()),
            None => Err(Self::user_not_found(user_id)),
        }
    }

    async fn get_all_users(&self) -> Result<Vec<User>, JesusgramError> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn create_post(&self, user_id: &str, post: Post) -> Result<User, JesusgramError> {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(user) => {
                user.posts.push(post);
                Ok(user.clone())
            }
            None => Err(Self::user_not_found(user_id)),
        }
    }

    async fn follow_user(
        &self,
        user: &mut User,
        user_to_follow: &mut User,
    ) -> Result<(), JesusgramError> {
        self.update_relation(user, user_to_follow, User::follow).await
    }

    async fn unfollow_user(
        &self,
        user: &mut User,
        user_to_unfollow: &mut User,
    ) -> Result<(), JesusgramError> {
        self.update_relation(user, user_to_unfollow, User::unfollow).await
    }

    async fn create_token(&self, user_id: &str) -> Result<Token, JesusgramError> {
        let token = Token::new(user_id);
        self.tokens.write().await.push(token.clone());
        Ok(token)
    }

    async fn token_to_user_id(&self, token: &str) -> Result<String, JesusgramError> {
        match self.tokens.read().await.iter().find(|t| t.token == token) {
            Some(found) => Ok(found.user_id.clone()),
            None => Err(JesusgramError::not_found("Given token does not exist.")),
        }
    }

    async fn get_token(&self, user_id: &str) -> Result<String, JesusgramError> {
        match self.tokens.read().await.iter().find(|t| t.user_id == user_id) {
            Some(found) => Ok(found.token.clone()),
            None => Err(JesusgramError::not_found(
                serde_json::json!({ "token for user": user_id }),
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use jesusgram_common::errors::ErrorKind;

    async fn db_with(user_ids: &[&str]) -> MemoryDB {
        let db = MemoryDB::new();
        for user_id in user_ids {
            db.create_user(user_id, "Name", "salt:key").await.unwrap();
        }
        db
    }

    #[rocket::async_test]
    async fn test_create_and_get_user() {
        let db = MemoryDB::new();
        let (user, token) = db.create_user("alice", "Alice", "salt:key").await.unwrap();
        assert!(user.posts.is_empty() && user.following.is_empty() && user.followers.is_empty());
        assert_eq!(token.user_id, "alice");
        assert_eq!(db.get_user("alice").await.unwrap(), user);
        assert_eq!(db.token_to_user_id(&token.token).await.unwrap(), "alice");
        assert_eq!(db.get_token("alice").await.unwrap(), token.token);
    }

    #[rocket::async_test]
    async fn test_create_user_twice() {
        let db = db_with(&["alice"]).await;
        let err = db.create_user("alice", "Other", "salt:key").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        // the failed attempt must not mint a second token
        assert_eq!(db.tokens.read().await.len(), 1);
    }

    #[rocket::async_test]
    async fn test_missing_lookups() {
        let db = MemoryDB::new();
        assert_eq!(db.get_user("ghost").await.unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(
            db.token_to_user_id("nope").await.unwrap_err().kind,
            ErrorKind::NotFound
        );
        assert_eq!(db.get_token("ghost").await.unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(
            db.get_user_dashboard("ghost").await.unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[rocket::async_test]
    async fn test_create_post_for_missing_user() {
        let db = MemoryDB::new();
        let post = Post::new(String::from("hello"), None);
        assert_eq!(
            db.create_post("ghost", post).await.unwrap_err().kind,
            ErrorKind::NotFound
        );
        assert!(db.get_all_users().await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn test_follow_then_unfollow() {
        let db = db_with(&["alice", "bobby"]).await;
        let mut alice = db.get_user("alice").await.unwrap();
        let mut bob = db.get_user("bobby").await.unwrap();

        db.follow_user(&mut alice, &mut bob).await.unwrap();
        assert!(alice.is_following("bobby"));
        assert!(bob.is_followed_by("alice"));
        assert!(db.get_user("alice").await.unwrap().is_following("bobby"));
        assert!(db.get_user("bobby").await.unwrap().is_followed_by("alice"));

        db.unfollow_user(&mut alice, &mut bob).await.unwrap();
        assert!(!db.get_user("alice").await.unwrap().is_following("bobby"));
        assert!(!db.get_user("bobby").await.unwrap().is_followed_by("alice"));
    }

    #[rocket::async_test]
    async fn test_dashboard_contains_followed_posts() {
        let db = db_with(&["alice", "bobby", "carol"]).await;
        for content in ["p1", "p2"] {
            db.create_post("alice", Post::new(content.to_string(), None)).await.unwrap();
        }
        db.create_post("bobby", Post::new(String::from("p3"), None)).await.unwrap();
        db.create_post("carol", Post::new(String::from("not followed"), None))
            .await
            .unwrap();
        let mut alice = db.get_user("alice").await.unwrap();
        let mut bob = db.get_user("bobby").await.unwrap();
        db.follow_user(&mut alice, &mut bob).await.unwrap();

        let dashboard = db.get_user_dashboard("alice").await.unwrap();
        let mut contents: Vec<String> = dashboard.into_iter().map(|f| f.post.content).collect();
        contents.sort();
        assert_eq!(contents, vec!["p1", "p2", "p3"]);
    }
}
