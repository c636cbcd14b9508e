use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// A short message owned by a user; lives only inside the owner's `posts` array
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>, // reference to an uploaded image, storage is external
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(content: String, image: Option<String>) -> Self {
        Post {
            content,
            image,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub user_name: String,
    pub hashed_password: String,
    #[serde(default)]
    pub posts: Vec<Post>, // append only, insertion order is chronological
    #[serde(default)]
    pub following: Vec<String>, // userIds this user follows
    #[serde(default)]
    pub followers: Vec<String>, // userIds following this user
}

impl User {
    /**
     * A freshly registered user with no posts and no relations
     *
     * @param user_id - the unique, already validated id
     * @param user_name - the display name
     * @param hashed_password - the encoded salted hash, never the plaintext
     */
    pub fn new(user_id: String, user_name: String, hashed_password: String) -> Self {
        User {
            id: None,
            user_id,
            user_name,
            hashed_password,
            posts: vec![],
            following: vec![],
            followers: vec![],
        }
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.following.iter().any(|id| id == user_id)
    }

    pub fn is_followed_by(&self, user_id: &str) -> bool {
        self.followers.iter().any(|id| id == user_id)
    }

    /**
     * Record that this user follows `other` and `other` is followed by this user
     * @notice - only mutates the records, persisting both sides is up to the caller
     *
     * @returns - true if either side changed
     */
    pub fn follow(&mut self, other: &mut User) -> bool {
        let mut changed = false;
        if !self.is_following(&other.user_id) {
            self.following.push(other.user_id.clone());
            changed = true;
        }
        if !other.is_followed_by(&self.user_id) {
            other.followers.push(self.user_id.clone());
            changed = true;
        }
        changed
    }

    /**
     * Remove both sides of a follow relation
     *
     * @returns - true if either side changed
     */
    pub fn unfollow(&mut self, other: &mut User) -> bool {
        let before = self.following.len() + other.followers.len();
        self.following.retain(|id| id != &other.user_id);
        other.followers.retain(|id| id != &self.user_id);
        before != self.following.len() + other.followers.len()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub token: String,
    pub user_id: String,
}

impl Token {
    /// Mint a new random bearer token for a user
    pub fn new(user_id: &str) -> Self {
        Token {
            id: None,
            token: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
        }
    }
}

// One dashboard entry: a post together with the user who wrote it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub user_id: String,
    pub post: Post,
}

/**
 * Merge a user's posts with the posts of the users they follow
 * @dev owner posts first, then each followee in the order given; the result is then stably
 *      sorted most recent first so equal timestamps keep concatenation order
 *
 * @param owner - the user the dashboard is built for
 * @param followees - the followed users, in the owner's `following` order
 * @returns - every post exactly once per occurrence, newest first
 */
pub fn build_dashboard(owner: &User, followees: &[User]) -> Vec<FeedPost> {
    let mut dashboard: Vec<FeedPost> = std::iter::once(owner)
        .chain(followees.iter())
        .flat_map(|user| {
            user.posts.iter().map(move |post| FeedPost {
                user_id: user.user_id.clone(),
                post: post.clone(),
            })
        })
        .collect();
    dashboard.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
    dashboard
}
