use crate::models::{Post, User};
use serde::{Deserialize, Serialize};

// A user as shown to other users: everything but the password hash
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub user_id: String,
    pub user_name: String,
    pub posts: Vec<Post>,
    pub following: Vec<String>,
    pub followers: Vec<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            user_id: user.user_id,
            user_name: user.user_name,
            posts: user.posts,
            following: user.following,
            followers: user.followers,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub token: String,
}
