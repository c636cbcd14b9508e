use catchers::{bad_request, internal_error, not_found, unauthorized, unprocessable};
use config::{StoreBackend, STORE_BACKEND};
use jesusgram_common::crypto::CredentialHasher;
use memory::MemoryDB;
use mongo::JesusgramDB;
use rocket::{catchers, get, routes, Build, Rocket};
use routes::{POST_ROUTES, USER_ROUTES};
use services::Services;
use store::JesusgramStore;
use tracing::info;

mod catchers;
mod config;
mod guards;
mod memory;
mod mongo;
mod routes;
mod services;
mod store;
mod validation;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt::init();
    // connect to the configured store
    let store: Box<dyn JesusgramStore> = match *STORE_BACKEND {
        StoreBackend::Mongo => Box::new(JesusgramDB::init().await?),
        StoreBackend::Memory => {
            info!("Using the in-memory store, data will not survive a restart");
            Box::new(MemoryDB::new())
        }
    };
    let services = Services::new(store, CredentialHasher::default());
    build_rocket(services).launch().await?;
    Ok(())
}

pub(crate) fn build_rocket(services: Services) -> Rocket<Build> {
    rocket::build()
        .manage(services)
        .mount("/", routes![health])
        .mount("/user", USER_ROUTES.clone())
        .mount("/user", POST_ROUTES.clone())
        .register(
            "/",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
}

#[get("/health")]
async fn health() -> &'static str {
    "Hello, world!"
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::services::test::{faulty_services, test_services};
    use std::sync::atomic::Ordering;
    use jesusgram_common::errors::{ErrorKind, JesusgramError};
    use jesusgram_common::http::responses::{PublicUser, SessionResponse};
    use jesusgram_common::models::FeedPost;
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::asynchronous::{Client, LocalResponse};
    use serde_json::json;

    struct JesusgramTestContext {
        client: Client,
    }

    impl JesusgramTestContext {
        async fn init() -> Self {
            let rocket = build_rocket(test_services());
            JesusgramTestContext {
                client: Client::tracked(rocket).await.unwrap(),
            }
        }

        async fn register(&self, user_id: &str) -> String {
            let res = self
                .client
                .post("/user/create")
                .header(ContentType::JSON)
                .body(
                    json!({ "userId": user_id, "userName": "Tester", "password": "Passw0rd" })
                        .to_string(),
                )
                .dispatch()
                .await;
            assert_eq!(res.status(), Status::Created);
            res.into_json::<SessionResponse>().await.unwrap().token
        }

        async fn post(&self, user_id: &str, token: &str, content: &str) -> LocalResponse<'_> {
            self.client
                .post(format!("/user/{}/post", user_id))
                .header(ContentType::JSON)
                .header(bearer(token))
                .body(json!({ "post": content }).to_string())
                .dispatch()
                .await
        }
    }

    fn bearer(token: &str) -> Header<'static> {
        Header::new("Authorization", format!("Bearer {}", token))
    }

    async fn error_of(res: LocalResponse<'_>) -> JesusgramError {
        res.into_json::<JesusgramError>().await.unwrap()
    }

    #[rocket::async_test]
    async fn test_health() {
        let JesusgramTestContext { client } = JesusgramTestContext::init().await;
        let res = client.get("/health").dispatch().await;
        assert_eq!(res.status(), Status::Ok);
        assert_eq!(res.into_string().await.unwrap(), "Hello, world!");
    }

    #[rocket::async_test]
    async fn test_create_user() {
        let context = JesusgramTestContext::init().await;
        let token = context.register("alice").await;
        assert!(!token.is_empty());

        // the stored hash never leaves the server
        let res = context.client.get("/user/alice").dispatch().await;
        assert_eq!(res.status(), Status::Ok);
        let body = res.into_json::<serde_json::Value>().await.unwrap();
        assert_eq!(body["userId"], "alice");
        assert!(body.get("hashedPassword").is_none());

        let res = context
            .client
            .post("/user/create")
            .header(ContentType::JSON)
            .body(json!({ "userId": "alice", "userName": "Again", "password": "Passw0rd" }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Conflict);
        assert_eq!(error_of(res).await.kind, ErrorKind::AlreadyExists);
    }

    #[rocket::async_test]
    async fn test_create_user_bad_request() {
        let JesusgramTestContext { client } = JesusgramTestContext::init().await;
        let res = client
            .post("/user/create")
            .header(ContentType::JSON)
            .body(json!({ "userId": 7, "password": "Passw0rd" }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::BadRequest);
        let err = error_of(res).await;
        assert_eq!(err.code(), 1001);
        assert!(err.info.get("userId").is_some());
        assert!(err.info.get("userName").is_some());
        assert!(err.info.get("password").is_none());

        let res = client
            .post("/user/create")
            .header(ContentType::JSON)
            .body(json!({ "userId": "A!", "userName": "Valid", "password": "Passw0rd" }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::BadRequest);
        let err = error_of(res).await;
        assert_eq!(err.info.as_object().unwrap().keys().collect::<Vec<_>>(), vec!["userId"]);
    }

    #[rocket::async_test]
    async fn test_login() {
        let context = JesusgramTestContext::init().await;
        let token = context.register("alice").await;

        let res = context
            .client
            .post("/user/login")
            .header(ContentType::JSON)
            .body(json!({ "userId": "alice", "password": "Passw0rd" }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);
        let session = res.into_json::<SessionResponse>().await.unwrap();
        assert_eq!(session.token, token);
        assert_eq!(session.user.user_id, "alice");

        let res = context
            .client
            .post("/user/login")
            .header(ContentType::JSON)
            .body(json!({ "userId": "alice", "password": "Wrongpass1" }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Unauthorized);
        assert_eq!(error_of(res).await.kind, ErrorKind::Unauthenticated);
    }

    #[rocket::async_test]
    async fn test_unknown_user() {
        let JesusgramTestContext { client } = JesusgramTestContext::init().await;
        let res = client.get("/user/ghost").dispatch().await;
        assert_eq!(res.status(), Status::NotFound);
        assert_eq!(error_of(res).await.kind, ErrorKind::NotFound);
    }

    #[rocket::async_test]
    async fn test_post_requires_matching_token() {
        let context = JesusgramTestContext::init().await;
        let alice = context.register("alice").await;
        let bob = context.register("bobby").await;

        let res = context.post("alice", &alice, "hello").await;
        assert_eq!(res.status(), Status::Created);
        let user = res.into_json::<PublicUser>().await.unwrap();
        assert_eq!(user.posts.len(), 1);

        let res = context.post("alice", &bob, "impostor").await;
        assert_eq!(res.status(), Status::Unauthorized);

        let res = context
            .client
            .post("/user/alice/post")
            .header(ContentType::JSON)
            .body(json!({ "post": "anonymous" }).to_string())
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Unauthorized);
        assert_eq!(error_of(res).await.kind, ErrorKind::Unauthenticated);
    }

    #[rocket::async_test]
    async fn test_malformed_authorization_header() {
        let context = JesusgramTestContext::init().await;
        context.register("alice").await;
        let res = context
            .client
            .get("/user/alice/dashboard")
            .header(Header::new("Authorization", "Basic abc"))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::BadRequest);
        let err = error_of(res).await;
        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert_eq!(err.info, json!("Malformed authorization header"));
    }

    #[rocket::async_test]
    async fn test_follow_and_dashboard() {
        let context = JesusgramTestContext::init().await;
        let alice = context.register("alice").await;
        let bob = context.register("bobby").await;
        context.post("alice", &alice, "p1").await;
        context.post("alice", &alice, "p2").await;
        context.post("bobby", &bob, "p3").await;

        let res = context
            .client
            .post("/user/alice/follow/bobby")
            .header(bearer(&alice))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);
        let follower = res.into_json::<PublicUser>().await.unwrap();
        assert_eq!(follower.following, vec!["bobby".to_string()]);

        let res = context
            .client
            .get("/user/alice/dashboard")
            .header(bearer(&alice))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);
        let dashboard = res.into_json::<Vec<FeedPost>>().await.unwrap();
        let mut contents: Vec<String> = dashboard.into_iter().map(|f| f.post.content).collect();
        contents.sort();
        assert_eq!(contents, vec!["p1", "p2", "p3"]);

        let res = context
            .client
            .post("/user/alice/follow/alice")
            .header(bearer(&alice))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::BadRequest);

        let res = context
            .client
            .post("/user/alice/follow/ghost")
            .header(bearer(&alice))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::NotFound);

        let res = context
            .client
            .post("/user/alice/unfollow/bobby")
            .header(bearer(&alice))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);
        let res = context.client.get("/user/bobby").dispatch().await;
        let bobby = res.into_json::<PublicUser>().await.unwrap();
        assert!(bobby.followers.is_empty());
    }

    #[rocket::async_test]
    async fn test_get_all_users() {
        let context = JesusgramTestContext::init().await;
        context.register("carol").await;
        context.register("alice").await;
        let res = context.client.get("/user/all").dispatch().await;
        assert_eq!(res.status(), Status::Ok);
        let users = res.into_json::<Vec<PublicUser>>().await.unwrap();
        let ids: Vec<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "carol"]);
    }

    #[rocket::async_test]
    async fn test_store_outage_is_bad_gateway() {
        let (services, faults) = faulty_services();
        let client = Client::tracked(build_rocket(services)).await.unwrap();
        faults.tokens_down.store(true, Ordering::SeqCst);
        let res = client
            .get("/user/alice/dashboard")
            .header(bearer("some-token"))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::BadGateway);
        assert_eq!(error_of(res).await.kind, ErrorKind::ExtSvcFail);
    }

    #[rocket::async_test]
    async fn test_unknown_route() {
        let JesusgramTestContext { client } = JesusgramTestContext::init().await;
        let res = client.get("/nowhere").dispatch().await;
        assert_eq!(res.status(), Status::NotFound);
        assert_eq!(error_of(res).await.code(), 1002);
    }
}
