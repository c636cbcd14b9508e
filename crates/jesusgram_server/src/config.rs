use lazy_static::lazy_static;
use std::env;

pub const USERS_COLLECTION: &str = "users";
pub const TOKENS_COLLECTION: &str = "tokens";

lazy_static! {
    pub static ref MONGODB_URI: String =
        env::var("MONGODB_URI").unwrap_or(String::from(env!("MONGODB_URI")));
    pub static ref DATABASE_NAME: String =
        env::var("DATABASE_NAME").unwrap_or(String::from(env!("DATABASE_NAME")));
    pub static ref STORE_BACKEND: StoreBackend = match env::var("JESUSGRAM_STORE") {
        Ok(backend) => StoreBackend::parse(&backend),
        Err(_) => StoreBackend::Mongo,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl StoreBackend {
    /// Unknown values fall back to mongo
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => StoreBackend::Memory,
            _ => StoreBackend::Mongo,
        }
    }
}
