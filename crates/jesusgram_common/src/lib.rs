pub mod crypto;
pub mod errors;
pub mod http;
pub mod models;
pub mod utils;

pub const MIN_USER_ID_CHARS: usize = 4;
pub const MAX_USER_ID_CHARS: usize = 30;
pub const MIN_USERNAME_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 20;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 30;
pub const MAX_POST_CHARS: usize = 500;
