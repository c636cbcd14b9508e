use crate::{
    MAX_PASSWORD_CHARS, MAX_POST_CHARS, MAX_USERNAME_CHARS, MAX_USER_ID_CHARS,
    MIN_PASSWORD_CHARS, MIN_USERNAME_CHARS, MIN_USER_ID_CHARS,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref USER_ID_REGEX: Regex =
        Regex::new(&format!("^[a-z0-9]{{{},{}}}$", MIN_USER_ID_CHARS, MAX_USER_ID_CHARS))
            .expect("valid userId pattern");
    static ref USERNAME_REGEX: Regex = Regex::new(&format!(
        "^[a-zA-Z0-9]{{{},{}}}$",
        MIN_USERNAME_CHARS, MAX_USERNAME_CHARS
    ))
    .expect("valid userName pattern");
}

pub const USER_ID_RULE: &str = "Only lowercase letters and digits. Length: [4, 30] characters";
pub const USERNAME_RULE: &str = "Only alphanumeric characters. Length: [3, 20] characters";
pub const PASSWORD_RULE: &str = "Must contain at least one number, one uppercase/lowercase letter. Length: [8, 30] characters";
pub const POST_RULE: &str = "Must not be blank. Length: at most 500 characters";

/// userId: lowercase ascii letters and digits, 4 to 30 chars
pub fn is_valid_user_id(user_id: &str) -> bool {
    USER_ID_REGEX.is_match(user_id)
}

/// userName: ascii letters and digits, 3 to 20 chars
pub fn is_valid_username(user_name: &str) -> bool {
    USERNAME_REGEX.is_match(user_name)
}

/**
 * Checks the password policy
 * @dev the regex crate has no lookahead, so the character classes are checked separately
 *
 * @param password - the plaintext password
 * @returns - true if 8-30 chars with at least one digit, one lowercase and one uppercase letter
 */
pub fn is_valid_password(password: &str) -> bool {
    let length = password.chars().count();
    (MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&length)
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
}

/// post content: not blank, at most 500 chars
pub fn is_valid_post(content: &str) -> bool {
    !content.trim().is_empty() && content.chars().count() <= MAX_POST_CHARS
}
