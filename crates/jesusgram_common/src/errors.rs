use serde::{Deserialize, Serialize};
use serde_json::Value;

/**
 * The fixed set of failure kinds used across the data access, service and http layers
 * @notice - callers branch on the kind, never on the message text
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Fail,
    BadRequest,
    NotFound,
    AlreadyExists,
    ExtSvcFail,
    Unauthenticated,
    Forbidden,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Fail,
        ErrorKind::BadRequest,
        ErrorKind::NotFound,
        ErrorKind::AlreadyExists,
        ErrorKind::ExtSvcFail,
        ErrorKind::Unauthenticated,
        ErrorKind::Forbidden,
    ];

    pub fn code(&self) -> u16 {
        match self {
            ErrorKind::Fail => 1000,
            ErrorKind::BadRequest => 1001,
            ErrorKind::NotFound => 1002,
            ErrorKind::AlreadyExists => 1003,
            ErrorKind::ExtSvcFail => 1004,
            ErrorKind::Unauthenticated => 1005,
            ErrorKind::Forbidden => 1006,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Fail => "FAIL",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::ExtSvcFail => "EXT_SVC_FAIL",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Forbidden => "FORBIDDEN",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::Fail => "An error occurred",
            ErrorKind::BadRequest => "The request is bad",
            ErrorKind::NotFound => "The item does not exist",
            ErrorKind::AlreadyExists => "The item already exists",
            ErrorKind::ExtSvcFail => "External service failure",
            ErrorKind::Unauthenticated => "Invalid or missing token",
            ErrorKind::Forbidden => "Wrong username and/or password",
        }
    }

    pub fn from_name(name: &str) -> Option<ErrorKind> {
        ErrorKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/**
 * An error of a given kind with arbitrary contextual info attached
 * @dev serialized on the wire as { code, name, message, info }
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "ErrorBody", try_from = "ErrorBody")]
pub struct JesusgramError {
    pub kind: ErrorKind,
    pub info: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ErrorBody {
    code: u16,
    name: String,
    message: String,
    #[serde(default)]
    info: Value,
}

impl From<JesusgramError> for ErrorBody {
    fn from(err: JesusgramError) -> Self {
        ErrorBody {
            code: err.kind.code(),
            name: err.kind.name().to_string(),
            message: err.kind.message().to_string(),
            info: err.info,
        }
    }
}

impl TryFrom<ErrorBody> for JesusgramError {
    type Error = String;

    fn try_from(body: ErrorBody) -> Result<Self, Self::Error> {
        match ErrorKind::from_name(&body.name) {
            Some(kind) if kind.code() == body.code => Ok(JesusgramError::new(kind, body.info)),
            _ => Err(format!("Unknown error {} ({})", body.name, body.code)),
        }
    }
}

impl JesusgramError {
    pub fn new(kind: ErrorKind, info: impl Into<Value>) -> Self {
        JesusgramError {
            kind,
            info: info.into(),
        }
    }

    pub fn fail(info: impl Into<Value>) -> Self {
        Self::new(ErrorKind::Fail, info)
    }

    pub fn bad_request(info: impl Into<Value>) -> Self {
        Self::new(ErrorKind::BadRequest, info)
    }

    pub fn not_found(info: impl Into<Value>) -> Self {
        Self::new(ErrorKind::NotFound, info)
    }

    pub fn already_exists(info: impl Into<Value>) -> Self {
        Self::new(ErrorKind::AlreadyExists, info)
    }

    pub fn ext_svc_fail(info: impl Into<Value>) -> Self {
        Self::new(ErrorKind::ExtSvcFail, info)
    }

    pub fn unauthenticated(info: impl Into<Value>) -> Self {
        Self::new(ErrorKind::Unauthenticated, info)
    }

    pub fn forbidden(info: impl Into<Value>) -> Self {
        Self::new(ErrorKind::Forbidden, info)
    }

    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }
}

impl std::fmt::Display for JesusgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.info {
            Value::Null => write!(f, "{} ({}): {}", self.kind, self.code(), self.message()),
            Value::String(info) => write!(
                f,
                "{} ({}): {}: {}",
                self.kind,
                self.code(),
                self.message(),
                info
            ),
            info => write!(
                f,
                "{} ({}): {}: {}",
                self.kind,
                self.code(),
                self.message(),
                info
            ),
        }
    }
}

impl std::error::Error for JesusgramError {}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_registry() {
        let expected = [
            (1000, "FAIL", "An error occurred"),
            (1001, "BAD_REQUEST", "The request is bad"),
            (1002, "NOT_FOUND", "The item does not exist"),
            (1003, "ALREADY_EXISTS", "The item already exists"),
            (1004, "EXT_SVC_FAIL", "External service failure"),
            (1005, "UNAUTHENTICATED", "Invalid or missing token"),
            (1006, "FORBIDDEN", "Wrong username and/or password"),
        ];
        for (kind, (code, name, message)) in ErrorKind::ALL.iter().zip(expected) {
            assert_eq!(kind.code(), code);
            assert_eq!(kind.name(), name);
            assert_eq!(kind.message(), message);
            assert_eq!(ErrorKind::from_name(name), Some(*kind));
        }
        assert_eq!(ErrorKind::from_name("MISSING_PARAM"), None);
    }

    #[test]
    fn test_error_wire_format() {
        let err = JesusgramError::not_found(json!({ "token for user": "alice" }));
        let serialized = serde_json::to_value(&err).unwrap();
        assert_eq!(
            serialized,
            json!({
                "code": 1002,
                "name": "NOT_FOUND",
                "message": "The item does not exist",
                "info": { "token for user": "alice" }
            })
        );
        let parsed: JesusgramError = serde_json::from_value(serialized).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn test_error_rejects_mismatched_code() {
        let body = json!({ "code": 1000, "name": "NOT_FOUND", "message": "", "info": null });
        assert!(serde_json::from_value::<JesusgramError>(body).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = JesusgramError::already_exists("User with specified userId already exists.");
        assert_eq!(
            err.to_string(),
            "ALREADY_EXISTS (1003): The item already exists: User with specified userId already exists."
        );
        assert_eq!(
            JesusgramError::fail(Value::Null).to_string(),
            "FAIL (1000): An error occurred"
        );
    }
}
