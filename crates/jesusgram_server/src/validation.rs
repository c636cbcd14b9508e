use jesusgram_common::errors::JesusgramError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub const MISSING: &str = "required property missing";

/// Collects every problem with a request before failing, keyed by field name
#[derive(Debug, Default)]
pub struct Violations(Map<String, Value>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem with a field, the first problem reported for a field wins
    pub fn add(&mut self, field: &str, reason: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| Value::String(reason.into()));
    }

    /// Record `reason` for `field` unless `valid` holds
    pub fn check(&mut self, field: &str, valid: bool, reason: &str) {
        if !valid {
            self.add(field, reason);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// One aggregated BAD_REQUEST if anything was recorded
    pub fn into_result(self) -> Result<(), JesusgramError> {
        match self.0.is_empty() {
            true => Ok(()),
            false => Err(JesusgramError::bad_request(Value::Object(self.0))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
        }
    }

    /// The type name of a json value, in the same vocabulary
    pub fn of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        FieldType::of(value) == self.name()
    }
}

#[derive(Clone, Debug)]
struct Field {
    name: &'static str,
    field_type: FieldType,
    required: bool,
}

/**
 * Declared shape of a json request body
 * @dev a field that is absent, null or an empty string counts as missing
 */
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, field_type: FieldType) -> Self {
        self.fields.push(Field {
            name,
            field_type,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, field_type: FieldType) -> Self {
        self.fields.push(Field {
            name,
            field_type,
            required: false,
        });
        self
    }

    /**
     * Check a body against the schema
     *
     * @param body - the raw json body
     * @returns - Ok, or a single BAD_REQUEST listing every missing or wrong-typed field
     */
    pub fn check(&self, body: &Value) -> Result<(), JesusgramError> {
        let object = match body {
            Value::Object(object) => object,
            other => {
                let mut violations = Violations::new();
                violations.add(
                    "body",
                    format!("wrong type. expected object. instead got {}", FieldType::of(other)),
                );
                return violations.into_result();
            }
        };
        let mut violations = Violations::new();
        for field in self.fields.iter() {
            let value = match object.get(field.name) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) if s.is_empty() => None,
                Some(value) => Some(value),
            };
            match value {
                None if field.required => violations.add(field.name, MISSING),
                None => (),
                Some(value) if !field.field_type.matches(value) => violations.add(
                    field.name,
                    format!(
                        "wrong type. expected {}. instead got {}",
                        field.field_type.name(),
                        FieldType::of(value)
                    ),
                ),
                Some(_) => (),
            }
        }
        violations.into_result()
    }

    /// Check the body, then deserialize it into the typed request
    pub fn parse<T: DeserializeOwned>(&self, body: Value) -> Result<T, JesusgramError> {
        self.check(&body)?;
        match serde_json::from_value::<T>(body) {
            Ok(request) => Ok(request),
            Err(e) => Err(JesusgramError::bad_request(e.to_string())),
        }
    }
}

pub fn create_user_schema() -> Schema {
    Schema::new()
        .required("userId", FieldType::String)
        .required("userName", FieldType::String)
        .required("password", FieldType::String)
}

pub fn login_schema() -> Schema {
    Schema::new()
        .required("userId", FieldType::String)
        .required("password", FieldType::String)
}

pub fn new_post_schema() -> Schema {
    Schema::new()
        .required("post", FieldType::String)
        .optional("image", FieldType::String)
}
