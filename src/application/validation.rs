//! Structural checks for flag mutation payloads.
//!
//! Payloads arrive as loosely typed JSON objects. Validation runs before any storage
//! I/O, reports the first rule that fails, and produces a typed [`FlagPatch`] so the
//! service never touches raw JSON again.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::entities::{FeatureFlag, NewFeatureFlag};

const REQUIRED_ON_CREATE: [&str; 2] = ["name", "code"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    Create,
    Update,
}

/// The recognised keys of a mutation payload. `None` means the key was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
}

impl FlagPatch {
    pub fn enabled(value: bool) -> Self {
        Self {
            enabled: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.code.is_none()
            && self.description.is_none()
            && self.enabled.is_none()
    }

    /// Overwrites the fields present in the patch; absent keys leave the flag untouched.
    pub fn apply_to(&self, flag: &mut FeatureFlag) {
        if let Some(name) = &self.name {
            flag.name.clone_from(name);
        }
        if let Some(code) = &self.code {
            flag.code.clone_from(code);
        }
        if let Some(description) = &self.description {
            flag.description = Some(description.clone());
        }
        if let Some(enabled) = self.enabled {
            flag.enabled = enabled;
        }
    }
}

/// Checks `payload` against the rules for `mode`, in a fixed order: required keys,
/// `name` type, `name` emptiness, `code` type, `code` emptiness, `enabled` type,
/// `description` type.
pub fn validate(payload: &Value, mode: PayloadMode) -> Result<FlagPatch, ValidationError> {
    let object = payload
        .as_object()
        .ok_or_else(|| ValidationError::new("payload must be a JSON object"))?;

    if mode == PayloadMode::Create {
        if let Some(missing) = REQUIRED_ON_CREATE
            .iter()
            .find(|field| !object.contains_key(**field))
        {
            return Err(ValidationError::new(format!(
                "Missing required field: {missing}"
            )));
        }
    }

    let name = non_empty_string(object, "name")?;
    let code = non_empty_string(object, "code")?;

    let enabled = match object.get("enabled") {
        None => None,
        Some(Value::Bool(value)) => Some(*value),
        Some(_) => {
            return Err(ValidationError::new("'enabled' field must be a boolean"));
        }
    };

    let description = match object.get("description") {
        None => None,
        Some(Value::String(value)) => Some(value.clone()),
        Some(_) => {
            return Err(ValidationError::new("'description' field must be a string"));
        }
    };

    Ok(FlagPatch {
        name,
        code,
        description,
        enabled,
    })
}

/// Validates a creation payload and builds the unsaved flag; `enabled` defaults to false.
pub fn validate_create(payload: &Value) -> Result<NewFeatureFlag, ValidationError> {
    let patch = validate(payload, PayloadMode::Create)?;
    match (patch.name, patch.code) {
        (Some(name), Some(code)) => Ok(NewFeatureFlag {
            code,
            name,
            description: patch.description,
            enabled: patch.enabled.unwrap_or(false),
        }),
        (None, _) => Err(ValidationError::new("Missing required field: name")),
        (_, None) => Err(ValidationError::new("Missing required field: code")),
    }
}

pub fn validate_update(payload: &Value) -> Result<FlagPatch, ValidationError> {
    validate(payload, PayloadMode::Update)
}

fn non_empty_string(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match object.get(field) {
        None => Ok(None),
        Some(Value::String(value)) if value.is_empty() => Err(ValidationError::new(format!(
            "'{field}' field cannot be empty"
        ))),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ValidationError::new(format!(
            "'{field}' field must be a string"
        ))),
    }
}
