//! JSON schema validators for meshlint DTOs.
//!
//! Schemas are generated from the DTO types with schemars, the same way
//! `meshlint schema` prints them.

use jsonschema::JSONSchema;
use meshlint_types::{ConfigFile, RunReceipt};
use schemars::JsonSchema;
use serde_json::Value;

/// Error type for schema validation failures.
#[derive(Debug)]
pub struct SchemaValidationError {
    /// The validation errors.
    pub errors: Vec<String>,
}

impl std::fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Schema validation failed: {}", self.errors.join("; "))
    }
}

impl std::error::Error for SchemaValidationError {}

fn compile<T: JsonSchema>() -> JSONSchema {
    let schema = serde_json::to_value(schemars::schema_for!(T)).expect("schema should serialize");
    JSONSchema::compile(&schema).expect("schema should compile")
}

fn validate(schema: &JSONSchema, instance: &Value) -> Result<(), SchemaValidationError> {
    match schema.validate(instance) {
        Ok(()) => Ok(()),
        Err(errors) => Err(SchemaValidationError {
            errors: errors
                .map(|e| format!("{} at {}", e, e.instance_path))
                .collect(),
        }),
    }
}

/// Validate a serialized run receipt against the `RunReceipt` schema.
pub fn validate_run_receipt(instance: &Value) -> Result<(), SchemaValidationError> {
    validate(&compile::<RunReceipt>(), instance)
}

/// Validate a serialized config file against the `ConfigFile` schema.
pub fn validate_config_file(instance: &Value) -> Result<(), SchemaValidationError> {
    validate(&compile::<ConfigFile>(), instance)
}
