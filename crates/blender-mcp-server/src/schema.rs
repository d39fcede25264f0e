//! Argument checking for MCP tools
//!
//! A tool's arguments are a request struct deriving `JsonSchema` and
//! `Deserialize`. The derived schema is what `tools/list` advertises and what
//! every call is checked against with `jsonschema`, so the two cannot drift
//! apart. Before the check, a few [`Conventions`] are applied to the raw
//! arguments: aliases are renamed, choice values upper-cased, and nulls
//! dropped. Rules spanning several fields are checked after.
//!
//! Validation never stops at the first problem: a call with three bad
//! arguments reports all three.

use std::collections::BTreeSet;
use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError as SchemaViolation, Validator};
use rmcp::model::JsonObject;
use serde::Serialize;
use serde::de::{self, DeserializeOwned};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Field name used for problems with the arguments object as a whole
const WHOLE: &str = "arguments";

/// Constraint spanning several fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Exactly one of these fields must be given
    ExactlyOne(&'static [&'static str]),
}

impl Rule {
    fn check(&self, present: &BTreeSet<String>) -> Option<Violation> {
        match self {
            Self::ExactlyOne(fields) => {
                let given = fields.iter().filter(|f| present.contains(**f)).count();
                let message = match given {
                    1 => return None,
                    0 => "one of these is required",
                    _ => "only one of these may be given",
                };
                Some(Violation::new(fields.join("|"), message))
            }
        }
    }
}

/// How raw arguments are read before schema validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conventions {
    /// `(alias, field)` pairs; the alias is renamed to the field
    pub aliases: &'static [(&'static str, &'static str)],
    /// Fields whose string values are matched case-insensitively
    pub upper_case: &'static [&'static str],
    pub rules: &'static [Rule],
}

impl Conventions {
    pub const NONE: Self = Self {
        aliases: &[],
        upper_case: &[],
        rules: &[],
    };

    fn canonical<'a>(&self, key: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(alias, _)| *alias == key)
            .map_or(key, |(_, field)| *field)
    }
}

/// One problem with one argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Violations for one `jsonschema` error
    fn from_schema(error: &SchemaViolation<'_>) -> Vec<Self> {
        match &error.kind {
            ValidationErrorKind::Required { property } => {
                let field = property.as_str().map_or_else(|| property.to_string(), str::to_string);
                vec![Self::new(field, "is required")]
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
                .iter()
                .map(|key| Self::new(key.as_str(), "unknown argument"))
                .collect(),
            _ => {
                let path = error.instance_path.to_string();
                let field = path.split('/').nth(1).filter(|f| !f.is_empty()).unwrap_or(WHOLE);
                vec![Self::new(field, error.to_string())]
            }
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found in one set of arguments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid arguments for {tool}: {}", list(.violations))]
pub struct ValidationError {
    pub tool: String,
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Whether some violation concerns `field`
    pub fn names(&self, field: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.field.split('|').any(|f| f == field))
    }
}

fn list(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A request type's schema could not be compiled
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("argument schema of {tool} does not compile: {reason}")]
pub struct SchemaError {
    pub tool: String,
    pub reason: String,
}

/// Deserialize arguments into `T`, filling serde defaults, and serialize
/// them back as bridge parameters
pub fn params_of<T: DeserializeOwned + Serialize>(arguments: Value) -> Result<Map<String, Value>, serde_json::Error> {
    let request: T = serde_json::from_value(arguments)?;
    match serde_json::to_value(request)? {
        Value::Object(params) => Ok(params),
        other => Err(de::Error::custom(format!("request serialized to {other}, not an object"))),
    }
}

/// Compiled argument schema of one tool
pub struct ArgumentSchema {
    /// Derived schema plus alias properties, as advertised
    advertised: JsonObject,
    /// Derived schema only, as enforced after aliases are renamed
    validator: Validator,
    properties: BTreeSet<String>,
    conventions: Conventions,
    params: fn(Value) -> Result<Map<String, Value>, serde_json::Error>,
}

impl fmt::Debug for ArgumentSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentSchema")
            .field("properties", &self.properties)
            .field("conventions", &self.conventions)
            .finish_non_exhaustive()
    }
}

impl ArgumentSchema {
    pub fn compile(
        tool: &str,
        mut derived: JsonObject,
        conventions: Conventions,
        params: fn(Value) -> Result<Map<String, Value>, serde_json::Error>,
    ) -> Result<Self, SchemaError> {
        // Unknown arguments are only reported by name when "properties" exists
        derived
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        let validator = jsonschema::validator_for(&Value::Object(derived.clone())).map_err(|err| SchemaError {
            tool: tool.to_string(),
            reason: err.to_string(),
        })?;

        let properties: BTreeSet<String> = derived
            .get("properties")
            .and_then(Value::as_object)
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();

        let mut advertised = derived;
        if let Some(listed) = advertised.get_mut("properties").and_then(Value::as_object_mut) {
            for (alias, field) in conventions.aliases {
                listed.insert(
                    (*alias).to_string(),
                    json!({ "type": "string", "description": format!("Alias for {field}") }),
                );
            }
        }

        Ok(Self {
            advertised,
            validator,
            properties,
            conventions,
            params,
        })
    }

    /// JSON Schema for the arguments object
    pub fn input_schema(&self) -> &JsonObject {
        &self.advertised
    }

    /// Names of the request fields
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(String::as_str)
    }

    /// Check raw call arguments and produce the bridge parameters
    ///
    /// A `null` argument counts as omitted, unless its name is unknown.
    pub fn validate(&self, tool: &str, raw: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let mut violations = Vec::new();
        let mut arguments = Map::new();

        for (key, value) in raw {
            let field = self.conventions.canonical(key);
            if value.is_null() && self.properties.contains(field) {
                continue;
            }
            if arguments.contains_key(field) {
                violations.push(Violation::new(
                    key.as_str(),
                    format!("given more than once (as '{field}' or an alias)"),
                ));
                continue;
            }
            let value = match value {
                Value::String(text) if self.conventions.upper_case.iter().any(|f| *f == field) => {
                    Value::String(text.to_uppercase())
                }
                other => other.clone(),
            };
            arguments.insert(field.to_string(), value);
        }

        let arguments = Value::Object(arguments);
        for error in self.validator.iter_errors(&arguments) {
            for violation in Violation::from_schema(&error) {
                merge(&mut violations, violation);
            }
        }

        let present: BTreeSet<String> = arguments
            .as_object()
            .map(|a| a.keys().cloned().collect())
            .unwrap_or_default();
        violations.extend(self.conventions.rules.iter().filter_map(|rule| rule.check(&present)));

        if !violations.is_empty() {
            return Err(ValidationError {
                tool: tool.to_string(),
                violations,
            });
        }

        (self.params)(arguments).map_err(|err| ValidationError {
            tool: tool.to_string(),
            violations: vec![Violation::new(WHOLE, err.to_string())],
        })
    }
}

/// Add a violation, folding it into an earlier one for the same field
fn merge(violations: &mut Vec<Violation>, violation: Violation) {
    match violations.iter_mut().find(|v| v.field == violation.field) {
        Some(existing) => {
            existing.message.push_str("; ");
            existing.message.push_str(&violation.message);
        }
        None => violations.push(violation),
    }
}
