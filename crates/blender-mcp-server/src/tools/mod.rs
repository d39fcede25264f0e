//! MCP tool catalogue
//!
//! Each tool is a static [`ToolSpec`]: its name and description as shown to
//! agents, the bridge command it forwards to, and the request type whose
//! derived schema its arguments must satisfy.
//! - Objects (create, delete, move, scale, rotate)
//! - Materials (create, assign, set property)
//! - Scene (info, camera, render)

pub mod material;
pub mod object;
pub mod scene;

use std::collections::HashMap;
use std::sync::LazyLock;

use blender_mcp_protocol::CommandKind;
use rmcp::handler::server::common::schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::schema::{self, ArgumentSchema, Conventions, Rule, SchemaError, ValidationError};

/// One MCP tool and the bridge command behind it
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub command: CommandKind,
    pub conventions: Conventions,
    request_schema: fn() -> JsonObject,
    to_params: fn(Value) -> Result<Map<String, Value>, serde_json::Error>,
}

impl ToolSpec {
    /// A tool whose arguments are a `T`
    pub const fn new<T>(name: &'static str, description: &'static str, command: CommandKind) -> Self
    where
        T: JsonSchema + DeserializeOwned + Serialize,
    {
        Self {
            name,
            description,
            command,
            conventions: Conventions::NONE,
            request_schema: schema_for_type::<T>,
            to_params: schema::params_of::<T>,
        }
    }

    pub const fn aliases(mut self, aliases: &'static [(&'static str, &'static str)]) -> Self {
        self.conventions.aliases = aliases;
        self
    }

    pub const fn upper_case(mut self, fields: &'static [&'static str]) -> Self {
        self.conventions.upper_case = fields;
        self
    }

    pub const fn rules(mut self, rules: &'static [Rule]) -> Self {
        self.conventions.rules = rules;
        self
    }

    /// The compiled argument schema, built once per process
    pub fn arguments(&self) -> Result<&'static ArgumentSchema, SchemaError> {
        match COMPILED.get(self.name) {
            Some(Ok(schema)) => Ok(schema),
            Some(Err(err)) => Err(err.clone()),
            None => Err(SchemaError {
                tool: self.name.to_string(),
                reason: "not in the catalogue".to_string(),
            }),
        }
    }

    fn compile(&self) -> Result<ArgumentSchema, SchemaError> {
        ArgumentSchema::compile(self.name, (self.request_schema)(), self.conventions, self.to_params)
    }

    /// Check call arguments and build the bridge parameters
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<Map<String, Value>, ArgumentError> {
        Ok(self.arguments()?.validate(self.name, arguments)?)
    }
}

/// Why arguments could not be turned into bridge parameters
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Every tool, in the order `tools/list` reports them
pub const CATALOGUE: &[ToolSpec] = &[
    object::CREATE_OBJECT,
    object::DELETE_OBJECT,
    object::MOVE_OBJECT,
    object::SCALE_OBJECT,
    object::ROTATE_OBJECT,
    material::CREATE_MATERIAL,
    material::ASSIGN_MATERIAL,
    material::SET_MATERIAL_PROPERTY,
    scene::GET_SCENE_INFO,
    scene::SET_CAMERA_POSITION,
    scene::RENDER_SCENE,
];

static COMPILED: LazyLock<HashMap<&'static str, Result<ArgumentSchema, SchemaError>>> =
    LazyLock::new(|| CATALOGUE.iter().map(|tool| (tool.name, tool.compile())).collect());

pub fn find(name: &str) -> Option<&'static ToolSpec> {
    CATALOGUE.iter().find(|tool| tool.name == name)
}
