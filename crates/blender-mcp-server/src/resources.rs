//! Read-only scene views served as MCP resources

use std::fmt;

use blender_mcp_protocol::CommandKind;
use serde_json::{Map, Value, json};

use crate::dispatch::{Dispatcher, ToolError};

pub const OBJECTS_URI: &str = "blender://scene/objects";
pub const MATERIALS_URI: &str = "blender://scene/materials";
/// Followed by the object name
pub const OBJECT_URI_PREFIX: &str = "blender://object/";

/// A resource URI resolved to what it names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneResource {
    /// Every object with its transform and materials
    Objects,
    /// Every material with its inputs
    Materials,
    /// A single object by name
    Object(String),
}

impl SceneResource {
    /// Resources with a fixed URI, as listed by `resources/list`
    pub const LISTED: [Self; 2] = [Self::Objects, Self::Materials];

    /// Resolve a URI; object names are percent-decoded
    pub fn parse(uri: &str) -> Option<Self> {
        match uri {
            OBJECTS_URI => Some(Self::Objects),
            MATERIALS_URI => Some(Self::Materials),
            _ => uri
                .strip_prefix(OBJECT_URI_PREFIX)
                .filter(|name| !name.is_empty())
                .and_then(|name| urlencoding::decode(name).ok())
                .map(|name| Self::Object(name.into_owned())),
        }
    }

    pub fn uri(&self) -> String {
        match self {
            Self::Objects => OBJECTS_URI.to_string(),
            Self::Materials => MATERIALS_URI.to_string(),
            Self::Object(name) => format!("{OBJECT_URI_PREFIX}{}", urlencoding::encode(name)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Objects => "scene_objects",
            Self::Materials => "scene_materials",
            Self::Object(name) => name,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Objects => "All objects in the current scene",
            Self::Materials => "All materials in the blend file",
            Self::Object(_) => "Detailed properties of one object",
        }
    }

    /// Ask Blender for the current contents, as pretty-printed JSON
    ///
    /// Nothing is cached; every read is a fresh bridge call.
    pub async fn fetch(&self, dispatcher: &Dispatcher) -> Result<String, ToolError> {
        let value = match self {
            Self::Objects => {
                let mut info = dispatcher.query(CommandKind::GetSceneInfo, Map::new()).await?;
                info.get_mut("objects").map_or(Value::Array(Vec::new()), Value::take)
            }
            Self::Materials => dispatcher.query(CommandKind::GetMaterials, Map::new()).await?,
            Self::Object(name) => {
                let mut params = Map::new();
                params.insert("object_name".into(), json!(name));
                dispatcher.query(CommandKind::GetObjectInfo, params).await?
            }
        };
        Ok(serde_json::to_string_pretty(&value).unwrap_or_default())
    }
}

impl fmt::Display for SceneResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}
