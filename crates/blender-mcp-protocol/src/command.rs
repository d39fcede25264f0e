//! Commands sent from the bridge to Blender

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every command the Blender-side executor understands
///
/// The wire carries the command as a plain string so that older or newer
/// peers can still talk; [`Command::kind`] is where a string becomes one of
/// these, and anything else is an [`UnknownCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CreateObject,
    DeleteObject,
    MoveObject,
    ScaleObject,
    RotateObject,
    CreateMaterial,
    AssignMaterial,
    SetMaterialProperty,
    GetSceneInfo,
    GetMaterials,
    GetObjectInfo,
    SetCameraPosition,
    RenderScene,
    /// Liveness check, touches nothing
    Ping,
    /// Ask the executor to close this connection after replying
    Disconnect,
}

impl CommandKind {
    /// All command kinds, in wire-name order of the tool catalogue
    pub const ALL: [Self; 15] = [
        Self::CreateObject,
        Self::DeleteObject,
        Self::MoveObject,
        Self::ScaleObject,
        Self::RotateObject,
        Self::CreateMaterial,
        Self::AssignMaterial,
        Self::SetMaterialProperty,
        Self::GetSceneInfo,
        Self::GetMaterials,
        Self::GetObjectInfo,
        Self::SetCameraPosition,
        Self::RenderScene,
        Self::Ping,
        Self::Disconnect,
    ];

    /// Name used on the wire
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateObject => "create_object",
            Self::DeleteObject => "delete_object",
            Self::MoveObject => "move_object",
            Self::ScaleObject => "scale_object",
            Self::RotateObject => "rotate_object",
            Self::CreateMaterial => "create_material",
            Self::AssignMaterial => "assign_material",
            Self::SetMaterialProperty => "set_material_property",
            Self::GetSceneInfo => "get_scene_info",
            Self::GetMaterials => "get_materials",
            Self::GetObjectInfo => "get_object_info",
            Self::SetCameraPosition => "set_camera_position",
            Self::RenderScene => "render_scene",
            Self::Ping => "ping",
            Self::Disconnect => "disconnect",
        }
    }

    /// Whether the command leaves the scene untouched
    pub const fn is_read_only(self) -> bool {
        matches!(
            self,
            Self::GetSceneInfo | Self::GetMaterials | Self::GetObjectInfo | Self::Ping | Self::Disconnect
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command name that is not part of [`CommandKind`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for CommandKind {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// A single request to the Blender-side executor
///
/// Serialized as `{"command": <name>, "params": {...}}`. The key `"type"` is
/// accepted in place of `"command"` for peers that predate the rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "command", alias = "type")]
    name: String,
    #[serde(default)]
    params: Map<String, Value>,
}

impl Command {
    /// Create a command from a raw wire name
    pub fn new(name: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Create a command for a known kind
    pub fn from_kind(kind: CommandKind, params: Map<String, Value>) -> Self {
        Self::new(kind.as_str(), params)
    }

    /// Raw command name as received
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command parameters
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Resolve the command name against the closed set of known commands
    pub fn kind(&self) -> Result<CommandKind, UnknownCommand> {
        self.name.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in CommandKind::ALL {
            assert_eq!(kind.as_str().parse::<CommandKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_command() {
        let err = "explode_scene".parse::<CommandKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: explode_scene");
    }

    #[test]
    fn test_serializes_with_command_key() {
        let mut params = Map::new();
        params.insert("object_name".into(), json!("Cube"));
        let command = Command::from_kind(CommandKind::DeleteObject, params);

        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(
            value,
            json!({"command": "delete_object", "params": {"object_name": "Cube"}})
        );
    }

    #[test]
    fn test_accepts_legacy_type_key() {
        let command: Command =
            serde_json::from_value(json!({"type": "get_scene_info"})).unwrap();
        assert_eq!(command.kind(), Ok(CommandKind::GetSceneInfo));
        assert!(command.params().is_empty());
    }

    #[test]
    fn test_read_only_kinds() {
        assert!(CommandKind::GetObjectInfo.is_read_only());
        assert!(!CommandKind::MoveObject.is_read_only());
    }
}
