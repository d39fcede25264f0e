//! Scene tools

use blender_mcp_protocol::{CommandKind, MAX_RESOLUTION};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ToolSpec;

/// Image formats `render_scene` can write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RenderFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Tiff,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetSceneInfoRequest {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SetCameraPositionRequest {
    /// XYZ location for the camera
    pub location: [f64; 3],

    /// XYZ Euler rotation for the camera in radians
    pub rotation: [f64; 3],
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RenderSceneRequest {
    /// Path to write the rendered image to
    pub output_path: String,

    /// Output format: PNG, JPEG, BMP or TIFF
    #[serde(default)]
    pub format: RenderFormat,

    /// Width and height in pixels; defaults to the scene's render resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(inner(range(min = 1, max = MAX_RESOLUTION)))]
    pub resolution: Option<[u32; 2]>,
}

pub const GET_SCENE_INFO: ToolSpec = ToolSpec::new::<GetSceneInfoRequest>(
    "get_scene_info",
    "Get information about the current Blender scene: objects with their transforms and materials, the active object, and material names.",
    CommandKind::GetSceneInfo,
);

pub const SET_CAMERA_POSITION: ToolSpec = ToolSpec::new::<SetCameraPositionRequest>(
    "set_camera_position",
    "Set the scene camera's position and rotation.",
    CommandKind::SetCameraPosition,
);

pub const RENDER_SCENE: ToolSpec = ToolSpec::new::<RenderSceneRequest>(
    "render_scene",
    "Render the current scene to an image file.",
    CommandKind::RenderScene,
)
.upper_case(&["format"]);
