//! Blender MCP Server - Model Context Protocol front end for Blender
//!
//! This crate exposes a running Blender instance to AI agents. Agents can:
//!
//! - Create, delete, move, scale and rotate objects
//! - Create materials, tune their shader inputs, and assign them
//! - Inspect the scene, position the camera, and render
//!
//! ## Layers
//!
//! 1. [`BlenderMcpService`] speaks MCP (tools, resources, prompts)
//! 2. [`Dispatcher`] validates arguments against [`tools::CATALOGUE`]
//! 3. [`BridgeClient`](blender_mcp_client::BridgeClient) carries one command to
//!    Blender per connection and brings back the response
//!
//! Invalid calls are rejected at step 2 and never reach Blender.

pub mod dispatch;
pub mod logging;
pub mod prompts;
pub mod resources;
pub mod schema;
pub mod tools;

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam,
        GetPromptResult, Implementation, ListPromptsResult, ListResourcesResult, ListToolsResult,
        PaginatedRequestParam, Prompt, PromptMessage, PromptMessageRole, ProtocolVersion,
        RawResource, ReadResourceRequestParam, ReadResourceResult, ResourceContents,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
};
use serde_json::json;
use tracing::{debug, warn};

pub use crate::dispatch::{Dispatcher, ToolError};
use crate::resources::SceneResource;

// Re-export for binaries
pub use blender_mcp_client as client;
pub use rmcp;

/// The Blender MCP service
///
/// Holds only the dispatcher, which holds only bridge configuration, so the
/// service is cheap to clone and keeps no scene state of its own.
#[derive(Debug, Clone, Default)]
pub struct BlenderMcpService {
    dispatcher: Dispatcher,
}

impl BlenderMcpService {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// MCP tool descriptors for the whole catalogue
    ///
    /// A tool whose schema does not compile is left out and logged.
    pub fn tool_list(&self) -> Vec<Tool> {
        self.dispatcher
            .tools()
            .iter()
            .filter_map(|spec| match spec.arguments() {
                Ok(schema) => Some(Tool::new(
                    spec.name,
                    spec.description,
                    Arc::new(schema.input_schema().clone()),
                )),
                Err(err) => {
                    warn!("{err}");
                    None
                }
            })
            .collect()
    }

    /// Run a tool and shape the outcome for MCP
    ///
    /// Unknown tools and bad arguments are protocol errors (`invalid_params`).
    /// Failures on Blender's side, including an unreachable Blender, are tool
    /// results flagged as errors so the agent can read and react to them.
    pub async fn run_tool(
        &self,
        name: &str,
        arguments: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<CallToolResult, McpError> {
        match self.dispatcher.invoke(name, arguments).await {
            Ok(value) => {
                let text = serde_json::to_string_pretty(&value).unwrap_or_default();
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(ToolError::UnknownTool(name)) => Err(McpError::invalid_params(
                format!("Unknown tool: {name}"),
                None,
            )),
            Err(ToolError::Validation(err)) => {
                let violations: Vec<_> = err
                    .violations
                    .iter()
                    .map(|v| json!({ "field": v.field, "message": v.message }))
                    .collect();
                Err(McpError::invalid_params(
                    err.to_string(),
                    Some(json!({ "violations": violations })),
                ))
            }
            Err(ToolError::Schema(err)) => Err(McpError::internal_error(err.to_string(), None)),
            Err(ToolError::Bridge(err)) => {
                warn!(tool = name, "bridge failure: {err}");
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Bridge {} error: {err}",
                    err.kind()
                ))]))
            }
            Err(ToolError::Execution { message }) => {
                debug!(tool = name, "Blender reported: {message}");
                Ok(CallToolResult::error(vec![Content::text(message)]))
            }
        }
    }

    /// Read a `blender://` resource
    pub async fn read(&self, uri: &str) -> Result<String, McpError> {
        let resource = SceneResource::parse(uri).ok_or_else(|| {
            McpError::resource_not_found(format!("Unknown resource: {uri}"), None)
        })?;

        resource.fetch(&self.dispatcher).await.map_err(|err| match err {
            ToolError::Execution { message } => {
                McpError::resource_not_found(message, Some(json!({ "uri": uri })))
            }
            other => McpError::internal_error(other.to_string(), Some(json!({ "uri": uri }))),
        })
    }
}

impl ServerHandler for BlenderMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_prompts()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "blender-mcp".to_string(),
                title: Some("Blender MCP Bridge".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Blender MCP server: edit and inspect a running Blender scene. \
                 \n\nWorkflow:\n\
                 1. get_scene_info() - See what is in the scene\n\
                 2. create_object(), create_material(), assign_material() - Build it up\n\
                 3. move_object(), scale_object(), rotate_object() - Arrange it\n\
                 4. set_camera_position(), render_scene() - Look at the result\n\n\
                 Object names are unique: a taken name gets a .001 suffix, so use the \
                 name each call returns.\n\n\
                 Resources: blender://scene/objects, blender://scene/materials, and \
                 blender://object/{name} for a single object."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_list()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        self.run_tool(&request.name, &arguments).await
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = SceneResource::LISTED
            .iter()
            .map(|resource| {
                let mut raw = RawResource::new(resource.uri(), resource.name().to_string());
                raw.description = Some(resource.description().to_string());
                raw.mime_type = Some("application/json".to_string());
                raw.no_annotation()
            })
            .collect();
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let text = self.read(&request.uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        let prompts = prompts::PROMPTS
            .iter()
            .map(|p| Prompt::new(p.name, Some(p.description), None))
            .collect();
        Ok(ListPromptsResult::with_all_items(prompts))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let prompt = prompts::find(&request.name).ok_or_else(|| {
            McpError::invalid_params(format!("Unknown prompt: {}", request.name), None)
        })?;
        Ok(GetPromptResult {
            description: Some(prompt.description.to_string()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, prompt.text)],
        })
    }
}
