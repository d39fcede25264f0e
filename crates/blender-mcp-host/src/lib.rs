//! Blender MCP Host - executes bridge commands against a live scene
//!
//! The pieces, from the socket inwards:
//!
//! - [`HostServer`] accepts any number of connections and runs the
//!   per-connection loop: read a frame, execute, reply, repeat.
//! - [`SceneContext`] is the single thread that owns the scene. Connections
//!   submit work to it over a channel, so scene mutations are queued and never
//!   interleaved, just as Blender only tolerates one caller at a time.
//! - [`executor::execute`] maps a command onto the [`SceneHost`] API and turns
//!   every failure, including a panic, into an error response.
//! - [`MemoryScene`] implements [`SceneHost`] in-process so the executor can be
//!   run and tested without Blender.

pub mod config;
pub mod context;
pub mod executor;
pub mod memory;
pub mod render;
pub mod scene;
pub mod server;

pub use config::HostConfig;
pub use context::{ContextStopped, SceneContext};
pub use memory::MemoryScene;
pub use scene::{
    MaterialInfo, ObjectInfo, ObjectKind, Primitive, RenderInfo, RenderRequest, SceneError,
    SceneHost,
};
pub use server::HostServer;
