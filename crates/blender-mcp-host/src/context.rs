//! The single scene thread
//!
//! Blender's scripting API may only be driven from one thread, and so may any
//! [`SceneHost`]. The host is built on, owned by, and only ever touched from a
//! dedicated thread; connections hand it commands over a channel and wait on
//! a oneshot for the response. Commands from different connections are queued
//! in arrival order and never interleave.

use std::io;
use std::thread;

use blender_mcp_protocol::{Command, Response};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::executor;
use crate::scene::SceneHost;

/// The scene thread is gone and can take no more commands
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("scene thread has stopped")]
pub struct ContextStopped;

/// Work sent to the scene thread
struct Job {
    command: Command,
    respond: oneshot::Sender<Response>,
}

/// Handle to the scene thread
///
/// This is Send + Sync and can be cloned into every connection task. The
/// thread exits once the last handle is dropped.
#[derive(Clone)]
pub struct SceneContext {
    sender: mpsc::UnboundedSender<Job>,
}

impl SceneContext {
    /// Spawn the scene thread
    ///
    /// The host is built by `factory` on the new thread, so it does not need
    /// to be `Send`.
    pub fn spawn<H, F>(factory: F) -> io::Result<Self>
    where
        H: SceneHost + 'static,
        F: FnOnce() -> H + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        thread::Builder::new()
            .name("scene".to_string())
            .spawn(move || {
                let mut host = factory();
                info!("scene thread started");

                while let Some(Job { command, respond }) = rx.blocking_recv() {
                    let response = executor::execute(&mut host, &command);
                    debug!(command = command.name(), status = ?response.status, "executed");
                    // The connection may have given up waiting; nothing to do then
                    let _ = respond.send(response);
                }

                info!("scene thread stopped");
            })?;

        Ok(Self { sender: tx })
    }

    /// Queue a command and wait for the scene thread to run it
    pub async fn submit(&self, command: Command) -> Result<Response, ContextStopped> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(Job {
                command,
                respond: tx,
            })
            .map_err(|_| ContextStopped)?;
        rx.await.map_err(|_| ContextStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScene;
    use blender_mcp_protocol::CommandKind;
    use serde_json::{Map, json};

    fn create(name: &str) -> Command {
        let mut params = Map::new();
        params.insert("name".into(), json!(name));
        Command::from_kind(CommandKind::CreateObject, params)
    }

    #[tokio::test]
    async fn test_commands_run_on_scene_thread() {
        let context = SceneContext::spawn(MemoryScene::empty).unwrap();
        let response = context.submit(create("Box")).await.unwrap();
        assert_eq!(response.result["name"], "Box");

        let info = context
            .submit(Command::from_kind(CommandKind::GetSceneInfo, Map::new()))
            .await
            .unwrap();
        assert_eq!(info.result["objects"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_are_serialized() {
        let context = SceneContext::spawn(MemoryScene::empty).unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let context = context.clone();
                tokio::spawn(async move { context.submit(create("Crate")).await })
            })
            .collect();

        let mut names = Vec::new();
        for task in tasks {
            let response = task.await.unwrap().unwrap();
            names.push(response.result["name"].as_str().unwrap().to_string());
        }
        names.sort();
        names.dedup();
        // Every creation saw the previous ones: sixteen distinct names
        assert_eq!(names.len(), 16);
    }
}
