//! bmcp - drive Blender from the shell through the MCP bridge
//!
//! Every scene-editing subcommand is translated into the matching MCP tool
//! call and goes through the same validation as calls from an agent.

mod commands;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use clap::builder::FalseyValueParser;
use serde_json::{Map, Value};

use blender_mcp_client::config::{DEBUG_VAR, HOST_VAR, PORT_VAR, TIMEOUT_VAR, duration_from_secs};
use blender_mcp_client::{BridgeClient, BridgeConfig};
use blender_mcp_host::{HostConfig, HostServer, MemoryScene, SceneContext};
use blender_mcp_protocol::{CommandKind, DEFAULT_HOST, DEFAULT_PORT};
use blender_mcp_server::resources::SceneResource;
use blender_mcp_server::{BlenderMcpService, Dispatcher, ToolError, logging, prompts};

use crate::commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "bmcp")]
#[command(about = "Drive Blender through the MCP bridge", long_about = None)]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Host where Blender's bridge listens
    #[arg(long, global = true, env = HOST_VAR, default_value = DEFAULT_HOST)]
    host: String,

    /// Port where Blender's bridge listens
    #[arg(long, global = true, env = PORT_VAR, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seconds to wait for each call
    #[arg(long, global = true, env = TIMEOUT_VAR, default_value_t = 10.0)]
    timeout: f64,

    /// Enable debug logging
    #[arg(long, global = true, env = DEBUG_VAR, value_parser = FalseyValueParser::new())]
    debug: bool,
}

impl Cli {
    fn bridge_config(&self) -> Result<BridgeConfig> {
        let timeout = duration_from_secs(TIMEOUT_VAR, self.timeout)?;
        // Frame size has no flag; it still comes from the environment
        let config = BridgeConfig::from_env()
            .context("invalid bridge configuration")?
            .with_host(self.host.clone())
            .with_port(self.port)
            .with_timeout(timeout);
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    if let Commands::ServeMock { empty, exec_timeout } = cli.command {
        let exec_timeout = duration_from_secs("--exec-timeout", exec_timeout)?;
        return serve_mock(&cli.host, cli.port, empty, exec_timeout).await;
    }

    let service = BlenderMcpService::new(Dispatcher::new(BridgeClient::new(cli.bridge_config()?)));

    if let Some((tool, args)) = cli.command.tool_call() {
        return run_tool(service.dispatcher(), tool, &args).await;
    }

    match &cli.command {
        Commands::Objects => print_resource(&service, &SceneResource::Objects.uri()).await?,
        Commands::Materials => print_resource(&service, &SceneResource::Materials.uri()).await?,
        Commands::Object { name } => print_resource(&service, &SceneResource::Object(name.clone()).uri()).await?,
        Commands::Ping => {
            let started = tokio::time::Instant::now();
            service
                .dispatcher()
                .query(CommandKind::Ping, Map::new())
                .await
                .map_err(blender_error)?;
            println!(
                "Blender is answering at {} ({} ms)",
                service.dispatcher().bridge().config().address(),
                started.elapsed().as_millis()
            );
        }
        Commands::Prompt { name: None } => {
            for prompt in prompts::PROMPTS {
                println!("{:<20} {}", prompt.name, prompt.description);
            }
        }
        Commands::Prompt { name: Some(name) } => match prompts::find(name) {
            Some(prompt) => println!("{}", prompt.text),
            None => bail!("Unknown prompt '{name}'. Run `bmcp prompt` to list them."),
        },
        Commands::Tools => {
            for tool in service.dispatcher().tools() {
                println!("{} - {}", tool.name, tool.description);
                let schema = tool.arguments()?.input_schema();
                println!("{}\n", serde_json::to_string_pretty(schema)?);
            }
        }
        // Every other subcommand is a tool call, handled above
        _ => {}
    }

    Ok(())
}

async fn run_tool(dispatcher: &Dispatcher, tool: &str, args: &Map<String, Value>) -> Result<()> {
    let result = dispatcher.invoke(tool, args).await.map_err(blender_error)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn print_resource(service: &BlenderMcpService, uri: &str) -> Result<()> {
    let text = service
        .read(uri)
        .await
        .map_err(|err| anyhow::anyhow!("{}", err.message))?;
    println!("{text}");
    Ok(())
}

fn blender_error(err: ToolError) -> anyhow::Error {
    match err {
        ToolError::Execution { message } => anyhow::anyhow!("Blender error: {message}"),
        other => other.into(),
    }
}

async fn serve_mock(host: &str, port: u16, empty: bool, exec_timeout: Duration) -> Result<()> {
    let context = if empty {
        SceneContext::spawn(MemoryScene::empty)
    } else {
        SceneContext::spawn(MemoryScene::startup)
    }
    .context("failed to start the scene thread")?;

    let config = HostConfig::default()
        .with_host(host)
        .with_port(port)
        .with_exec_timeout(exec_timeout);
    let address = config.address();
    let server = HostServer::bind(config, context)
        .await
        .with_context(|| format!("failed to listen on {address}"))?;

    println!("Mock Blender listening on {}", server.local_addr()?);
    println!("Press Ctrl+C to stop.");

    server
        .serve_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
