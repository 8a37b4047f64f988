// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! vfxgraph CLI entrypoint.
//!
//! By default this serves MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp`
//! until interrupted. Use `--mcp` to serve over stdio instead (intended for tool
//! integrations). Logs always go to stderr.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vfxgraph::config::AdapterConfig;
use vfxgraph::mcp::GraphMcp;
use vfxgraph::store::WriteDurability;
use vfxgraph::tools::GraphTools;

const DEFAULT_MCP_HTTP_PORT: u16 = 27436;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<asset-root>] [--durable-writes] [--mcp-http-port <port>]\n  {program} [--root <dir>] [--durable-writes] [--mcp-http-port <port>]\n  {program} [<asset-root>] [--durable-writes] --mcp\n  {program} [--root <dir>] [--durable-writes] --mcp\n\nBy default MCP is served over streamable HTTP at `http://127.0.0.1:<port>/mcp`.\n--mcp-http-port selects the port (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}).\n--mcp serves over stdio instead.\n\nIf asset-root/--root is omitted, the current working directory is used.\n\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported).\n\nSet RUST_LOG to adjust log verbosity (default: info)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    root: Option<String>,
    mcp_http_port: Option<u16>,
    durable_writes: bool,
}

impl CliOptions {
    fn config(&self) -> AdapterConfig {
        let mut config = AdapterConfig::default();
        if let Some(root) = &self.root {
            config.root = PathBuf::from(root);
        }
        if self.durable_writes {
            config.durability = WriteDurability::Durable;
        }
        config
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> Result<(), ()> {
    match slot {
        Some(_) => Err(()),
        None => {
            *slot = Some(value);
            Ok(())
        }
    }
}

fn set_flag(flag: &mut bool) -> Result<(), ()> {
    if std::mem::replace(flag, true) {
        return Err(());
    }
    Ok(())
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => set_flag(&mut options.mcp)?,
            "--durable-writes" => set_flag(&mut options.durable_writes)?,
            "--root" => set_once(&mut options.root, args.next().ok_or(())?)?,
            "--mcp-http-port" => {
                let port = args.next().ok_or(())?.parse::<u16>().map_err(|_| ())?;
                set_once(&mut options.mcp_http_port, port)?;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => set_once(&mut options.root, arg)?,
        }
    }

    // Stdio mode has no HTTP listener to configure.
    if options.mcp && options.mcp_http_port.is_some() {
        return Err(());
    }

    Ok(options)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "vfxgraph".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_tracing();

        let config = options.config();
        let tools = GraphTools::from_config(&config);
        let kinds = tools.registry().validate_all()?;
        info!(root = %config.root.display(), kinds, "node catalog ready");
        let mcp = GraphMcp::new(tools);

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        if options.mcp {
            runtime.block_on(mcp.serve_stdio())?;
            return Ok(());
        }

        let mcp_http_port = options.mcp_http_port.unwrap_or(DEFAULT_MCP_HTTP_PORT);
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", mcp_http_port)).await?;
            info!(addr = %listener.local_addr()?, "serving MCP over streamable HTTP at /mcp");

            let config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let shutdown_token = config.cancellation_token.clone();

            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp_service =
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config);

            let router = Router::new().nest_service("/mcp", mcp_service);
            let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    error!(error = %err, "cannot listen for interrupt");
                }
                info!("shutting down");
                shutdown_token.cancel();
            });
            serve.await?;
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("vfxgraph: {err}");
        std::process::exit(1);
    }
}
