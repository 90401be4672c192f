//! LSP command - Language Server Protocol server
//!
//! Starts the MiniC LSP server in either stdio mode (default)
//! or TCP mode for editor integration.

use anyhow::Result;
use minic_config::ConfigLoader;
use minic_lsp::server::MinicLspServer;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_lsp::{LspService, Server};

/// Arguments for the LSP command
#[derive(Debug, Clone)]
pub struct LspArgs {
    /// Use TCP mode instead of stdio
    pub tcp: bool,
    pub port: u16,
    /// Bind address for TCP mode
    pub host: String,
    /// Log at debug level
    pub verbose: bool,
}

impl Default for LspArgs {
    fn default() -> Self {
        Self {
            tcp: false,
            port: 9258,
            host: "127.0.0.1".to_string(),
            verbose: false,
        }
    }
}

/// Run the LSP server
pub fn run(args: LspArgs) -> Result<()> {
    minic_lsp::init_logging(&log_level(&args))?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        if args.tcp {
            run_tcp_server(args).await
        } else {
            tracing::info!("starting MiniC LSP server (stdio mode)");
            minic_lsp::run_stdio().await;
            Ok(())
        }
    })
}

fn log_level(args: &LspArgs) -> String {
    if args.verbose {
        return "debug".to_string();
    }
    std::env::current_dir()
        .ok()
        .and_then(|dir| ConfigLoader::new().load_from_directory(&dir).ok())
        .map(|config| config.log_level())
        .unwrap_or_else(|| "warn".to_string())
}

fn bind_address(args: &LspArgs) -> Result<SocketAddr> {
    Ok(format!("{}:{}", args.host, args.port).parse()?)
}

/// Run LSP server in TCP mode, one server per connection
async fn run_tcp_server(args: LspArgs) -> Result<()> {
    let addr = bind_address(&args)?;
    let listener = TcpListener::bind(addr).await?;

    eprintln!("MiniC LSP server listening on {}", listener.local_addr()?);
    eprintln!("Press Ctrl+C to stop.");

    loop {
        let (stream, client_addr) = listener.accept().await?;
        tracing::info!(client = %client_addr, "client connected");

        let (read, write) = tokio::io::split(stream);
        let (service, socket) = LspService::new(MinicLspServer::new);

        tokio::spawn(async move {
            Server::new(read, write, socket).serve(service).await;
            tracing::info!(client = %client_addr, "client disconnected");
        });
    }
}
