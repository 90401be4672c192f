//! MiniC Language Server Protocol (LSP) library
//!
//! Publishes validation diagnostics and offers quick fixes, deferred repair
//! commands and hover information for MiniC source files.

pub mod commands;
pub mod convert;
pub mod document;
pub mod hover;
pub mod quickfix;
pub mod server;
pub mod text;

pub use quickfix::{
    CancelOnDrop, Cancellation, CodeActionRequest, QuickFixEngine, QuickFixOptions,
};
pub use server::MinicLspServer;

/// Serve LSP over stdin/stdout until the client disconnects
pub async fn run_stdio() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = tower_lsp::LspService::new(MinicLspServer::new);
    tower_lsp::Server::new(stdin, stdout, socket)
        .serve(service)
        .await;
}

/// Log to stderr; stdout carries the protocol.
///
/// `MINIC_LOG` wins over the configured level.
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = std::env::var("MINIC_LOG").unwrap_or_else(|_| level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(filter)?)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize logging: {}", err))
}
