//! MiniC Language Server Protocol (LSP) server
//!
//! Provides real-time validation diagnostics, quick fixes and hover
//! information for MiniC source files in editors like VSCode, Neovim, and Zed.

use minic_config::ConfigLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = std::env::current_dir()
        .ok()
        .and_then(|dir| ConfigLoader::new().load_from_directory(&dir).ok())
        .map(|config| config.log_level())
        .unwrap_or_else(|| "warn".to_string());
    minic_lsp::init_logging(&level)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting minic-lsp");
    minic_lsp::run_stdio().await;
    Ok(())
}
