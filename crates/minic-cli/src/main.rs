use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use minic_core::diagnostic::formatter::ColorMode;

mod commands;

/// MiniC semantic validator and language server.
///
/// Checks MiniC programs for declaration, call, return and control-flow
/// mistakes and explains each problem in beginner-friendly terms.
///
/// EXAMPLES:
///     minic check main.c           Report problems in a file
///     minic check main.c --json    Output diagnostics as JSON
///     minic ast main.c             Print the linked AST as JSON
///     minic lsp                    Start the language server on stdio
///
/// ENVIRONMENT VARIABLES:
///     MINIC_JSON        Set to '1' for JSON output by default
///     MINIC_LOG         Log level for the language server
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "minic")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a MiniC source file
    ///
    /// Runs the front end and every validator, then prints the diagnostics.
    /// Exits with a failure status when any error is reported.
    ///
    /// EXAMPLES:
    ///     minic check main.c               Check for problems
    ///     minic check main.c --no-enrich   Short messages only
    #[command(visible_alias = "c")]
    Check {
        /// Path to the MiniC source file
        file: String,
        /// Output diagnostics in JSON format
        #[arg(long, env = "MINIC_JSON")]
        json: bool,
        /// Print the bare message without explanation and suggestion
        #[arg(long)]
        no_enrich: bool,
        /// When to color the output
        #[arg(long, value_enum, default_value_t = ColorArg::Auto)]
        color: ColorArg,
    },

    /// Dump the AST as JSON
    ///
    /// Parses and links the source file and prints the syntax tree with
    /// resolved name references, for tooling or debugging.
    ///
    /// EXAMPLES:
    ///     minic ast main.c              Print AST
    ///     minic ast main.c > ast.json   Save to file
    Ast {
        /// Path to the MiniC source file
        file: String,
    },

    /// Start the MiniC Language Server
    ///
    /// Serves diagnostics, quick fixes and hover over stdio, or over TCP
    /// with --tcp.
    ///
    /// EXAMPLES:
    ///     minic lsp                    Start in stdio mode
    ///     minic lsp --tcp --port 9258  Start in TCP mode
    Lsp {
        /// Use TCP mode instead of stdio
        #[arg(long)]
        tcp: bool,
        /// Port for TCP mode
        #[arg(long, default_value_t = 9258)]
        port: u16,
        /// Bind address for TCP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Enable verbose logging
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorMode {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => ColorMode::Auto,
            ColorArg::Always => ColorMode::Always,
            ColorArg::Never => ColorMode::Never,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            file,
            json,
            no_enrich,
            color,
        } => {
            let args = commands::check::CheckArgs {
                file,
                json,
                enrich: !no_enrich,
                color: color.into(),
            };
            commands::check::run(&args)?;
        }
        Commands::Ast { file } => {
            commands::ast::run(&file)?;
        }
        Commands::Lsp {
            tcp,
            port,
            host,
            verbose,
        } => {
            let args = commands::lsp::LspArgs {
                tcp,
                port,
                host,
                verbose,
            };
            commands::lsp::run(args)?;
        }
    }

    Ok(())
}
