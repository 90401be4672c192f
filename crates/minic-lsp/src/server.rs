//! MiniC LSP Server implementation

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::{Error as RpcError, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use minic_config::{Config, ConfigLoader};
use minic_core::AnalysisOptions;

use crate::commands::{DeferredCommand, COMMANDS};
use crate::document::DocumentState;
use crate::quickfix::{Cancellation, CodeActionRequest, QuickFixEngine, QuickFixOptions};

/// MiniC Language Server
pub struct MinicLspServer {
    client: Client,
    documents: Arc<Mutex<HashMap<Url, DocumentState>>>,
    config: Arc<RwLock<Config>>,
    engine: Arc<RwLock<QuickFixEngine>>,
}

impl MinicLspServer {
    /// Create a server configured from the working directory
    pub fn new(client: Client) -> Self {
        let config = std::env::current_dir()
            .ok()
            .map(|dir| load_config(&dir))
            .unwrap_or_default();
        Self::with_config(client, config)
    }

    pub fn with_config(client: Client, config: Config) -> Self {
        let engine = QuickFixEngine::standard(quickfix_options(&config));
        Self {
            client,
            documents: Arc::new(Mutex::new(HashMap::new())),
            config: Arc::new(RwLock::new(config)),
            engine: Arc::new(RwLock::new(engine)),
        }
    }

    async fn analysis_options(&self) -> AnalysisOptions {
        let config = self.config.read().await;
        AnalysisOptions {
            enrich: config.enrich(),
            unused_variables: config.unused_variable_warnings(),
        }
    }

    async fn publish(&self, doc: &DocumentState) {
        let diagnostics = {
            let config = self.config.read().await;
            doc.lsp_diagnostics(config.source(), config.max_problems())
        };
        self.client
            .publish_diagnostics(doc.uri.clone(), diagnostics, Some(doc.version))
            .await;
    }
}

fn load_config(dir: &std::path::Path) -> Config {
    match ConfigLoader::new().load_from_directory(dir) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, dir = %dir.display(), "using default configuration");
            Config::default()
        }
    }
}

fn quickfix_options(config: &Config) -> QuickFixOptions {
    QuickFixOptions {
        generic_fallback: config.generic_fallback(),
        extract_actions: config.extract_actions(),
    }
}

fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri)
        .or(params.root_uri.as_ref())
        .and_then(|uri| uri.to_file_path().ok())
}

#[tower_lsp::async_trait]
impl LanguageServer for MinicLspServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(root) = workspace_root(&params).filter(|root| root.is_dir()) {
            let config = load_config(&root);
            *self.engine.write().await = QuickFixEngine::standard(quickfix_options(&config));
            *self.config.write().await = config;
            tracing::info!(root = %root.display(), "workspace configuration loaded");
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                code_action_provider: Some(CodeActionProviderCapability::Options(
                    CodeActionOptions {
                        code_action_kinds: Some(vec![
                            CodeActionKind::QUICKFIX,
                            CodeActionKind::REFACTOR_EXTRACT,
                        ]),
                        work_done_progress_options: WorkDoneProgressOptions::default(),
                        resolve_provider: Some(false),
                    },
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: COMMANDS.iter().map(|name| name.to_string()).collect(),
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "minic-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "MiniC LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let options = self.analysis_options().await;
        let doc = DocumentState::new(
            uri.clone(),
            params.text_document.text,
            params.text_document.version,
            options,
        );

        self.publish(&doc).await;

        let mut documents = self.documents.lock().await;
        documents.insert(uri, doc);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        let mut documents = self.documents.lock().await;
        if let Some(doc) = documents.get_mut(&uri) {
            // Full sync: the last change holds the whole text
            if let Some(change) = params.content_changes.into_iter().last() {
                doc.update(change.text, version);
            }
            self.publish(doc).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;

        let mut documents = self.documents.lock().await;
        documents.remove(&uri);

        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let documents = self.documents.lock().await;
        Ok(documents.get(&uri).and_then(|doc| {
            crate::hover::generate_hover(
                &doc.text,
                position,
                &doc.analysis.program,
                &doc.analysis.symbols,
            )
        }))
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let text = {
            let documents = self.documents.lock().await;
            let Some(doc) = documents.get(&uri) else {
                return Ok(None);
            };
            doc.text.clone()
        };

        // tower-lsp drops this future on $/cancelRequest
        let cancel = Cancellation::new();
        let _abort = cancel.cancel_on_drop();

        let engine = Arc::clone(&self.engine);
        let range = params.range;
        let diagnostics = params.context.diagnostics;
        let actions = tokio::task::spawn_blocking(move || {
            let engine = engine.blocking_read();
            engine.code_actions(
                &CodeActionRequest {
                    uri: &uri,
                    range,
                    diagnostics: &diagnostics,
                    text: &text,
                },
                &cancel,
            )
        })
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "code action worker failed");
            RpcError::internal_error()
        })?;

        Ok((!actions.is_empty()).then_some(actions))
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        let command = DeferredCommand::parse(&params.command, &params.arguments)
            .map_err(|err| RpcError::invalid_params(err.to_string()))?;

        let edits = {
            let documents = self.documents.lock().await;
            let Some(doc) = documents.get(command.uri()) else {
                return Err(RpcError::invalid_params(format!(
                    "document '{}' is not open",
                    command.uri()
                )));
            };
            command
                .execute(&doc.text)
                .map_err(|err| RpcError::invalid_params(err.to_string()))?
        };

        if edits.is_empty() {
            return Ok(None);
        }

        let mut changes = HashMap::new();
        changes.insert(command.uri().clone(), edits);
        let edit = WorkspaceEdit {
            changes: Some(changes),
            document_changes: None,
            change_annotations: None,
        };

        match self.client.apply_edit(edit).await {
            Ok(response) if !response.applied => {
                tracing::warn!(
                    command = command.name(),
                    reason = response.failure_reason.as_deref().unwrap_or("unknown"),
                    "client rejected edit"
                );
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(command = command.name(), error = %err, "applyEdit failed"),
        }
        Ok(None)
    }
}
