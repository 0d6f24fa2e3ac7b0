//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes document validation, plain-text projection and length checks over
//! stdio so editors and agents can vet a document before saving it. Every tool
//! takes the document as JSON text and delegates to `rich_doc_core`; the server
//! itself only applies the configured defaults and the input size limit.

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;
use serde_json::Value;

use rich_doc_core::schema::{DOCUMENT, SchemaOverrides, ValidationReport};
use rich_doc_core::{
    Config, CountUnit, Document, DocumentError, LengthPolicy, SchemaOptions, check_value,
    parse_json, to_plain_text,
};

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `validate_document` and `plain_text` tools.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct DocumentParams {
    /// The document as JSON text: an array of nodes.
    pub document: String,
    /// Validator overrides.
    #[serde(flatten)]
    pub schema: SchemaOverrides,
}

/// Parameters for the `count_characters` and `check_document` tools.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct LengthParams {
    /// The document as JSON text: an array of nodes.
    pub document: String,
    /// Maximum length. Defaults to the configured limit.
    pub max_length: Option<usize>,
    /// Unit to count in: "utf16", "chars" or "bytes".
    pub unit: Option<CountUnit>,
    /// Validator overrides.
    #[serde(flatten)]
    pub schema: SchemaOverrides,
}

#[derive(Serialize)]
struct PlainTextOutput {
    text: String,
}

/// MCP server exposing rich-doc functionality.
#[derive(Clone)]
pub struct ProjectServer {
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
    options: SchemaOptions,
    policy: LengthPolicy,
    max_input_bytes: Option<usize>,
}

impl Default for ProjectServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl ProjectServer {
    /// Create a server with default configuration.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create a server whose defaults come from `config`.
    pub fn with_config(config: &Config) -> Self {
        Self {
            tool_router: Self::tool_router(),
            options: config.schema_options(),
            policy: config.length_policy(),
            max_input_bytes: config.input_limit(),
        }
    }

    /// Get project information.
    #[tool(description = "Get project name, version, and description")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
        });

        let text = if params.format == "json" {
            to_json(&info)?
        } else {
            format!(
                "{} v{}\n{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Validate a document against the schema.
    #[tool(
        description = "Validate a rich-text document (JSON array of nodes). Returns whether it is valid and every issue with its JSON-pointer path."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn validate_document(
        &self,
        Parameters(params): Parameters<DocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "validate_document", bytes = params.document.len(), "executing MCP tool");

        let value = self.parse_input(&params.document)?;
        let options = self.options.with_overrides(&params.schema);
        let report = rich_doc_core::validate(&value, &options);

        tracing::info!(
            tool = "validate_document",
            valid = report.valid,
            issues = report.issues.len(),
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(to_json(&report)?)]))
    }

    /// Render a document as plain text.
    #[tool(
        description = "Render a rich-text document as plain text: formatting dropped, list items and top-level blocks separated by newlines."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn plain_text(
        &self,
        Parameters(params): Parameters<DocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "plain_text", bytes = params.document.len(), "executing MCP tool");

        let value = self.parse_input(&params.document)?;
        let doc = decode(&value, &self.options.with_overrides(&params.schema))?;
        let output = PlainTextOutput {
            text: to_plain_text(&doc),
        };

        tracing::info!(tool = "plain_text", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(to_json(&output)?)]))
    }

    /// Count the characters in a document.
    #[tool(
        description = "Count the characters in a rich-text document's plain text and compare with a maximum length (default 10000 UTF-16 code units)."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn count_characters(
        &self,
        Parameters(params): Parameters<LengthParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "count_characters", max_length = ?params.max_length, "executing MCP tool");

        let value = self.parse_input(&params.document)?;
        let doc = decode(&value, &self.options.with_overrides(&params.schema))?;
        let report = self.policy_for(&params).check(&doc);

        tracing::info!(
            tool = "count_characters",
            count = report.count,
            within_limit = report.within_limit,
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(to_json(&report)?)]))
    }

    /// Validate a document and check its length in one step.
    #[tool(
        description = "Validate a rich-text document and, if valid, check its length. Returns a single pass/fail verdict with details."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn check_document(
        &self,
        Parameters(params): Parameters<LengthParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "check_document", "executing MCP tool");

        let value = self.parse_input(&params.document)?;
        let options = self.options.with_overrides(&params.schema);
        let report = check_value(&value, &options, &self.policy_for(&params));

        tracing::info!(tool = "check_document", pass = report.pass, "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(to_json(&report)?)]))
    }
}

impl ProjectServer {
    fn parse_input(&self, input: &str) -> Result<Value, McpError> {
        if let Some(max) = self.max_input_bytes
            && input.len() > max
        {
            return Err(McpError::invalid_params(
                format!("input too large: {} bytes (limit: {max} bytes)", input.len()),
                None,
            ));
        }
        parse_json(input).map_err(|e| {
            let message = match e {
                DocumentError::TooDeep { .. } => format!("document rejected: {e}"),
                _ => format!("document is not valid JSON: {e}"),
            };
            McpError::invalid_params(message, None)
        })
    }

    fn policy_for(&self, params: &LengthParams) -> LengthPolicy {
        LengthPolicy {
            max_length: params.max_length.unwrap_or(self.policy.max_length),
            unit: params.unit.unwrap_or(self.policy.unit),
        }
    }
}

fn decode(value: &Value, options: &SchemaOptions) -> Result<Document, McpError> {
    DOCUMENT.parse(value, options).map_err(|err| {
        let data = serde_json::to_value(ValidationReport::from(&err)).ok();
        McpError::invalid_params(err.to_string(), data)
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))
}

#[tool_handler]
impl ServerHandler for ProjectServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Validate rich-text documents, render them as plain text and check their length.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}
