//! Tool handler plumbing shared by every tool definition.
//!
//! A tool implements [`GlassnodeTool`]: typed parameters, a typed output and
//! an async `run`. Everything else (argument decoding and validation, result
//! shaping, rmcp routes, registry dispatch) is generic and lives here, so
//! both transports go through the exact same path.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Content, Tool, ToolAnnotations},
};
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::error::ToolError;
use crate::domains::glassnode::GlassnodeClient;

/// Parameter validation and normalization, run before any network call.
pub trait Validate: Sized {
    /// Check the parameters and return them in normalized form.
    fn validate(self) -> Result<Self, ToolError>;
}

/// A Glassnode-backed MCP tool.
pub trait GlassnodeTool: Send + Sync + 'static {
    /// Tool name as registered in MCP.
    const NAME: &'static str;

    /// Tool description shown to clients.
    const DESCRIPTION: &'static str;

    type Params: DeserializeOwned + JsonSchema + Validate + Send + 'static;
    type Output: Serialize + JsonSchema + Send + 'static;

    /// Run the tool against already validated parameters.
    fn run(
        client: Arc<GlassnodeClient>,
        params: Self::Params,
    ) -> BoxFuture<'static, Result<Self::Output, ToolError>>;

    /// One-line human readable summary of a successful run.
    fn summarize(output: &Self::Output) -> String;

    /// Whether a successful run should still be flagged as an error result.
    fn is_failure(_output: &Self::Output) -> bool {
        false
    }
}

/// Build the MCP tool model (name, description, schemas).
pub fn tool_model<T: GlassnodeTool>() -> Tool {
    Tool {
        name: T::NAME.into(),
        description: Some(T::DESCRIPTION.into()),
        input_schema: cached_schema_for_type::<T::Params>(),
        annotations: Some(ToolAnnotations {
            title: None,
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint: Some(true),
        }),
        output_schema: Some(cached_schema_for_type::<T::Output>()),
        icons: None,
        meta: None,
        title: None,
    }
}

/// Decode and validate raw JSON arguments.
pub fn parse_params<T: GlassnodeTool>(arguments: Value) -> Result<T::Params, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        Value::Object(map) => Value::Object(map),
        _ => {
            return Err(ToolError::validation(
                "arguments",
                "expected a JSON object",
            ));
        }
    };

    let params: T::Params = serde_json::from_value(arguments).map_err(validation_from_serde)?;
    params.validate()
}

/// Map a serde decoding error to a validation error, recovering the field
/// name when serde reports one.
fn validation_from_serde(err: serde_json::Error) -> ToolError {
    let message = err.to_string();
    let field = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
        .unwrap_or("arguments")
        .to_string();
    ToolError::validation(field, message)
}

/// Run a tool and return its serialized payload.
///
/// Validation happens before the handler is invoked; failures of any kind
/// are returned as `ToolError`.
pub async fn dispatch<T: GlassnodeTool>(
    client: Arc<GlassnodeClient>,
    arguments: Value,
) -> Result<Value, ToolError> {
    let params = parse_params::<T>(arguments)?;
    info!("Dispatching tool: {}", T::NAME);
    let output = T::run(client, params).await?;
    serde_json::to_value(&output).map_err(|e| ToolError::internal(e.to_string()))
}

/// Run a tool for a transport.
///
/// Request errors (bad arguments) are returned as `Err`; execution errors
/// are folded into a `CallToolResult` with `is_error` set.
pub async fn call<T: GlassnodeTool>(
    client: Arc<GlassnodeClient>,
    arguments: Value,
) -> Result<CallToolResult, ToolError> {
    let params = parse_params::<T>(arguments)?;
    Ok(execute::<T>(client, params).await)
}

/// Execute a tool with validated parameters and shape the MCP result.
pub async fn execute<T: GlassnodeTool>(
    client: Arc<GlassnodeClient>,
    params: T::Params,
) -> CallToolResult {
    info!("Tool called: {}", T::NAME);
    match T::run(client, params).await {
        Ok(output) => {
            let summary = T::summarize(&output);
            let failed = T::is_failure(&output);
            match serde_json::to_value(&output) {
                Ok(payload) => structured_result(summary, payload, failed),
                Err(e) => error_result(&ToolError::internal(e.to_string())),
            }
        }
        Err(e) => {
            warn!("Tool {} failed: {}", T::NAME, e);
            error_result(&e)
        }
    }
}

/// Create a ToolRoute for STDIO/TCP transport.
pub fn create_route<T, S>(client: Arc<GlassnodeClient>) -> ToolRoute<S>
where
    T: GlassnodeTool,
    S: Send + Sync + 'static,
{
    ToolRoute::new_dyn(tool_model::<T>(), move |ctx: ToolCallContext<'_, S>| {
        let args = ctx.arguments.clone().unwrap_or_default();
        let client = client.clone();
        async move {
            call::<T>(client, Value::Object(args))
                .await
                .map_err(|e| McpError::invalid_params(e.to_string(), Some(e.to_json())))
        }
        .boxed()
    })
}

/// Successful result: summary text, the payload as JSON text, and the
/// payload as structured content.
pub fn structured_result(summary: String, payload: Value, is_error: bool) -> CallToolResult {
    let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
    CallToolResult {
        content: vec![Content::text(summary), Content::text(text)],
        structured_content: Some(payload),
        is_error: Some(is_error),
        meta: None,
    }
}

/// Error result carrying a structured `{ "error": ... }` body.
pub fn error_result(err: &ToolError) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(err.to_string())],
        structured_content: Some(json!({ "error": err.to_json() })),
        is_error: Some(true),
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::glassnode::mock::{MockHttpClient, test_client};
    use rmcp::model::RawContent;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoParams {
        word: String,
        #[serde(default)]
        times: u8,
    }

    impl Validate for EchoParams {
        fn validate(self) -> Result<Self, ToolError> {
            if self.word.is_empty() {
                return Err(ToolError::validation("word", "must not be empty"));
            }
            Ok(self)
        }
    }

    #[derive(Debug, Serialize, JsonSchema)]
    struct EchoOutput {
        echoed: String,
    }

    struct EchoTool;

    impl GlassnodeTool for EchoTool {
        const NAME: &'static str = "echo";
        const DESCRIPTION: &'static str = "Echo a word";
        type Params = EchoParams;
        type Output = EchoOutput;

        fn run(
            _client: Arc<GlassnodeClient>,
            params: Self::Params,
        ) -> BoxFuture<'static, Result<Self::Output, ToolError>> {
            async move {
                if params.word == "fail" {
                    return Err(ToolError::not_found("fail"));
                }
                Ok(EchoOutput {
                    echoed: params.word.repeat(params.times.max(1) as usize),
                })
            }
            .boxed()
        }

        fn summarize(output: &Self::Output) -> String {
            format!("Echoed {}", output.echoed)
        }
    }

    fn client() -> Arc<GlassnodeClient> {
        Arc::new(test_client(Arc::new(MockHttpClient::new())))
    }

    fn text(result: &CallToolResult, index: usize) -> String {
        match &result.content[index].raw {
            RawContent::Text(text) => text.text.clone(),
            _ => panic!("Expected text content"),
        }
    }

    #[test]
    fn test_tool_model_has_schemas() {
        let tool = tool_model::<EchoTool>();
        assert_eq!(tool.name, "echo");
        assert!(tool.output_schema.is_some());
        assert!(tool.input_schema.contains_key("properties"));
        let annotations = tool.annotations.unwrap();
        assert_eq!(annotations.read_only_hint, Some(true));
    }

    #[test]
    fn test_parse_params_missing_field() {
        match parse_params::<EchoTool>(json!({})) {
            Err(ToolError::Validation { field, .. }) => assert_eq!(field, "word"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_params_wrong_type() {
        let err = parse_params::<EchoTool>(json!({ "word": 5 })).unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }

    #[test]
    fn test_parse_params_out_of_range() {
        let err = parse_params::<EchoTool>(json!({ "word": "a", "times": 1000 })).unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }

    #[test]
    fn test_parse_params_runs_validate() {
        match parse_params::<EchoTool>(json!({ "word": "" })) {
            Err(ToolError::Validation { field, reason }) => {
                assert_eq!(field, "word");
                assert_eq!(reason, "must not be empty");
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_params_rejects_non_object() {
        let err = parse_params::<EchoTool>(json!(["word"])).unwrap_err();
        assert!(matches!(err, ToolError::Validation { ref field, .. } if field == "arguments"));
    }

    #[tokio::test]
    async fn test_dispatch_returns_payload() {
        let payload = dispatch::<EchoTool>(client(), json!({ "word": "ab", "times": 2 }))
            .await
            .unwrap();
        assert_eq!(payload, json!({ "echoed": "abab" }));
    }

    #[tokio::test]
    async fn test_call_success_result() {
        let result = call::<EchoTool>(client(), json!({ "word": "hi" })).await.unwrap();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(text(&result, 0), "Echoed hi");
        assert!(text(&result, 1).contains("\"echoed\": \"hi\""));
        assert_eq!(result.structured_content, Some(json!({ "echoed": "hi" })));
    }

    #[tokio::test]
    async fn test_call_execution_error_is_tool_result() {
        let result = call::<EchoTool>(client(), json!({ "word": "fail" })).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["error"]["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_call_request_error_is_err() {
        let err = call::<EchoTool>(client(), json!({})).await.unwrap_err();
        assert!(err.is_request_error());
    }
}
