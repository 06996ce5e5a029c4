// Reasoning Loop
//
// One bounded pass of reason → (optional) act → synthesize:
//
//   1. Ask the model, with the tool list in the system block
//   2. Look for the first TOOL_CALL directive in its answer
//   3. No directive, or an unregistered tool → the answer is final
//   4. Otherwise run the tool and ask the model again with its result
//
// Completion failures propagate unchanged; tool failures never happen (tools
// answer with text). There is no retry here.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::completion::{CompletionClient, CompletionOptions};
use crate::directive::parse_directive;
use crate::error::Result;
use crate::request::AgentRequest;
use crate::tools::{ToolName, ToolRegistry};

/// Options for the first (tool-deciding) completion call
pub const REASONING_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.2,
    max_tokens: 800,
};

/// Options for the synthesis call that follows a tool invocation
pub const SYNTHESIS_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.2,
    max_tokens: 1000,
};

/// Final text when the first completion produced no choices
pub const NO_RESPONSE: &str = "No response produced.";

const PERSONA: &str = "You are an AI research analyst with access to tools.";
const GUIDANCE: &str = "If you need current information or data, use the appropriate tool. Otherwise, answer directly based on your knowledge.";
const SYNTHESIS_INSTRUCTION: &str = "Provide a comprehensive answer using this information:";

/// Drives the completion client and tool registry for one request
#[derive(Clone)]
pub struct ReasoningLoop {
    client: Arc<dyn CompletionClient>,
    tools: ToolRegistry,
    default_backend_url: String,
    reasoning_options: CompletionOptions,
    synthesis_options: CompletionOptions,
}

impl ReasoningLoop {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        tools: ToolRegistry,
        default_backend_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tools,
            default_backend_url: default_backend_url.into(),
            reasoning_options: REASONING_OPTIONS,
            synthesis_options: SYNTHESIS_OPTIONS,
        }
    }

    /// Override sampling options for both calls
    pub fn with_options(mut self, reasoning: CompletionOptions, synthesis: CompletionOptions) -> Self {
        self.reasoning_options = reasoning;
        self.synthesis_options = synthesis;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn default_backend_url(&self) -> &str {
        &self.default_backend_url
    }

    /// Persona, tool list and invocation syntax
    pub fn system_prompt(&self) -> String {
        format!("{PERSONA} {}\n\n{GUIDANCE}", self.tools.describe())
    }

    /// Prompt for the first completion call
    pub fn initial_prompt(&self, request: &AgentRequest) -> String {
        let user_message = match request.context.as_deref() {
            Some(context) => format!("{context}\n\nUser request: {}", request.prompt),
            None => request.prompt.clone(),
        };
        format!("{}\n\n{user_message}", self.system_prompt())
    }

    /// Prompt for the synthesis call after a tool ran
    pub fn synthesis_prompt(&self, request: &AgentRequest, tool: ToolName, tool_result: &str) -> String {
        format!(
            "{}\n\nUser request: {}\n\nTool used: {tool}\nTool result:\n{tool_result}\n\n{SYNTHESIS_INSTRUCTION}",
            self.system_prompt(),
            request.prompt,
        )
    }

    /// Produce the final answer for `request`
    #[instrument(skip(self, request), fields(request_id = %request.request_id))]
    pub async fn run(&self, request: &AgentRequest) -> Result<String> {
        let backend_url = request.backend_url(&self.default_backend_url);
        info!(backend = %backend_url, "reasoning started");

        let first = self
            .client
            .complete(backend_url, &self.initial_prompt(request), &self.reasoning_options)
            .await?
            .unwrap_or_else(|| NO_RESPONSE.to_string());

        let Some(invocation) = parse_directive(&first) else {
            debug!("no tool directive, answering directly");
            return Ok(first);
        };

        let Some(tool) = self.tools.resolve(&invocation.name) else {
            debug!(tool = %invocation.name, "directive names an unknown tool, answering directly");
            return Ok(first);
        };

        let tool_result = self
            .tools
            .invoke(tool, invocation.argument())
            .await
            .unwrap_or_default();
        info!(tool = %tool, "tool invoked, synthesizing answer");

        let synthesized = self
            .client
            .complete(
                backend_url,
                &self.synthesis_prompt(request, tool, &tool_result),
                &self.synthesis_options,
            )
            .await?;

        // No choices on the synthesis call keeps the first answer
        Ok(synthesized.unwrap_or(first))
    }
}
