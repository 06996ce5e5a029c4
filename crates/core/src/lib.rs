// Request-Processing Core
//
// Transport-agnostic pieces of the agent request workflow:
// request/outcome types, the TOOL_CALL directive grammar, the tool registry
// with its built-in capabilities, and the single-pass reasoning loop.
//
// Key design decisions:
// - The language model is reached only through the CompletionClient trait;
//   provider implementations live in separate crates (promptrun-openai)
// - Tools form a closed set (ToolName) bound to Capability implementations
// - Capabilities report their own failures as text, so only completion
//   failures can terminate a run

pub mod capabilities;
pub mod completion;
pub mod directive;
pub mod error;
pub mod reasoning;
pub mod request;
pub mod tools;

// In-memory implementations for testing
pub mod memory;

// Re-exports for convenience
pub use capabilities::{builtin_registry, ProviderEndpoints};
pub use completion::{CompletionClient, CompletionOptions};
pub use directive::{parse_directive, ToolInvocation, DIRECTIVE_TOKEN};
pub use error::{AgentError, Result};
pub use reasoning::{ReasoningLoop, NO_RESPONSE, REASONING_OPTIONS, SYNTHESIS_OPTIONS};
pub use request::{
    AgentOutcome, AgentRequest, AgentRequestEvent, OutcomeStatus, AGENT_REQUEST_EVENT,
};
pub use tools::{Capability, ToolName, ToolRegistry, ToolRegistryBuilder};
