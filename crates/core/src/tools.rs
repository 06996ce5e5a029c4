// Tool Registry
//
// The tool set is closed: every tool the model may call is a ToolName variant.
// A ToolRegistry binds variants to Capability implementations, which share a
// single signature (string argument in, string out).
//
// Design decisions:
// - Unknown names in model output are not errors; they simply resolve to None
// - Capabilities never fail: provider outages are reported as text so the
//   model can still produce a (degraded) answer
// - Registration order is the ToolName order, so prompts are deterministic

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

use crate::directive::format_directive;

// ============================================================================
// ToolName - the closed set of dispatchable tools
// ============================================================================

/// Every tool the model may invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolName {
    SearchWeb,
    GetCurrentDate,
    GetTimeInCity,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [
        ToolName::SearchWeb,
        ToolName::GetCurrentDate,
        ToolName::GetTimeInCity,
    ];

    /// Identifier used in directives
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchWeb => "search_web",
            Self::GetCurrentDate => "get_current_date",
            Self::GetTimeInCity => "get_time_in_city",
        }
    }

    /// Look up a directive identifier; exact match only
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Argument shape shown to the model
    pub fn parameter(&self) -> &'static str {
        match self {
            Self::SearchWeb => "query",
            Self::GetCurrentDate => "",
            Self::GetTimeInCity => "city",
        }
    }

    fn example_argument(&self) -> Option<&'static str> {
        match self {
            Self::SearchWeb => Some("latest AI regulations"),
            Self::GetCurrentDate => None,
            Self::GetTimeInCity => Some("Nairobi"),
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Capability Trait
// ============================================================================

/// Implementation behind a tool.
///
/// `invoke` must not fail: any internal failure is returned as a
/// human-readable description instead.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Description shown to the model in the tool list
    fn description(&self) -> &str;

    async fn invoke(&self, argument: &str) -> String;
}

// ============================================================================
// ToolRegistry
// ============================================================================

/// Mapping from tool names to capabilities.
///
/// # Example
///
/// ```ignore
/// let registry = ToolRegistry::builder()
///     .tool(ToolName::GetCurrentDate, CurrentDateCapability)
///     .build();
///
/// let date = registry.invoke(ToolName::GetCurrentDate, "").await;
/// ```
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolName, Arc<dyn Capability>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Bind a capability to a tool name, replacing any previous binding
    pub fn register(&mut self, name: ToolName, capability: impl Capability + 'static) {
        self.tools.insert(name, Arc::new(capability));
    }

    /// Register an Arc-wrapped capability
    pub fn register_arc(&mut self, name: ToolName, capability: Arc<dyn Capability>) {
        self.tools.insert(name, capability);
    }

    pub fn get(&self, name: ToolName) -> Option<&Arc<dyn Capability>> {
        self.tools.get(&name)
    }

    /// Resolve a directive identifier to a registered tool
    pub fn resolve(&self, identifier: &str) -> Option<ToolName> {
        ToolName::parse(identifier).filter(|name| self.tools.contains_key(name))
    }

    pub fn names(&self) -> impl Iterator<Item = ToolName> + '_ {
        self.tools.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool. Returns `None` when the tool is not registered.
    pub async fn invoke(&self, name: ToolName, argument: &str) -> Option<String> {
        let capability = self.tools.get(&name)?;
        debug!(tool = %name, argument = %argument, "invoking tool");
        Some(capability.invoke(argument).await)
    }

    /// Tool list and invocation syntax for the system prompt
    pub fn describe(&self) -> String {
        let mut text = String::from("Available tools:\n");
        for (index, (name, capability)) in self.tools.iter().enumerate() {
            let _ = writeln!(
                text,
                "{}. {}({}) - {}",
                index + 1,
                name,
                name.parameter(),
                capability.description()
            );
        }

        text.push('\n');
        text.push_str("To use a tool, respond with: ");
        text.push_str(&format_directive("tool_name", "arguments"));
        for name in self.tools.keys() {
            if let Some(example) = name.example_argument() {
                text.push_str("\nExample: ");
                text.push_str(&format_directive(name.as_str(), &format!("\"{example}\"")));
            }
        }
        text
    }
}

// ============================================================================
// ToolRegistryBuilder
// ============================================================================

#[derive(Default)]
pub struct ToolRegistryBuilder {
    registry: ToolRegistry,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::new(),
        }
    }

    pub fn tool(mut self, name: ToolName, capability: impl Capability + 'static) -> Self {
        self.registry.register(name, capability);
        self
    }

    pub fn tool_arc(mut self, name: ToolName, capability: Arc<dyn Capability>) -> Self {
        self.registry.register_arc(name, capability);
        self
    }

    pub fn build(self) -> ToolRegistry {
        self.registry
    }
}
