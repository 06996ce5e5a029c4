// Tool directive grammar
//
// Model output requests a tool with a single line of the form
//
//     TOOL_CALL: <identifier>(<argument>)
//
// The argument runs up to the first closing parenthesis. Only the first
// directive in a response is honored; text without a directive means
// "no tool".

use std::sync::LazyLock;

use regex::Regex;

/// Token that introduces a directive in model output
pub const DIRECTIVE_TOKEN: &str = "TOOL_CALL";

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"TOOL_CALL:\s*([A-Za-z0-9_]+)\(([^)]*)\)").expect("directive pattern is valid")
});

/// A tool request parsed out of model output.
///
/// `name` is whatever identifier the model wrote; it may not be a registered
/// tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub name: String,
    pub raw_argument: String,
}

impl ToolInvocation {
    /// Argument with surrounding whitespace and quote characters removed
    pub fn argument(&self) -> &str {
        self.raw_argument
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
    }
}

/// Find the first directive in `text`
pub fn parse_directive(text: &str) -> Option<ToolInvocation> {
    let captures = DIRECTIVE.captures(text)?;
    Some(ToolInvocation {
        name: captures.get(1)?.as_str().to_string(),
        raw_argument: captures.get(2)?.as_str().to_string(),
    })
}

/// Render a directive the way the model is asked to write one
pub fn format_directive(name: &str, argument: &str) -> String {
    format!("{DIRECTIVE_TOKEN}: {name}({argument})")
}
