//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition advertised by a tool provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within its provider
    pub name: String,
    /// Description of what the tool does (for model consumption)
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Create a new tool descriptor accepting an empty object
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Tool call requested by a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier for this tool call (backend-assigned or synthesized)
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Input arguments for the tool
    pub input: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Get an input argument as a string
    pub fn get_arg_str(&self, key: &str) -> Option<&str> {
        self.input.get(key).and_then(|v| v.as_str())
    }
}

/// Output of one successful tool execution
///
/// Consumed immediately to build the next model request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    #[serde(rename = "toolName")]
    pub tool_name: String,
    #[serde(rename = "rawOutput")]
    pub raw_output: String,
}

impl ToolInvocationResult {
    pub fn new(tool_name: impl Into<String>, raw_output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            raw_output: raw_output.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_descriptor_creation() {
        let tool = ToolDescriptor::new("get_weather", "Get the current weather")
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "location": { "type": "string" }
                },
                "required": ["location"]
            }));

        assert_eq!(tool.name, "get_weather");
        assert_eq!(tool.input_schema["required"][0], "location");

        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("\"inputSchema\""));
    }

    #[test]
    fn test_tool_call_args() {
        let call = ToolCall::new("call_123", "echo", json!({ "message": "hi" }));

        assert_eq!(call.get_arg_str("message"), Some("hi"));
        assert_eq!(call.get_arg_str("nonexistent"), None);
    }
}
