use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

// =============================================================================
// ToolDefinition
// =============================================================================

#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

// =============================================================================
// Tool Trait
// =============================================================================

#[async_trait]
pub trait Tool: Send + Sync {
    const NAME: &'static str;
    type Error: std::error::Error + Send + Sync + 'static;
    type Args: DeserializeOwned + Send;
    type Output: Serialize;

    async fn definition(&self) -> ToolDefinition;
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;
}

// =============================================================================
// DynTool Trait (object-safe)
// =============================================================================

#[async_trait]
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;
    async fn definition(&self) -> ToolDefinition;
    async fn call_json(&self, args: serde_json::Value) -> Result<serde_json::Value, DynToolError>;
}

#[derive(Debug)]
pub struct DynToolError(pub String);

impl fmt::Display for DynToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DynToolError {}

// =============================================================================
// ToolWrapper
// =============================================================================

pub struct ToolWrapper<T>(pub T);

#[async_trait]
impl<T: Tool> DynTool for ToolWrapper<T> {
    fn name(&self) -> &str {
        T::NAME
    }

    async fn definition(&self) -> ToolDefinition {
        self.0.definition().await
    }

    async fn call_json(&self, args: serde_json::Value) -> Result<serde_json::Value, DynToolError> {
        let args: T::Args =
            serde_json::from_value(args).map_err(|e| DynToolError(format!("Invalid arguments: {}", e)))?;

        let output = self
            .0
            .call(args)
            .await
            .map_err(|e| DynToolError(e.to_string()))?;

        serde_json::to_value(output).map_err(|e| DynToolError(format!("Failed to serialize output: {}", e)))
    }
}
