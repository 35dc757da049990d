//! Tool registry
//!
//! Tool modules append themselves at startup; the server drains the registry
//! once when it is built. There is no registration after that point.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::tool::McpTool;

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn McpTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tool; registration order is the listing order
    pub fn register<T: McpTool + 'static>(&mut self, tool: T) -> &mut Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Consume the registry into the ordered tool list and a name index.
    ///
    /// When two tools share a name the later registration wins.
    pub fn into_tools(self) -> (Vec<Arc<dyn McpTool>>, HashMap<String, Arc<dyn McpTool>>) {
        let mut by_name = HashMap::with_capacity(self.tools.len());
        let mut ordered: Vec<Arc<dyn McpTool>> = Vec::with_capacity(self.tools.len());
        for tool in self.tools {
            if by_name
                .insert(tool.name().to_string(), Arc::clone(&tool))
                .is_some()
            {
                warn!(tool = tool.name(), "Tool registered twice, keeping the later one");
                ordered.retain(|t| t.name() != tool.name());
            }
            ordered.push(tool);
        }
        (ordered, by_name)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
