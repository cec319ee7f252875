//! Tool registry
//!
//! An insertion-ordered map from tool name to [`ToolDescriptor`]. It is filled at
//! startup and read by every `tools/list` and `tools/call`. The map is an
//! immutable snapshot: writers build a new map and swap it in, readers only clone
//! the current snapshot pointer and never hold the lock while using it.

pub mod descriptor;
pub mod docstring;
pub mod invoker;
pub mod schema;

use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::mcp::types::Tool;

pub use descriptor::{
    RegistrationError, ToolCallable, ToolDescriptor, ToolError, ToolFn, ToolOptions, ToolOutput,
};
pub use schema::{DescribeType, ParamType, Primitive, TypeRef};

type ToolMap = IndexMap<String, Arc<ToolDescriptor>>;

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: RwLock<Arc<ToolMap>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a descriptor from `callable` and `options` and stores it.
    pub fn register(
        &self,
        callable: ToolCallable,
        options: ToolOptions,
    ) -> Result<(), RegistrationError> {
        let descriptor = ToolDescriptor::build(callable, options)?;
        self.insert(descriptor);
        Ok(())
    }

    /// Stores a descriptor. A descriptor with an existing name replaces the old one
    /// in place, leaving the position of every other tool untouched.
    pub fn insert(&self, descriptor: ToolDescriptor) {
        let name = descriptor.name.clone();
        let mut current = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = ToolMap::clone(&**current);
        let previous = next.insert(name.clone(), Arc::new(descriptor));
        *current = Arc::new(next);
        drop(current);

        debug!(tool = %name, replaced = previous.is_some(), "tool registered");
    }

    fn snapshot(&self) -> Arc<ToolMap> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*tools)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolDescriptor>> {
        self.snapshot().get(name).cloned()
    }

    /// Public tool shapes in registration order. Descriptors that fail validation
    /// are logged and left out.
    pub fn list(&self) -> Vec<Tool> {
        self.snapshot()
            .values()
            .filter_map(|descriptor| match descriptor.to_tool() {
                Ok(tool) => Some(tool),
                Err(err) => {
                    warn!(tool = %descriptor.name, error = %err, "skipping invalid tool");
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
