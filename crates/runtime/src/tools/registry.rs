//! The static tool registry built once at startup.

use std::collections::HashSet;

use tracing::warn;

use super::ToolDescriptor;

/// Ordered, name-unique collection of tool descriptors.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Build a registry, keeping advertised order.
    ///
    /// A repeated name keeps its first descriptor.
    pub fn from_tools(tools: impl IntoIterator<Item = ToolDescriptor>) -> Self {
        let mut seen = HashSet::new();
        let tools = tools
            .into_iter()
            .filter(|tool| {
                let fresh = seen.insert(tool.name.clone());
                if !fresh {
                    warn!(tool = %tool.name, "duplicate tool name ignored");
                }
                fresh
            })
            .collect();
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl<'a> IntoIterator for &'a ToolRegistry {
    type Item = &'a ToolDescriptor;
    type IntoIter = std::slice::Iter<'a, ToolDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}
