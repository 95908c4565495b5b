//! Ordered, name-keyed collection of tools.

use std::collections::HashMap;
use std::sync::Arc;

use super::tool::Tool;
use super::types::ToolDefinition;

/// Name → tool mapping that remembers first-insertion order.
///
/// Inserting a tool whose name is already present replaces the stored tool but
/// keeps the name at its original position.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tool, returning the tool it displaced, if any.
    pub fn insert(&mut self, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        match self.index.get(tool.name()) {
            Some(&position) => Some(std::mem::replace(&mut self.tools[position], tool)),
            None => {
                self.index.insert(tool.name().to_owned(), self.tools.len());
                self.tools.push(tool);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|tool| tool.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    /// Definitions in insertion order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }
}

impl Extend<Arc<dyn Tool>> for ToolSet {
    fn extend<I: IntoIterator<Item = Arc<dyn Tool>>>(&mut self, iter: I) {
        for tool in iter {
            self.insert(tool);
        }
    }
}

impl FromIterator<Arc<dyn Tool>> for ToolSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Tool>>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for ToolSet {
    type Item = Arc<dyn Tool>;
    type IntoIter = std::vec::IntoIter<Arc<dyn Tool>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.into_iter()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
