//! Caller-bound argument injection for designated tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::MuxError;
use crate::tools::{Tool, ToolArguments, ToolExecutionContext, ToolParameters, ToolSet};

const BUILTIN_RULES: &[(&str, &str)] = &[("cloudflare_rag_search", "user_id")];

/// Force `parameter` to the caller identity whenever `tool_name` is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionRule {
    pub tool_name: String,
    pub parameter: String,
}

impl InjectionRule {
    pub fn new(tool_name: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameter: parameter.into(),
        }
    }
}

/// Table of injection rules applied after the merge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InjectionPolicy {
    rules: Vec<InjectionRule>,
}

impl InjectionPolicy {
    pub fn new(rules: Vec<InjectionRule>) -> Self {
        Self { rules }
    }

    /// The fixed built-in table.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_RULES
                .iter()
                .map(|(tool, parameter)| InjectionRule::new(*tool, *parameter))
                .collect(),
        )
    }

    /// A policy that never wraps anything.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[InjectionRule] {
        &self.rules
    }

    pub fn with_rule(mut self, rule: InjectionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Every parameter bound for `tool_name`, in rule order, without repeats.
    fn parameters_for(&self, tool_name: &str) -> Vec<String> {
        let mut parameters: Vec<String> = Vec::new();
        for rule in self.rules.iter().filter(|rule| rule.tool_name == tool_name) {
            if !parameters.contains(&rule.parameter) {
                parameters.push(rule.parameter.clone());
            }
        }
        parameters
    }

    /// Return a copy of `tools` with every tool named by a rule wrapped so all
    /// of its rule parameters are bound to `identity`. Other tools are shared as-is.
    pub fn apply(&self, tools: &ToolSet, identity: &str) -> ToolSet {
        tools
            .iter()
            .map(|tool| {
                let parameters = self.parameters_for(tool.name());
                if parameters.is_empty() {
                    Arc::clone(tool)
                } else {
                    Arc::new(InjectedTool::new(Arc::clone(tool), parameters, identity))
                        as Arc<dyn Tool>
                }
            })
            .collect()
    }
}

/// Decorator that overwrites the bound arguments before delegating.
pub struct InjectedTool {
    inner: Arc<dyn Tool>,
    parameters: Vec<String>,
    value: String,
}

impl InjectedTool {
    pub fn new(inner: Arc<dyn Tool>, parameters: Vec<String>, value: impl Into<String>) -> Self {
        Self {
            inner,
            parameters,
            value: value.into(),
        }
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}

#[async_trait]
impl Tool for InjectedTool {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn parameters(&self) -> &ToolParameters {
        self.inner.parameters()
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value, MuxError> {
        let mut object = args.to_object()?.unwrap_or_default();
        for parameter in &self.parameters {
            object.insert(parameter.clone(), Value::String(self.value.clone()));
        }
        self.inner
            .execute(&ToolArguments::new(Value::Object(object)), ctx)
            .await
    }
}

impl std::fmt::Debug for InjectedTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectedTool")
            .field("name", &self.inner.name())
            .field("parameters", &self.parameters)
            .finish()
    }
}
