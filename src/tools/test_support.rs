use async_trait::async_trait;
use serde_json::Value;

use crate::error::MuxError;

use super::{Tool, ToolArguments, ToolExecutionContext, ToolParameters};

type Responder = dyn Fn(Value) -> Result<Value, MuxError> + Send + Sync;

/// In-process tool answering from a closure over the raw arguments.
pub(crate) struct StubTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    respond: Box<Responder>,
}

impl StubTool {
    pub(crate) fn new(
        name: &str,
        description: impl Into<String>,
        respond: impl Fn(Value) -> Result<Value, MuxError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_owned(),
            description: description.into(),
            parameters: ToolParameters::empty(),
            respond: Box::new(respond),
        }
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<Value, MuxError> {
        (self.respond)(args.clone().into_raw())
    }
}
