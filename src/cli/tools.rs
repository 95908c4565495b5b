//! CLI handlers for listing and calling aggregated tools.

use tokio_util::sync::CancellationToken;

use crate::config::{AggregatorConfig, EndpointsFile};
use crate::error::MuxError;
use crate::mcp::{AggregatedTools, MCPAggregator};
use crate::tools::{Tool, ToolArguments, ToolExecutionContext};

use super::{CallArgs, EndpointArgs, ListArgs};

async fn aggregate(
    target: &EndpointArgs,
    cancel: CancellationToken,
) -> Result<AggregatedTools, MuxError> {
    let file = EndpointsFile::load(&target.config)?;
    let aggregator = MCPAggregator::new().with_config(AggregatorConfig::from_env());
    Ok(aggregator
        .aggregate(&file.endpoints, target.identity.as_deref(), cancel)
        .await)
}

/// Handle `mcpmux list`.
pub async fn handle_list(
    args: &ListArgs,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let aggregated = aggregate(&args.target, cancel).await?;

    let definitions = aggregated.tools().definitions();
    if definitions.is_empty() {
        println!("No tools available.");
    }
    for definition in definitions {
        if definition.description.is_empty() {
            println!("{}", definition.name);
        } else {
            println!("{}  {}", definition.name, definition.description);
        }
    }

    aggregated.teardown().await;
    Ok(())
}

/// Handle `mcpmux call`.
pub async fn handle_call(
    args: &CallArgs,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let arguments: serde_json::Value = serde_json::from_str(&args.args)
        .map_err(|e| MuxError::InvalidArgument(format!("--args is not valid JSON: {e}")))?;
    let aggregated = aggregate(&args.target, cancel.clone()).await?;

    let result = match aggregated.tools().get(&args.tool) {
        Some(tool) => {
            tool.execute(
                &ToolArguments::new(arguments),
                &ToolExecutionContext::with_cancel(cancel),
            )
            .await
        }
        None => Err(MuxError::InvalidArgument(format!(
            "Unknown tool '{}'",
            args.tool
        ))),
    };

    aggregated.teardown().await;

    let value = result?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
