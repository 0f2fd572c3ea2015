use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_cloudformation as cfn;
use tracing::{debug, warn};

/// A single declared stack output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
}

impl StackOutput {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Read-only access to deployed stack outputs in one account and region
#[async_trait]
pub trait StackDescriber: Send + Sync {
    /// Outputs of the named stack. Errors when the stack cannot be described.
    async fn stack_outputs(&self, stack_name: &str) -> Result<Vec<StackOutput>>;
}

/// `StackDescriber` backed by the CloudFormation DescribeStacks API
#[derive(Clone)]
pub struct CloudFormationStackDescriber {
    client: cfn::Client,
}

impl CloudFormationStackDescriber {
    pub fn new(aws_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: cfn::Client::new(aws_config),
        }
    }
}

#[async_trait]
impl StackDescriber for CloudFormationStackDescriber {
    async fn stack_outputs(&self, stack_name: &str) -> Result<Vec<StackOutput>> {
        let response = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .with_context(|| format!("Failed to describe stack {}", stack_name))?;

        let stack = response
            .stacks()
            .first()
            .ok_or_else(|| anyhow!("No stacks found with name {}", stack_name))?;

        let mut outputs = Vec::new();
        for output in stack.outputs() {
            if let (Some(key), Some(value)) = (output.output_key(), output.output_value()) {
                outputs.push(StackOutput::new(key, value));
            }
        }

        debug!("Fetched {} outputs for stack {}", outputs.len(), stack_name);
        Ok(outputs)
    }
}

/// Resolve `output_key` on `stack_name`, or `None` when it cannot be found.
///
/// Every failure is logged as a warning: the caller skips the account.
pub async fn resolve_stack_output(
    describer: &dyn StackDescriber,
    stack_name: &str,
    output_key: &str,
) -> Option<String> {
    let outputs = match describer.stack_outputs(stack_name).await {
        Ok(outputs) => outputs,
        Err(e) => {
            warn!("Failed to describe stack {}: {:#}", stack_name, e);
            return None;
        }
    };

    if outputs.is_empty() {
        warn!("Stack {} has no outputs", stack_name);
        return None;
    }

    match outputs.into_iter().find(|output| output.key == output_key) {
        Some(output) => Some(output.value),
        None => {
            warn!(
                "Output key {} not found in stack {}",
                output_key, stack_name
            );
            None
        }
    }
}
