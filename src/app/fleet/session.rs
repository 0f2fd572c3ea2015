use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::app::accounts::AccountCredential;
use crate::app::cloudformation::{CloudFormationStackDescriber, StackDescriber};
use crate::app::credentials::create_aws_config_for_account;
use crate::app::data_plane::cloudwatch_logs::{CloudWatchLogsClient, InsightsApi};

/// Service clients bound to one account and region
#[derive(Clone)]
pub struct AccountSession {
    pub stacks: Arc<dyn StackDescriber>,
    pub logs: Arc<dyn InsightsApi>,
}

/// Builds the per-account clients used by a collector worker
#[async_trait]
pub trait AccountSessionFactory: Send + Sync {
    async fn open(&self, account: &AccountCredential, region: &str) -> Result<AccountSession>;
}

/// Opens sessions against AWS using each account's static keys
#[derive(Debug, Default, Clone)]
pub struct AwsSessionFactory;

#[async_trait]
impl AccountSessionFactory for AwsSessionFactory {
    async fn open(&self, account: &AccountCredential, region: &str) -> Result<AccountSession> {
        let aws_config = create_aws_config_for_account(account, region).await;

        Ok(AccountSession {
            stacks: Arc::new(CloudFormationStackDescriber::new(&aws_config)),
            logs: Arc::new(CloudWatchLogsClient::new(&aws_config)),
        })
    }
}
