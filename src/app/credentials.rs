use crate::app::accounts::AccountCredential;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_types::region::Region;
use tracing::debug;

impl AccountCredential {
    /// Create AWS SDK Credentials from this account's static keys
    pub fn to_aws_credentials(&self) -> Credentials {
        Credentials::from_keys(&self.access_key, &self.secret_key, None)
    }
}

/// Create AWS SDK config scoped to one account's keys and the collector region
pub async fn create_aws_config_for_account(
    account: &AccountCredential,
    region: &str,
) -> aws_config::SdkConfig {
    debug!(
        "Creating AWS config for account: {} in region: {}",
        account.account_id, region
    );

    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(account.to_aws_credentials())
        .load()
        .await
}
