use aws_config::{BehaviorVersion, Region};
use lambda_runtime::{service_fn, tracing};
use ledger_dynamodb::{DynamoDbLedgerStore, StoreConfig};
use model::Error;
use recorder::{activity_fn, ActivityRecorder, RecorderConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config: RecorderConfig = RecorderConfig::from_env()?;
    let store_config: StoreConfig = StoreConfig::from_env()?;

    // Region from the environment overrides the default provider chain
    let mut config_loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = store_config.region.clone() {
        config_loader = config_loader.region(Region::new(region));
    }
    let dynamodb_client: aws_sdk_dynamodb::Client =
        aws_sdk_dynamodb::Client::new(&config_loader.load().await);

    tracing::info!(?store_config, ?config, "Starting activity recorder");

    let store: DynamoDbLedgerStore =
        DynamoDbLedgerStore::from_config(dynamodb_client, &store_config);
    let recorder: ActivityRecorder = ActivityRecorder::new(Arc::new(store), config);

    lambda_runtime::run(service_fn(|event| activity_fn(&recorder, event))).await
}
