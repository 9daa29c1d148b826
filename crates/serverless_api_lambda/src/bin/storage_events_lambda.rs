use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use serverless_api_core::response::{EnvelopeBuilder, ResponseEnvelope};
use serverless_api_lambda::adapters::object_store::ObjectStore;
use serverless_api_lambda::adapters::s3::S3ObjectStore;
use serverless_api_lambda::config::AppConfig;
use serverless_api_lambda::handlers::envelope_builder;
use serverless_api_lambda::handlers::storage_events::handle_storage_event;
use serverless_api_lambda::logging::init_logging;

async fn handle_request(
    event: LambdaEvent<Value>,
    store: &dyn ObjectStore,
    envelopes: &EnvelopeBuilder,
) -> Result<ResponseEnvelope, Error> {
    Ok(handle_storage_event(event.payload, store, envelopes).await?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = AppConfig::from_env()?;
    init_logging(&config);

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3ObjectStore::from_config(&sdk_config, &config);
    let envelopes = envelope_builder(&config);

    lambda_runtime::run(service_fn(|event| handle_request(event, &store, &envelopes))).await
}
