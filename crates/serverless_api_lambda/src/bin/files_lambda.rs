use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use serverless_api_core::response::ResponseEnvelope;
use serverless_api_lambda::adapters::object_store::ObjectStore;
use serverless_api_lambda::adapters::s3::S3ObjectStore;
use serverless_api_lambda::config::AppConfig;
use serverless_api_lambda::handlers::files::handle_files_event;
use serverless_api_lambda::handlers::HttpContext;
use serverless_api_lambda::logging::init_logging;

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &AppConfig,
    store: &dyn ObjectStore,
) -> Result<ResponseEnvelope, Error> {
    let context = HttpContext::new(config, event.context.request_id);
    Ok(handle_files_event(event.payload, &context, store).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = AppConfig::from_env()?;
    init_logging(&config);
    config.require_bucket()?;

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3ObjectStore::from_config(&sdk_config, &config);

    lambda_runtime::run(service_fn(|event| handle_request(event, &config, &store))).await
}
