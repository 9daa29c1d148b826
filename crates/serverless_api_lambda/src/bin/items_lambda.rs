use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use serverless_api_core::response::ResponseEnvelope;
use serverless_api_lambda::adapters::dynamodb::DynamoItemStore;
use serverless_api_lambda::adapters::item_store::ItemStore;
use serverless_api_lambda::config::AppConfig;
use serverless_api_lambda::handlers::items::handle_items_event;
use serverless_api_lambda::handlers::HttpContext;
use serverless_api_lambda::logging::init_logging;

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &AppConfig,
    store: &dyn ItemStore,
) -> Result<ResponseEnvelope, Error> {
    let context = HttpContext::new(config, event.context.request_id);
    Ok(handle_items_event(event.payload, &context, store).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = AppConfig::from_env()?;
    init_logging(&config);

    let table_name = config.require_items_table()?.to_string();
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoItemStore::new(aws_sdk_dynamodb::Client::new(&sdk_config), table_name);

    lambda_runtime::run(service_fn(|event| handle_request(event, &config, &store))).await
}
