use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use serverless_api_core::response::ResponseEnvelope;
use serverless_api_lambda::config::AppConfig;
use serverless_api_lambda::handlers::hello::handle_hello_event;
use serverless_api_lambda::handlers::HttpContext;
use serverless_api_lambda::logging::init_logging;

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &AppConfig,
) -> Result<ResponseEnvelope, Error> {
    let context = HttpContext::new(config, event.context.request_id);
    Ok(handle_hello_event(event.payload, &context).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = AppConfig::from_env()?;
    init_logging(&config);

    lambda_runtime::run(service_fn(|event| handle_request(event, &config))).await
}
