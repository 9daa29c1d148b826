use serde_json::{json, Value};
use serverless_api_core::contract::{ItemPatch, NewItem};
use serverless_api_core::errors::ApiError;
use serverless_api_core::request::ApiRequest;
use serverless_api_core::response::ResponseEnvelope;
use serverless_api_core::validation::{string_field, validate_schema, FieldSchema, StringRules};

use super::{decode_request, route_is, route_not_found, HandlerResult, HttpContext};
use crate::adapters::item_store::ItemStore;
use crate::adapters::StoreError;

const FUNCTION: &str = "items";
pub const ITEM_NOT_FOUND_MESSAGE: &str = "Item not found";
pub const MISSING_ID_MESSAGE: &str = "id path parameter is required";
pub const EMPTY_PATCH_MESSAGE: &str = "At least one of title, description, status must be provided";

/// Items API: CRUD over the key-value store.
pub async fn handle_items_event(
    event: Value,
    context: &HttpContext<'_>,
    store: &dyn ItemStore,
) -> ResponseEnvelope {
    let result = route(&event, context, store).await;
    context.respond(FUNCTION, result)
}

async fn route(event: &Value, context: &HttpContext<'_>, store: &dyn ItemStore) -> HandlerResult {
    let mut request = decode_request(FUNCTION, context, event)?;

    if route_is(&mut request, "POST", "/items") {
        create_item(&request, context, store).await
    } else if route_is(&mut request, "GET", "/items") {
        list_items(context, store).await
    } else if route_is(&mut request, "GET", "/items/{id}") {
        get_item(&request, context, store).await
    } else if route_is(&mut request, "PUT", "/items/{id}") {
        update_item(&request, context, store).await
    } else if route_is(&mut request, "DELETE", "/items/{id}") {
        delete_item(&request, context, store).await
    } else {
        Err(route_not_found(&request).into())
    }
}

fn item_schema(title_required: bool) -> FieldSchema {
    let title = StringRules::default().min_length(1).max_length(200);
    let title = if title_required { title.required() } else { title };

    FieldSchema::new()
        .field("title", string_field(title))
        .field("description", string_field(StringRules::default().max_length(1000)))
        .field("status", string_field(StringRules::default().max_length(50)))
}

fn string_value(body: &Value, field: &str) -> Option<String> {
    body.get(field).and_then(Value::as_str).map(str::to_string)
}

fn item_id(request: &ApiRequest) -> Result<String, ApiError> {
    request
        .decoded_path_param("id")?
        .ok_or_else(|| ApiError::bad_request(MISSING_ID_MESSAGE))
}

fn item_not_found(id: &str) -> ApiError {
    ApiError::not_found(ITEM_NOT_FOUND_MESSAGE).with_detail("id", id)
}

async fn create_item(
    request: &ApiRequest,
    context: &HttpContext<'_>,
    store: &dyn ItemStore,
) -> HandlerResult {
    let body = request.json_body()?;
    validate_schema(&body, &item_schema(true)).into_result()?;

    let new_item = NewItem {
        id: uuid::Uuid::new_v4().to_string(),
        title: string_value(&body, "title").unwrap_or_default(),
        description: string_value(&body, "description"),
        status: string_value(&body, "status"),
    };
    let item = store.create(new_item).await.map_err(ApiError::from)?;
    tracing::info!(function = FUNCTION, item_id = %item.id, "Item created");

    Ok(context.envelopes.build(201, &item))
}

async fn list_items(context: &HttpContext<'_>, store: &dyn ItemStore) -> HandlerResult {
    let items = store.scan_all().await.map_err(ApiError::from)?;
    Ok(context.envelopes.build(
        200,
        json!({
            "items": items,
            "count": items.len(),
        }),
    ))
}

async fn get_item(
    request: &ApiRequest,
    context: &HttpContext<'_>,
    store: &dyn ItemStore,
) -> HandlerResult {
    let id = item_id(request)?;
    let item = store
        .get(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| item_not_found(&id))?;

    Ok(context.envelopes.build(200, &item))
}

async fn update_item(
    request: &ApiRequest,
    context: &HttpContext<'_>,
    store: &dyn ItemStore,
) -> HandlerResult {
    let id = item_id(request)?;
    let body = request.json_body()?;
    validate_schema(&body, &item_schema(false)).into_result()?;

    let patch = ItemPatch {
        title: string_value(&body, "title"),
        description: string_value(&body, "description"),
        status: string_value(&body, "status"),
    };
    if patch.is_empty() {
        return Err(ApiError::bad_request(EMPTY_PATCH_MESSAGE).into());
    }
    if !store.exists(&id).await.map_err(ApiError::from)? {
        return Err(item_not_found(&id).into());
    }

    let item = store.update(&id, &patch).await.map_err(|error| match error {
        StoreError::NotFound(_) => item_not_found(&id),
        other => ApiError::from(other),
    })?;
    tracing::info!(function = FUNCTION, item_id = %item.id, "Item updated");

    Ok(context.envelopes.build(200, &item))
}

async fn delete_item(
    request: &ApiRequest,
    context: &HttpContext<'_>,
    store: &dyn ItemStore,
) -> HandlerResult {
    let id = item_id(request)?;
    if !store.exists(&id).await.map_err(ApiError::from)? {
        return Err(item_not_found(&id).into());
    }

    store.delete(&id).await.map_err(ApiError::from)?;
    tracing::info!(function = FUNCTION, item_id = %id, "Item deleted");

    Ok(context.envelopes.build(
        200,
        json!({
            "message": "Item deleted successfully",
            "id": id,
        }),
    ))
}
