use chrono::{Local, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::database::models::Page;
use crate::middleware::ApiResponse;
use crate::state::AppState;

pub const NO_RESULTS: &str = "Não foram encontrados resultados";
pub const NO_CHANGES: &str = "Nenhuma alteração realizada.";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn page(state: &AppState, limit: Option<i64>, offset: Option<i64>) -> Page {
    let api = &state.config.api;
    Page::new(limit, offset, api.default_page_size, api.max_page_size)
}

/// 200 with the rows, flagged with a message when there are none
pub fn list_response<T: Serialize>(items: Vec<T>) -> ApiResponse<Vec<T>> {
    if items.is_empty() {
        ApiResponse::success(items).with_message(NO_RESULTS)
    } else {
        ApiResponse::success(items)
    }
}

/// Result of an update or delete: the id plus `linhas_afetadas`
pub fn affected_response(id_field: &str, id: i32, rows: u64, done: &str) -> ApiResponse<Value> {
    let message = if rows == 0 { NO_CHANGES } else { done };
    let mut data = serde_json::Map::new();
    data.insert(id_field.to_string(), json!(id));
    data.insert("linhas_afetadas".to_string(), json!(rows));
    ApiResponse::success(Value::Object(data)).with_message(message)
}

/// Accepts `"123"` as well as `123` for fields that are digits on the wire
pub fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!("expected text or number, got {}", other))),
    }
}
