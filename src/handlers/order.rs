use axum::extract::State;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::extract::{Json, Path, Query};
use super::utils::{affected_response, list_response, page};
use crate::database::models::{NewOrder, Order, OrderFilter, OrderMeasures};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::DeliveryType;
use crate::validation::{self, Required, ValidationError, MEASURE_SCALE, WEIGHT_SCALE};

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    #[serde(rename = "idPedido")]
    pub order_id: Option<i32>,
    #[serde(rename = "idCliente")]
    pub client_id: Option<i32>,
    #[serde(rename = "idTipoEntrega")]
    pub delivery_type_id: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    pub data_pedido: Option<String>,
    pub id_cliente: Option<i32>,
    pub id_tipo_entrega: Option<i32>,
    pub distancia: Option<Decimal>,
    #[serde(alias = "peso")]
    pub peso_carga: Option<Decimal>,
    #[serde(alias = "valor_kg")]
    pub valor_base_kg: Option<Decimal>,
    #[serde(alias = "valor_km")]
    pub valor_base_km: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrder {
    pub distancia: Option<Decimal>,
    #[serde(alias = "peso")]
    pub peso_carga: Option<Decimal>,
    #[serde(alias = "valor_kg")]
    pub valor_base_kg: Option<Decimal>,
    #[serde(alias = "valor_km")]
    pub valor_base_km: Option<Decimal>,
}

fn measure(field: &'static str, value: Option<Decimal>, scale: u32) -> Result<Option<Decimal>, ValidationError> {
    value.map(|v| validation::measure(field, v, scale)).transpose()
}

async fn existing_order(state: &AppState, id: i32) -> Result<Order, ApiError> {
    state
        .repository
        .find_order(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Pedido não encontrado."))
}

/// GET /pedidos - filters combine
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Vec<Order>> {
    let filter = OrderFilter {
        order_id: query.order_id,
        client_id: query.client_id,
        delivery_type_id: query.delivery_type_id,
    };
    let orders = state
        .repository
        .list_orders(&filter, page(&state, query.limit, query.offset))
        .await?;
    Ok(list_response(orders))
}

/// GET /pedidos/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Order> {
    Ok(ApiResponse::success(existing_order(&state, id).await?))
}

/// POST /pedidos
pub async fn create(State(state): State<AppState>, Json(body): Json<CreateOrder>) -> ApiResult<Order> {
    let mut required = Required::new();
    required
        .text("data_pedido", &body.data_pedido)
        .check("id_cliente", &body.id_cliente)
        .check("id_tipo_entrega", &body.id_tipo_entrega)
        .check("distancia", &body.distancia)
        .check("peso_carga", &body.peso_carga)
        .check("valor_base_kg", &body.valor_base_kg)
        .check("valor_base_km", &body.valor_base_km);
    let (
        Some(raw_date),
        Some(client_id),
        Some(type_id),
        Some(distance),
        Some(weight),
        Some(rate_per_kg),
        Some(rate_per_km),
    ) = (
        body.data_pedido.as_deref(),
        body.id_cliente,
        body.id_tipo_entrega,
        body.distancia,
        body.peso_carga,
        body.valor_base_kg,
        body.valor_base_km,
    )
    else {
        return Err(ApiError::missing_fields(required.missing()));
    };
    if !required.missing().is_empty() {
        return Err(ApiError::missing_fields(required.missing()));
    }

    let order_date = validation::order_date(raw_date)?;
    let delivery_type = DeliveryType::from_id(type_id)
        .ok_or_else(|| ValidationError::new("id_tipo_entrega", "Tipo de entrega inválido."))?;
    let measures = OrderMeasures {
        distance: validation::measure("distancia", distance, MEASURE_SCALE)?,
        cargo_weight: validation::measure("peso_carga", weight, WEIGHT_SCALE)?,
        rate_per_kg: validation::measure("valor_base_kg", rate_per_kg, MEASURE_SCALE)?,
        rate_per_km: validation::measure("valor_base_km", rate_per_km, MEASURE_SCALE)?,
    };

    if state.repository.find_client(client_id).await?.is_none() {
        return Err(ApiError::not_found("Cliente não encontrado."));
    }

    let order = state
        .repository
        .create_order(&NewOrder {
            client_id,
            delivery_type_id: delivery_type.id(),
            order_date,
            measures,
        })
        .await?;
    info!("Created order {} for client {}", order.id, client_id);

    Ok(ApiResponse::created(order).with_message("Pedido cadastrado com sucesso."))
}

/// PUT /pedidos/:id - deliveries already priced keep their charges
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateOrder>,
) -> ApiResult<Value> {
    if body.distancia.is_none()
        && body.peso_carga.is_none()
        && body.valor_base_kg.is_none()
        && body.valor_base_km.is_none()
    {
        return Err(ApiError::bad_request("Nenhum campo para atualizar."));
    }

    let distance = measure("distancia", body.distancia, MEASURE_SCALE)?;
    let weight = measure("peso_carga", body.peso_carga, WEIGHT_SCALE)?;
    let rate_per_kg = measure("valor_base_kg", body.valor_base_kg, MEASURE_SCALE)?;
    let rate_per_km = measure("valor_base_km", body.valor_base_km, MEASURE_SCALE)?;

    let current = existing_order(&state, id).await?;
    let stored = OrderMeasures::from(&current);
    let measures = OrderMeasures {
        distance: distance.unwrap_or(stored.distance),
        cargo_weight: weight.unwrap_or(stored.cargo_weight),
        rate_per_kg: rate_per_kg.unwrap_or(stored.rate_per_kg),
        rate_per_km: rate_per_km.unwrap_or(stored.rate_per_km),
    };

    let rows = state.repository.update_order(id, &measures).await?;
    if rows > 0 {
        info!("Updated order {}", id);
    }
    Ok(affected_response("id_pedido", id, rows, "Pedido atualizado com sucesso."))
}

/// DELETE /pedidos/:id - only while every delivery of the order is canceled
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Value> {
    existing_order(&state, id).await?;

    let deliveries = state.repository.deliveries_for_order(id).await?;
    if let Some(active) = deliveries.iter().find(|d| !d.status.allows_deletion()) {
        warn!("Refusing to delete order {}: delivery {} is {}", id, active.id, active.status);
        return Err(ApiError::conflict(format!(
            "Pedido possui entrega com status '{}' e não pode ser excluído.",
            active.status
        )));
    }

    let rows = state.repository.delete_order(id).await?;
    info!("Deleted order {}", id);
    Ok(affected_response("id_pedido", id, rows, "Pedido excluído com sucesso."))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use crate::testing::TestApp;
    use crate::types::DeliveryStatus;

    fn new_order(client_id: i32) -> Value {
        json!({
            "data_pedido": "2024-05-10",
            "id_cliente": client_id,
            "id_tipo_entrega": 2,
            "distancia": "12.5",
            "peso_carga": 30,
            "valor_base_kg": "1.10",
            "valor_base_km": "2.00"
        })
    }

    fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn creates_order() {
        let app = TestApp::new();
        let client = app.seed_client();

        let (status, body) = app.post("/pedidos", new_order(client.id)).await;
        assert_eq!(status, StatusCode::CREATED);
        let data = &body["data"];
        assert_eq!(data["id_cliente"], client.id);
        assert_eq!(data["id_tipo_entrega"], 2);
        assert_eq!(data["data_pedido"], "2024-05-10");
        assert_eq!(decimal(&data["distancia"]), Decimal::new(125, 1));
        assert_eq!(decimal(&data["peso_carga"]), Decimal::new(30, 0));
    }

    #[tokio::test]
    async fn validates_order_fields() {
        let app = TestApp::new();
        let client = app.seed_client();

        let mut unknown_type = new_order(client.id);
        unknown_type["id_tipo_entrega"] = json!(3);
        let (status, body) = app.post("/pedidos", unknown_type).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["id_tipo_entrega"].is_string());

        let mut zero_distance = new_order(client.id);
        zero_distance["distancia"] = json!(0);
        let (status, body) = app.post("/pedidos", zero_distance).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["distancia"].is_string());

        let mut bad_date = new_order(client.id);
        bad_date["data_pedido"] = json!("10-05-2024");
        let (status, _) = app.post("/pedidos", bad_date).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app.post("/pedidos", json!({ "id_cliente": client.id })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["valor_base_km"].is_string());

        let (status, _) = app.post("/pedidos", new_order(999)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert!(app.repo.orders().is_empty());
    }

    #[tokio::test]
    async fn measures_must_fit_stored_precision() {
        let app = TestApp::new();
        let client = app.seed_client();

        let mut huge = new_order(client.id);
        huge["distancia"] = json!("123456789012.345");
        let (status, body) = app.post("/pedidos", huge).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["distancia"].is_string());

        let mut precise = new_order(client.id);
        precise["valor_base_km"] = json!("2.555");
        let (status, body) = app.post("/pedidos", precise).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"]["valor_base_km"].is_string());
        assert!(app.repo.orders().is_empty());

        let mut weighed = new_order(client.id);
        weighed["peso_carga"] = json!("30.125");
        let (status, _) = app.post("/pedidos", weighed).await;
        assert_eq!(status, StatusCode::CREATED);

        let order = app.repo.orders()[0].clone();
        let uri = format!("/pedidos/{}", order.id);
        let (status, _) = app.put(&uri, json!({ "distancia": "12.555" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app.put(&uri, json!({ "valor_kg": "100000000" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.repo.orders()[0], order);
    }

    #[tokio::test]
    async fn filters_combine() {
        let app = TestApp::new();
        let client = app.seed_client();
        app.repo.seed_order(client.id, 1);
        let urgent = app.repo.seed_order(client.id, 2);

        let (_, body) = app.get(&format!("/pedidos?idCliente={}", client.id)).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (_, body) = app
            .get(&format!("/pedidos?idCliente={}&idTipoEntrega=2", client.id))
            .await;
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id_pedido"], urgent.id);

        let (status, body) = app.get("/pedidos?idCliente=999").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
        assert_eq!(body["message"], "Não foram encontrados resultados");

        let (status, _) = app.get("/pedidos?idCliente=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_merges_with_stored_values() {
        let app = TestApp::new();
        let client = app.seed_client();
        let order = app.repo.seed_order(client.id, 1);
        let uri = format!("/pedidos/{}", order.id);

        let (status, body) = app.put(&uri, json!({ "peso": "35.5", "valor_km": 3 })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["linhas_afetadas"], 1);
        let stored = app.repo.orders()[0].clone();
        assert_eq!(stored.cargo_weight, Decimal::new(355, 1));
        assert_eq!(stored.rate_per_km, Decimal::new(3, 0));
        assert_eq!(stored.distance, order.distance);

        let (status, body) = app.put(&uri, json!({ "peso_carga": "35.5" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["linhas_afetadas"], 0);

        let (status, _) = app.put(&uri, json!({ "distancia": -1 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app.put(&uri, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app.put("/pedidos/999", json!({ "distancia": 1 })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_refused_while_delivery_not_canceled() {
        let app = TestApp::new();
        let client = app.seed_client();
        let order = app.repo.seed_order(client.id, 1);
        app.repo.seed_delivery(order.id, DeliveryStatus::Delivered);

        let (status, _) = app.delete(&format!("/pedidos/{}", order.id)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(app.repo.orders().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_canceled_deliveries_with_order() {
        let app = TestApp::new();
        let client = app.seed_client();
        let order = app.repo.seed_order(client.id, 1);
        app.repo.seed_delivery(order.id, DeliveryStatus::Canceled);
        app.repo.seed_delivery(order.id, DeliveryStatus::Canceled);

        let (status, body) = app.delete(&format!("/pedidos/{}", order.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["linhas_afetadas"], 1);
        assert!(app.repo.orders().is_empty());
        assert!(app.repo.deliveries().is_empty());

        let (status, _) = app.get(&format!("/pedidos/{}", order.id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
