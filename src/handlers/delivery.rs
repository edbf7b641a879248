use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::extract::{Json, Path, Query};
use super::utils::{affected_response, list_response, page, NO_CHANGES};
use crate::database::models::{Delivery, DeliveryFilter, NewDelivery};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::pricing::{self, ChargeInput};
use crate::state::AppState;
use crate::types::{DeliveryStatus, DeliveryType};
use crate::validation::{Required, ValidationError};

#[derive(Debug, Deserialize)]
pub struct DeliveryQuery {
    #[serde(rename = "idEntrega")]
    pub delivery_id: Option<i32>,
    #[serde(rename = "idPedido")]
    pub order_id: Option<i32>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDelivery {
    pub id_pedido: Option<i32>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDelivery {
    pub status: Option<String>,
}

async fn existing_delivery(state: &AppState, id: i32) -> Result<Delivery, ApiError> {
    state
        .repository
        .find_delivery(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Entrega não encontrada."))
}

/// GET /entregas
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<DeliveryQuery>,
) -> ApiResult<Vec<Delivery>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<DeliveryStatus>)
        .transpose()?;
    let filter = DeliveryFilter {
        delivery_id: query.delivery_id,
        order_id: query.order_id,
        status,
    };
    let deliveries = state
        .repository
        .list_deliveries(&filter, page(&state, query.limit, query.offset))
        .await?;
    Ok(list_response(deliveries))
}

/// GET /entregas/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Delivery> {
    Ok(ApiResponse::success(existing_delivery(&state, id).await?))
}

/// POST /entregas - prices the delivery from its order
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateDelivery>,
) -> ApiResult<Delivery> {
    let mut required = Required::new();
    required.check("id_pedido", &body.id_pedido);
    let Some(order_id) = body.id_pedido else {
        return Err(ApiError::missing_fields(required.missing()));
    };

    let status = match body.status.as_deref() {
        Some(raw) => raw.parse::<DeliveryStatus>()?,
        None => DeliveryStatus::Calculated,
    };
    if status.is_terminal() {
        return Err(ValidationError::new(
            "status",
            "Uma nova entrega deve iniciar como 'calculado' ou 'em transito'.",
        )
        .into());
    }

    let order = state
        .repository
        .find_order(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Pedido não encontrado."))?;

    let existing = state.repository.deliveries_for_order(order_id).await?;
    if let Some(active) = existing.iter().find(|d| d.status.blocks_new_delivery()) {
        warn!("Order {} already has delivery {} ({})", order_id, active.id, active.status);
        return Err(ApiError::conflict("Já existe uma entrega ativa para este pedido."));
    }

    let delivery_type = DeliveryType::from_id(order.delivery_type_id).ok_or_else(|| {
        error!("Order {} references unknown delivery type {}", order.id, order.delivery_type_id);
        ApiError::internal_server_error(
            "Erro interno do servidor.",
            Some(format!("tipo de entrega desconhecido: {}", order.delivery_type_id)),
        )
    })?;
    let charges = pricing::calculate(
        &ChargeInput {
            delivery_type,
            distance_km: order.distance,
            weight_kg: order.cargo_weight,
            rate_per_km: order.rate_per_km,
            rate_per_kg: order.rate_per_kg,
        },
        &state.config.pricing,
    );
    if !charges.fits() {
        error!("Charges for order {} exceed the storable range: {:?}", order_id, charges);
        return Err(ApiError::bad_request("Valor calculado da entrega excede o limite permitido."));
    }

    let delivery = state
        .repository
        .create_delivery(&NewDelivery {
            order_id,
            status,
            charges,
        })
        .await?;
    info!(
        "Created delivery {} for order {} (valor_final {})",
        delivery.id, order_id, delivery.final_value
    );

    Ok(ApiResponse::created(delivery).with_message("Entrega cadastrada com sucesso."))
}

/// PUT /entregas/:id - moves the delivery along its lifecycle
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateDelivery>,
) -> ApiResult<Value> {
    let mut required = Required::new();
    required.text("status", &body.status);
    if !required.missing().is_empty() {
        return Err(ApiError::missing_fields(required.missing()));
    }
    let next: DeliveryStatus = body.status.as_deref().unwrap_or_default().parse()?;

    let current = existing_delivery(&state, id).await?;
    if current.status == next {
        return Ok(affected_response("id_entrega", id, 0, NO_CHANGES));
    }
    if !current.status.can_transition_to(next) {
        warn!("Refusing delivery {} transition {} -> {}", id, current.status, next);
        return Err(ApiError::conflict(format!(
            "Não é possível alterar o status de '{}' para '{}'.",
            current.status, next
        )));
    }

    let rows = state.repository.update_delivery_status(id, next).await?;
    info!("Delivery {} moved from {} to {}", id, current.status, next);
    Ok(affected_response("id_entrega", id, rows, "Status da entrega atualizado com sucesso."))
}

/// DELETE /entregas/:id - only canceled deliveries
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Value> {
    let delivery = existing_delivery(&state, id).await?;
    if !delivery.status.allows_deletion() {
        warn!("Refusing to delete delivery {} with status {}", id, delivery.status);
        return Err(ApiError::conflict(
            "Somente entregas com status 'cancelado' podem ser excluídas.",
        ));
    }

    let rows = state.repository.delete_delivery(id).await?;
    info!("Deleted delivery {}", id);
    Ok(affected_response("id_entrega", id, rows, "Entrega excluída com sucesso."))
}
