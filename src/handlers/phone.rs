use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::extract::{Json, Path};
use super::utils::{affected_response, list_response, text_or_number, NO_CHANGES};
use crate::database::models::Phone;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{self, Required};

#[derive(Debug, Deserialize)]
pub struct PhonePayload {
    #[serde(default, deserialize_with = "text_or_number")]
    pub telefone: Option<String>,
}

impl PhonePayload {
    fn number(&self) -> Result<String, ApiError> {
        let mut required = Required::new();
        required.text("telefone", &self.telefone);
        if !required.missing().is_empty() {
            return Err(ApiError::missing_fields(required.missing()));
        }
        Ok(validation::phone(self.telefone.as_deref().unwrap_or_default())?)
    }
}

async fn existing_phone(state: &AppState, id: i32) -> Result<Phone, ApiError> {
    state
        .repository
        .find_phone(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Telefone não encontrado."))
}

/// GET /clientes/:id/telefones
pub async fn list(State(state): State<AppState>, Path(client_id): Path<i32>) -> ApiResult<Vec<Phone>> {
    if state.repository.find_client(client_id).await?.is_none() {
        return Err(ApiError::not_found("Cliente não encontrado."));
    }
    let phones = state.repository.list_phones(client_id).await?;
    Ok(list_response(phones))
}

/// POST /clientes/:id/telefones
pub async fn create(
    State(state): State<AppState>,
    Path(client_id): Path<i32>,
    Json(body): Json<PhonePayload>,
) -> ApiResult<Phone> {
    let number = body.number()?;

    if state.repository.find_client(client_id).await?.is_none() {
        return Err(ApiError::not_found("Cliente não encontrado."));
    }
    if state.repository.find_phone_by_number(&number).await?.is_some() {
        warn!("Phone {} already registered", number);
        return Err(ApiError::conflict("Telefone já cadastrado."));
    }

    let phone = state.repository.create_phone(client_id, &number).await?;
    info!("Created phone {} for client {}", phone.id, client_id);
    Ok(ApiResponse::created(phone).with_message("Telefone cadastrado com sucesso."))
}

/// PUT /telefones/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<PhonePayload>,
) -> ApiResult<Value> {
    let number = body.number()?;
    let current = existing_phone(&state, id).await?;

    if current.number == number {
        return Ok(affected_response("id_telefone", id, 0, NO_CHANGES));
    }
    if let Some(other) = state.repository.find_phone_by_number(&number).await? {
        if other.id != id {
            warn!("Phone {} already registered to phone {}", number, other.id);
            return Err(ApiError::conflict("Telefone já cadastrado."));
        }
    }

    let rows = state.repository.update_phone(id, &number).await?;
    info!("Updated phone {}", id);
    Ok(affected_response("id_telefone", id, rows, "Telefone atualizado com sucesso."))
}

/// DELETE /telefones/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Value> {
    let phone = existing_phone(&state, id).await?;
    let rows = state.repository.delete_phone(id).await?;
    if rows == 0 {
        // Already gone, or the client's last phone
        existing_phone(&state, id).await?;
        warn!("Refusing to delete last phone {} of client {}", id, phone.client_id);
        return Err(ApiError::conflict("O cliente deve possuir ao menos um telefone."));
    }
    info!("Deleted phone {}", id);
    Ok(affected_response("id_telefone", id, rows, "Telefone excluído com sucesso."))
}
