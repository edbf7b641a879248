use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::extract::{Json, Path};
use super::utils::{affected_response, list_response, text_or_number};
use crate::database::models::{Address, AddressRecord};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{self, Required, ValidationError};

/// Values used where the postal-code service returns an empty field
#[derive(Debug, Default, Deserialize)]
pub struct AddressFallback {
    pub estado: Option<String>,
    pub cidade: Option<String>,
    pub bairro: Option<String>,
    pub logradouro: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl AddressFallback {
    fn is_empty(&self) -> bool {
        self.estado.is_none() && self.cidade.is_none() && self.bairro.is_none() && self.logradouro.is_none()
    }

    /// Blank values count as absent; the rest are normalized
    pub(super) fn validated(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            estado: present(&self.estado).map(validation::state).transpose()?,
            cidade: present(&self.cidade)
                .map(|v| validation::address_text("cidade", v, validation::MAX_CITY_LEN))
                .transpose()?,
            bairro: present(&self.bairro)
                .map(|v| validation::address_text("bairro", v, validation::MAX_NEIGHBORHOOD_LEN))
                .transpose()?,
            logradouro: present(&self.logradouro)
                .map(|v| validation::address_text("logradouro", v, validation::MAX_STREET_LEN))
                .transpose()?,
        })
    }
}

fn fill(value: String, fallback: &Option<String>) -> String {
    if value.trim().is_empty() {
        fallback.as_deref().map(str::trim).unwrap_or_default().to_string()
    } else {
        value
    }
}

/// Resolve `cep` through the postal-code service into a storable address
pub(super) async fn resolve_address(
    state: &AppState,
    cep: &str,
    number: String,
    fallback: &AddressFallback,
) -> Result<AddressRecord, ApiError> {
    let found = state.cep.lookup(cep).await?;
    Ok(AddressRecord {
        state: fill(found.estado, &fallback.estado),
        city: fill(found.cidade, &fallback.cidade),
        neighborhood: fill(found.bairro, &fallback.bairro),
        street: fill(found.logradouro, &fallback.logradouro),
        number,
        cep: cep.to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct AddressPayload {
    #[serde(default, deserialize_with = "text_or_number")]
    pub cep: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub numero: Option<String>,
    #[serde(flatten)]
    pub fallback: AddressFallback,
}

async fn existing_client(state: &AppState, client_id: i32) -> Result<(), ApiError> {
    match state.repository.find_client(client_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Cliente não encontrado.")),
    }
}

async fn existing_address(state: &AppState, id: i32) -> Result<Address, ApiError> {
    state
        .repository
        .find_address(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Endereço não encontrado."))
}

/// GET /clientes/:id/enderecos
pub async fn list(
    State(state): State<AppState>,
    Path(client_id): Path<i32>,
) -> ApiResult<Vec<Address>> {
    existing_client(&state, client_id).await?;
    let addresses = state.repository.list_addresses(client_id).await?;
    Ok(list_response(addresses))
}

/// POST /clientes/:id/enderecos
pub async fn create(
    State(state): State<AppState>,
    Path(client_id): Path<i32>,
    Json(body): Json<AddressPayload>,
) -> ApiResult<Address> {
    let mut required = Required::new();
    required.text("cep", &body.cep).text("numero", &body.numero);
    if !required.missing().is_empty() {
        return Err(ApiError::missing_fields(required.missing()));
    }

    let cep = validation::cep(body.cep.as_deref().unwrap_or_default())?;
    let number = validation::house_number(body.numero.as_deref().unwrap_or_default())?;
    let fallback = body.fallback.validated()?;

    existing_client(&state, client_id).await?;
    if state
        .repository
        .find_client_address(client_id, &cep, &number)
        .await?
        .is_some()
    {
        warn!("Client {} already has address {} / {}", client_id, cep, number);
        return Err(ApiError::conflict("Endereço já cadastrado para este cliente."));
    }

    let record = resolve_address(&state, &cep, number, &fallback).await?;
    let address = state.repository.create_address(client_id, &record).await?;
    info!("Created address {} for client {}", address.id, client_id);

    Ok(ApiResponse::created(address).with_message("Endereço cadastrado com sucesso."))
}

/// PUT /enderecos/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<AddressPayload>,
) -> ApiResult<Value> {
    let fallback = body.fallback.validated()?;
    if body.cep.is_none() && body.numero.is_none() && fallback.is_empty() {
        return Err(ApiError::bad_request("Nenhum campo para atualizar."));
    }

    let cep = body.cep.as_deref().map(validation::cep).transpose()?;
    let number = body.numero.as_deref().map(validation::house_number).transpose()?;

    let current = existing_address(&state, id).await?;
    let cep = cep.unwrap_or_else(|| current.cep.clone());
    let number = number.unwrap_or_else(|| current.number.clone());

    if let Some(other) = state
        .repository
        .find_client_address(current.client_id, &cep, &number)
        .await?
    {
        if other.id != id {
            return Err(ApiError::conflict("Endereço já cadastrado para este cliente."));
        }
    }

    let record = if cep != current.cep {
        resolve_address(&state, &cep, number, &fallback).await?
    } else {
        AddressRecord {
            state: fallback.estado.unwrap_or(current.state),
            city: fallback.cidade.unwrap_or(current.city),
            neighborhood: fallback.bairro.unwrap_or(current.neighborhood),
            street: fallback.logradouro.unwrap_or(current.street),
            number,
            cep,
        }
    };

    let rows = state.repository.update_address(id, &record).await?;
    if rows > 0 {
        info!("Updated address {}", id);
    }
    Ok(affected_response("id_endereco", id, rows, "Endereço atualizado com sucesso."))
}

/// DELETE /enderecos/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Value> {
    let address = existing_address(&state, id).await?;
    let rows = state.repository.delete_address(id).await?;
    if rows == 0 {
        existing_address(&state, id).await?;
        warn!("Refusing to delete last address {} of client {}", id, address.client_id);
        return Err(ApiError::conflict("O cliente deve possuir ao menos um endereço."));
    }
    info!("Deleted address {}", id);
    Ok(affected_response("id_endereco", id, rows, "Endereço excluído com sucesso."))
}
