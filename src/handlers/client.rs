use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::address::{resolve_address, AddressFallback};
use super::extract::{Json, Path, Query};
use super::utils::{affected_response, list_response, page, text_or_number, today};
use crate::database::models::{Client, ClientDetail, ClientRecord};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{self, Required};

#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    #[serde(rename = "idCliente")]
    pub client_id: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClient {
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cpf: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "dataNasc")]
    pub data_nascimento: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub telefone: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cep: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub numero: Option<String>,
    #[serde(flatten)]
    pub fallback: AddressFallback,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClient {
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cpf: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "dataNasc")]
    pub data_nascimento: Option<String>,
}

async fn existing_client(state: &AppState, id: i32) -> Result<Client, ApiError> {
    state
        .repository
        .find_client(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cliente não encontrado."))
}

async fn detail(state: &AppState, client: Client) -> Result<ClientDetail, ApiError> {
    let telefones = state.repository.list_phones(client.id).await?;
    let enderecos = state.repository.list_addresses(client.id).await?;
    Ok(ClientDetail {
        idade: validation::age_on(client.birth_date, today()),
        client,
        telefones,
        enderecos,
    })
}

/// CPF and e-mail must not belong to another client
async fn ensure_unique(
    state: &AppState,
    record: &ClientRecord,
    exclude_id: Option<i32>,
) -> Result<(), ApiError> {
    let is_other = |client: &Client| Some(client.id) != exclude_id;

    if let Some(found) = state.repository.find_client_by_cpf(&record.cpf).await? {
        if is_other(&found) {
            warn!("CPF already registered to client {}", found.id);
            return Err(ApiError::conflict("CPF já cadastrado."));
        }
    }
    if let Some(found) = state.repository.find_client_by_email(&record.email).await? {
        if is_other(&found) {
            warn!("Email already registered to client {}", found.id);
            return Err(ApiError::conflict("Email já cadastrado."));
        }
    }
    Ok(())
}

/// GET /clientes
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ClientQuery>,
) -> Result<Response, ApiError> {
    if let Some(id) = query.client_id {
        let client = existing_client(&state, id).await?;
        return Ok(ApiResponse::success(detail(&state, client).await?).into_response());
    }

    let clients = state
        .repository
        .list_clients(page(&state, query.limit, query.offset))
        .await?;
    Ok(list_response(clients).into_response())
}

/// GET /clientes/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<ClientDetail> {
    let client = existing_client(&state, id).await?;
    Ok(ApiResponse::success(detail(&state, client).await?))
}

/// POST /clientes - registers the client with its first phone and address
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateClient>,
) -> ApiResult<ClientDetail> {
    let mut required = Required::new();
    required
        .text("nome", &body.nome)
        .text("cpf", &body.cpf)
        .text("email", &body.email)
        .text("data_nascimento", &body.data_nascimento)
        .text("telefone", &body.telefone)
        .text("cep", &body.cep)
        .text("numero", &body.numero);
    if !required.missing().is_empty() {
        return Err(ApiError::missing_fields(required.missing()));
    }

    let today = today();
    let record = ClientRecord {
        name: validation::name(body.nome.as_deref().unwrap_or_default())?,
        cpf: validation::cpf(body.cpf.as_deref().unwrap_or_default())?,
        email: validation::email(body.email.as_deref().unwrap_or_default())?,
        birth_date: validation::birth_date(body.data_nascimento.as_deref().unwrap_or_default(), today)?,
    };
    validation::adult(record.birth_date, today)?;
    let phone = validation::phone(body.telefone.as_deref().unwrap_or_default())?;
    let cep = validation::cep(body.cep.as_deref().unwrap_or_default())?;
    let number = validation::house_number(body.numero.as_deref().unwrap_or_default())?;
    let fallback = body.fallback.validated()?;

    ensure_unique(&state, &record, None).await?;
    if state.repository.find_phone_by_number(&phone).await?.is_some() {
        return Err(ApiError::conflict("Telefone já cadastrado."));
    }

    let address = resolve_address(&state, &cep, number, &fallback).await?;
    let client = state.repository.create_client(&record, &phone, &address).await?;
    info!("Registered client {}", client.id);

    let detail = detail(&state, client).await?;
    Ok(ApiResponse::created(detail).with_message("Cliente cadastrado com sucesso."))
}

/// PUT /clientes/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateClient>,
) -> ApiResult<Value> {
    if body.nome.is_none() && body.cpf.is_none() && body.email.is_none() && body.data_nascimento.is_none() {
        return Err(ApiError::bad_request("Nenhum campo para atualizar."));
    }

    let today = today();
    let name = body.nome.as_deref().map(validation::name).transpose()?;
    let cpf = body.cpf.as_deref().map(validation::cpf).transpose()?;
    let email = body.email.as_deref().map(validation::email).transpose()?;
    let birth_date = body
        .data_nascimento
        .as_deref()
        .map(|raw| validation::birth_date(raw, today))
        .transpose()?;
    if let Some(birth_date) = birth_date {
        validation::adult(birth_date, today)?;
    }

    let current = existing_client(&state, id).await?;
    let mut record = ClientRecord::from(&current);
    if let Some(name) = name {
        record.name = name;
    }
    if let Some(cpf) = cpf {
        record.cpf = cpf;
    }
    if let Some(email) = email {
        record.email = email;
    }
    if let Some(birth_date) = birth_date {
        record.birth_date = birth_date;
    }

    ensure_unique(&state, &record, Some(id)).await?;
    let rows = state.repository.update_client(id, &record).await?;
    if rows > 0 {
        info!("Updated client {}", id);
    }
    Ok(affected_response("id_cliente", id, rows, "Cliente atualizado com sucesso."))
}

/// DELETE /clientes/:id - removes phones and addresses with the client
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Value> {
    existing_client(&state, id).await?;

    let orders = state.repository.count_orders_for_client(id).await?;
    if orders > 0 {
        warn!("Refusing to delete client {} with {} orders", id, orders);
        return Err(ApiError::conflict(
            "Cliente possui pedidos cadastrados e não pode ser excluído.",
        ));
    }

    let rows = state.repository.delete_client(id).await?;
    info!("Deleted client {}", id);
    Ok(affected_response("id_cliente", id, rows, "Cliente excluído com sucesso."))
}
