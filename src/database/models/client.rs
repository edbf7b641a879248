use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use super::{Address, Phone};

/// Row of `clientes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Client {
    #[serde(rename = "id_cliente")]
    #[sqlx(rename = "id_cliente")]
    pub id: i32,
    #[serde(rename = "nome")]
    #[sqlx(rename = "nome_cliente")]
    pub name: String,
    #[sqlx(rename = "cpf_cliente")]
    pub cpf: String,
    #[sqlx(rename = "email_cliente")]
    pub email: String,
    #[serde(rename = "data_nascimento")]
    #[sqlx(rename = "data_nasc")]
    pub birth_date: NaiveDate,
}

/// Values written when a client is registered or updated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub birth_date: NaiveDate,
}

impl From<&Client> for ClientRecord {
    fn from(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            cpf: client.cpf.clone(),
            email: client.email.clone(),
            birth_date: client.birth_date,
        }
    }
}

/// Client with its computed age, phones and addresses
#[derive(Debug, Clone, Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub idade: i32,
    pub telefones: Vec<Phone>,
    pub enderecos: Vec<Address>,
}
