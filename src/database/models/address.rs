use serde::Serialize;
use sqlx::FromRow;

/// Row of `enderecos`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Address {
    #[serde(rename = "id_endereco")]
    #[sqlx(rename = "id_endereco")]
    pub id: i32,
    #[serde(rename = "id_cliente")]
    #[sqlx(rename = "fk_id_cliente")]
    pub client_id: i32,
    #[serde(rename = "estado")]
    #[sqlx(rename = "estado")]
    pub state: String,
    #[serde(rename = "cidade")]
    #[sqlx(rename = "cidade")]
    pub city: String,
    #[serde(rename = "bairro")]
    #[sqlx(rename = "bairro")]
    pub neighborhood: String,
    #[serde(rename = "logradouro")]
    #[sqlx(rename = "logradouro")]
    pub street: String,
    #[serde(rename = "numero")]
    #[sqlx(rename = "numero")]
    pub number: String,
    pub cep: String,
}

/// Address values without identity, as resolved from a CEP plus the house number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub state: String,
    pub city: String,
    pub neighborhood: String,
    pub street: String,
    pub number: String,
    pub cep: String,
}

impl From<&Address> for AddressRecord {
    fn from(address: &Address) -> Self {
        Self {
            state: address.state.clone(),
            city: address.city.clone(),
            neighborhood: address.neighborhood.clone(),
            street: address.street.clone(),
            number: address.number.clone(),
            cep: address.cep.clone(),
        }
    }
}
