use serde::Serialize;
use sqlx::FromRow;

/// Row of `telefones`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Phone {
    #[serde(rename = "id_telefone")]
    #[sqlx(rename = "id_telefone")]
    pub id: i32,
    #[serde(rename = "id_cliente")]
    #[sqlx(rename = "fk_id_cliente")]
    pub client_id: i32,
    #[serde(rename = "telefone")]
    #[sqlx(rename = "telefone")]
    pub number: String,
}
