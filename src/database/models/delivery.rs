use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::services::pricing::ChargeBreakdown;
use crate::types::DeliveryStatus;

/// Row of `entregas`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Delivery {
    #[serde(rename = "id_entrega")]
    #[sqlx(rename = "id_entrega")]
    pub id: i32,
    #[serde(rename = "id_pedido")]
    #[sqlx(rename = "fk_id_pedido")]
    pub order_id: i32,
    #[sqlx(rename = "fk_id_status_entrega")]
    pub status: DeliveryStatus,
    #[serde(rename = "valor_distancia")]
    #[sqlx(rename = "valor_distancia")]
    pub distance_value: Decimal,
    #[serde(rename = "valor_peso")]
    #[sqlx(rename = "valor_peso")]
    pub weight_value: Decimal,
    #[serde(rename = "valor_base")]
    #[sqlx(rename = "valor_base")]
    pub base_value: Decimal,
    #[serde(rename = "acrescimo")]
    #[sqlx(rename = "acrescimo")]
    pub surcharge: Decimal,
    #[serde(rename = "desconto")]
    #[sqlx(rename = "desconto")]
    pub discount: Decimal,
    #[serde(rename = "taxa_extra")]
    #[sqlx(rename = "taxa_extra")]
    pub extra_fee: Decimal,
    #[serde(rename = "valor_final")]
    #[sqlx(rename = "valor_final")]
    pub final_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDelivery {
    pub order_id: i32,
    pub status: DeliveryStatus,
    pub charges: ChargeBreakdown,
}
