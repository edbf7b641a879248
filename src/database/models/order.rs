use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Row of `pedidos`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Order {
    #[serde(rename = "id_pedido")]
    #[sqlx(rename = "id_pedido")]
    pub id: i32,
    #[serde(rename = "id_cliente")]
    #[sqlx(rename = "fk_id_cliente")]
    pub client_id: i32,
    #[serde(rename = "id_tipo_entrega")]
    #[sqlx(rename = "fk_id_tipo_entrega")]
    pub delivery_type_id: i32,
    #[serde(rename = "data_pedido")]
    #[sqlx(rename = "data_pedido")]
    pub order_date: NaiveDate,
    #[serde(rename = "distancia")]
    #[sqlx(rename = "distancia")]
    pub distance: Decimal,
    #[serde(rename = "peso_carga")]
    #[sqlx(rename = "peso_carga")]
    pub cargo_weight: Decimal,
    #[serde(rename = "valor_base_kg")]
    #[sqlx(rename = "valor_base_kg")]
    pub rate_per_kg: Decimal,
    #[serde(rename = "valor_base_km")]
    #[sqlx(rename = "valor_base_km")]
    pub rate_per_km: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub client_id: i32,
    pub delivery_type_id: i32,
    pub order_date: NaiveDate,
    pub measures: OrderMeasures,
}

/// The editable part of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderMeasures {
    pub distance: Decimal,
    pub cargo_weight: Decimal,
    pub rate_per_kg: Decimal,
    pub rate_per_km: Decimal,
}

impl From<&Order> for OrderMeasures {
    fn from(order: &Order) -> Self {
        Self {
            distance: order.distance,
            cargo_weight: order.cargo_weight,
            rate_per_kg: order.rate_per_kg,
            rate_per_km: order.rate_per_km,
        }
    }
}
