pub mod address;
pub mod client;
pub mod delivery;
pub mod order;
pub mod phone;

pub use address::{Address, AddressRecord};
pub use client::{Client, ClientDetail, ClientRecord};
pub use delivery::{Delivery, NewDelivery};
pub use order::{NewOrder, Order, OrderMeasures};
pub use phone::Phone;

use crate::types::DeliveryStatus;

/// LIMIT/OFFSET window for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Clamp client-supplied paging to the configured bounds
    pub fn new(limit: Option<i64>, offset: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit.max(1)),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub order_id: Option<i32>,
    pub client_id: Option<i32>,
    pub delivery_type_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryFilter {
    pub delivery_id: Option<i32>,
    pub order_id: Option<i32>,
    pub status: Option<DeliveryStatus>,
}
