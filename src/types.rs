/// Shared types used across the codebase

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle of a delivery, stored as its integer code in `entregas.fk_id_status_entrega`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[repr(i32)]
pub enum DeliveryStatus {
    Calculated = 1,
    InTransit = 2,
    Delivered = 3,
    Canceled = 4,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Status de entrega inválido: '{0}'. Use calculado, em transito, entregue ou cancelado.")]
pub struct UnknownStatus(pub String);

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 4] = [
        DeliveryStatus::Calculated,
        DeliveryStatus::InTransit,
        DeliveryStatus::Delivered,
        DeliveryStatus::Canceled,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            DeliveryStatus::Calculated => "calculado",
            DeliveryStatus::InTransit => "em transito",
            DeliveryStatus::Delivered => "entregue",
            DeliveryStatus::Canceled => "cancelado",
        }
    }

    /// Calculated -> InTransit -> Delivered, and any non-terminal status -> Canceled
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        matches!(
            (self, next),
            (DeliveryStatus::Calculated, DeliveryStatus::InTransit)
                | (DeliveryStatus::InTransit, DeliveryStatus::Delivered)
                | (DeliveryStatus::Calculated, DeliveryStatus::Canceled)
                | (DeliveryStatus::InTransit, DeliveryStatus::Canceled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Canceled)
    }

    /// Only a canceled delivery leaves room for another one on the same order
    pub fn blocks_new_delivery(self) -> bool {
        self != DeliveryStatus::Canceled
    }

    pub fn allows_deletion(self) -> bool {
        self == DeliveryStatus::Canceled
    }
}

impl FromStr for DeliveryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.as_str() {
            "calculado" => Ok(DeliveryStatus::Calculated),
            "em transito" | "em trânsito" => Ok(DeliveryStatus::InTransit),
            "entregue" => Ok(DeliveryStatus::Delivered),
            "cancelado" => Ok(DeliveryStatus::Canceled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for DeliveryStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for DeliveryStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Delivery type referenced by `pedidos.fk_id_tipo_entrega`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryType {
    Normal = 1,
    Urgent = 2,
}

impl DeliveryType {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(DeliveryType::Normal),
            2 => Some(DeliveryType::Urgent),
            _ => None,
        }
    }
}
