use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::PricingConfig;
use crate::types::DeliveryType;

/// Inputs taken from the order a delivery is created for
#[derive(Debug, Clone, Copy)]
pub struct ChargeInput {
    pub delivery_type: DeliveryType,
    pub distance_km: Decimal,
    pub weight_kg: Decimal,
    pub rate_per_km: Decimal,
    pub rate_per_kg: Decimal,
}

/// Charge breakdown stored with every delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeBreakdown {
    pub distance_value: Decimal,
    pub weight_value: Decimal,
    pub base_value: Decimal,
    pub surcharge: Decimal,
    pub discount: Decimal,
    pub extra_fee: Decimal,
    pub final_value: Decimal,
}

/// Charge columns hold 18 integer digits
pub const CHARGE_LIMIT: Decimal = Decimal::from_parts(2_808_348_672, 232_830_643, 0, false, 0);

impl ChargeBreakdown {
    /// Every component fits the charge columns
    pub fn fits(&self) -> bool {
        [
            self.distance_value,
            self.weight_value,
            self.base_value,
            self.surcharge,
            self.discount,
            self.extra_fee,
            self.final_value,
        ]
        .iter()
        .all(|v| v.abs() < CHARGE_LIMIT)
    }
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn calculate(input: &ChargeInput, rules: &PricingConfig) -> ChargeBreakdown {
    let distance_value = money(input.distance_km * input.rate_per_km);
    let weight_value = money(input.weight_kg * input.rate_per_kg);
    let base_value = distance_value + weight_value;

    let surcharge = match input.delivery_type {
        DeliveryType::Urgent => money(base_value * rules.urgent_surcharge_rate),
        DeliveryType::Normal => Decimal::ZERO,
    };

    let subtotal = base_value + surcharge;
    let discount = if subtotal > rules.discount_threshold {
        money(subtotal * rules.discount_rate)
    } else {
        Decimal::ZERO
    };

    let extra_fee = if input.weight_kg > rules.heavy_cargo_threshold_kg {
        money(rules.heavy_cargo_fee)
    } else {
        Decimal::ZERO
    };

    ChargeBreakdown {
        distance_value,
        weight_value,
        base_value,
        surcharge,
        discount,
        extra_fee,
        final_value: subtotal - discount + extra_fee,
    }
}
