//! Field rules shared by the request handlers.
//!
//! Every rule returns the normalized value that gets stored (digits only for
//! CPF, phone and CEP; lower-cased e-mail) or a [`ValidationError`] naming the
//! offending field.

use chrono::{DateTime, Datelike, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;

/// Clients must be adults to be registered
pub const MINIMUM_AGE: i32 = 18;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_HOUSE_NUMBER_LEN: usize = 10;
pub const PHONE_DIGITS: usize = 11;
pub const CEP_DIGITS: usize = 8;
pub const MAX_CITY_LEN: usize = 100;
pub const MAX_NEIGHBORHOOD_LEN: usize = 100;
pub const MAX_STREET_LEN: usize = 150;
/// Order measures and rates stay below 10^8 (eight integer digits)
pub const MEASURE_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);
/// Decimal places kept for distance and rates
pub const MEASURE_SCALE: u32 = 2;
/// Decimal places kept for cargo weight
pub const WEIGHT_SCALE: u32 = 3;
const CPF_DIGITS: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn digits_only(raw: &str, separators: &[char]) -> Option<String> {
    let stripped: String = raw
        .trim()
        .chars()
        .filter(|c| !separators.contains(c))
        .collect();
    if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
        Some(stripped)
    } else {
        None
    }
}

pub fn name(raw: &str) -> ValidationResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new("nome", "Nome é obrigatório."));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::new(
            "nome",
            format!("Nome deve ter no máximo {} caracteres.", MAX_NAME_LEN),
        ));
    }
    if !value.chars().any(char::is_alphabetic) {
        return Err(ValidationError::new("nome", "Nome inválido."));
    }
    Ok(value.to_string())
}

pub fn cpf(raw: &str) -> ValidationResult<String> {
    let invalid = || ValidationError::new("cpf", "CPF inválido.");
    let digits = digits_only(raw, &['.', '-', ' ']).ok_or_else(invalid)?;
    if digits.len() != CPF_DIGITS {
        return Err(invalid());
    }

    let numbers: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if numbers.iter().all(|&d| d == numbers[0]) {
        return Err(invalid());
    }

    let check_digit = |len: usize| -> u32 {
        let weight_start = len as u32 + 1;
        let sum: u32 = numbers[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (weight_start - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 { 0 } else { rest }
    };

    if check_digit(9) != numbers[9] || check_digit(10) != numbers[10] {
        return Err(invalid());
    }
    Ok(digits)
}

pub fn email(raw: &str) -> ValidationResult<String> {
    let invalid = || ValidationError::new("email", "Email inválido.");
    let value = raw.trim().to_lowercase();
    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    Ok(value)
}

/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY` and RFC 3339 timestamps (date part kept)
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

pub fn birth_date(raw: &str, today: NaiveDate) -> ValidationResult<NaiveDate> {
    let date = parse_date(raw)
        .ok_or_else(|| ValidationError::new("data_nascimento", "Data de nascimento inválida."))?;
    if date > today {
        return Err(ValidationError::new(
            "data_nascimento",
            "Data de nascimento não pode estar no futuro.",
        ));
    }
    Ok(date)
}

pub fn order_date(raw: &str) -> ValidationResult<NaiveDate> {
    parse_date(raw).ok_or_else(|| ValidationError::new("data_pedido", "Data do pedido inválida."))
}

/// Completed years between `birth` and `today`
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

pub fn adult(birth: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if age_on(birth, today) < MINIMUM_AGE {
        return Err(ValidationError::new(
            "data_nascimento",
            format!("Cliente deve ter {} anos ou mais.", MINIMUM_AGE),
        ));
    }
    Ok(())
}

pub fn phone(raw: &str) -> ValidationResult<String> {
    let digits = digits_only(raw, &['(', ')', '-', '+', ' '])
        .filter(|d| d.len() == PHONE_DIGITS)
        .ok_or_else(|| {
            ValidationError::new(
                "telefone",
                format!("Telefone inválido. Informe DDD e número com {} dígitos.", PHONE_DIGITS),
            )
        })?;
    Ok(digits)
}

pub fn cep(raw: &str) -> ValidationResult<String> {
    let digits = digits_only(raw, &['-', '.', ' '])
        .filter(|d| d.len() == CEP_DIGITS)
        .ok_or_else(|| ValidationError::new("cep", "CEP inválido. Informe 8 dígitos."))?;
    Ok(digits)
}

pub fn house_number(raw: &str) -> ValidationResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new("numero", "Número é obrigatório."));
    }
    if value.chars().count() > MAX_HOUSE_NUMBER_LEN {
        return Err(ValidationError::new(
            "numero",
            format!("Número deve ter no máximo {} caracteres.", MAX_HOUSE_NUMBER_LEN),
        ));
    }
    Ok(value.to_string())
}

/// Two-letter state abbreviation, upper-cased
pub fn state(raw: &str) -> ValidationResult<String> {
    let value = raw.trim().to_uppercase();
    if value.len() != 2 || !value.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "estado",
            "Estado inválido. Informe a sigla com 2 letras.",
        ));
    }
    Ok(value)
}

/// Free-text address part (city, neighborhood, street), trimmed
pub fn address_text(field: &'static str, raw: &str, max_len: usize) -> ValidationResult<String> {
    let value = raw.trim();
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("O campo {} deve ter no máximo {} caracteres.", field, max_len),
        ));
    }
    Ok(value.to_string())
}

pub fn positive_decimal(field: &'static str, value: Decimal) -> ValidationResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::new(
            field,
            format!("O campo {} deve ser maior que zero.", field),
        ));
    }
    Ok(value)
}

/// Positive order measure that fits its column without rounding
pub fn measure(field: &'static str, value: Decimal, max_scale: u32) -> ValidationResult<Decimal> {
    let value = positive_decimal(field, value)?;
    if value >= MEASURE_LIMIT {
        return Err(ValidationError::new(
            field,
            format!("O campo {} deve ser menor que {}.", field, MEASURE_LIMIT),
        ));
    }
    if value.normalize().scale() > max_scale {
        return Err(ValidationError::new(
            field,
            format!("O campo {} aceita no máximo {} casas decimais.", field, max_scale),
        ));
    }
    Ok(value)
}

/// Collects the names of missing required fields
#[derive(Debug, Default)]
pub struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check<T>(&mut self, field: &'static str, value: &Option<T>) -> &mut Self {
        if value.is_none() {
            self.missing.push(field);
        }
        self
    }

    pub fn text(&mut self, field: &'static str, value: &Option<String>) -> &mut Self {
        if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
            self.missing.push(field);
        }
        self
    }

    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }
}
