pub mod cep;
pub mod pricing;

pub use cep::{CepError, CepLookup, PostalAddress, ViaCepClient};
pub use pricing::{ChargeBreakdown, ChargeInput};
