// One module per resource; routes are assembled in `app.rs`.
pub mod address;
pub mod client;
pub mod delivery;
pub mod extract;
pub mod order;
pub mod phone;
pub mod system;
pub mod utils;

pub use system::{health, root};
