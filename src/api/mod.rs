pub mod clients;
pub mod polling;
pub mod traits;
pub mod types;
