pub mod normalize;
pub mod supply;

pub use normalize::normalize_word;
pub use supply::{CatalogWordSupply, SupplyError, WordGenerator, WordSupply};
