//! Schema module - Ingredient, potion and configuration types.

mod app;
mod config;
mod evolution;
mod ingredient;
mod potion;

pub use app::*;
pub use config::*;
pub use evolution::*;
pub use ingredient::*;
pub use potion::*;
