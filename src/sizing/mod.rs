pub mod engine;
pub mod types;

pub use engine::{decide, reserve_change_permille};
pub use types::SizingConfig;
