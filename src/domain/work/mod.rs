pub mod entity;
pub mod invariants;

pub use entity::{DisplayPolicy, SortDirection, SortKey, Work};
pub use invariants::validate_work;
