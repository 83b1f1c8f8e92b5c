pub mod entity;
pub mod invariants;

pub use entity::{ChapterNumber, ChapterRecord};
pub use invariants::validate_chapter;
