pub mod entity;

pub use entity::{GroupPriorityEntry, MirrorPriorityEntry, PriorityTable};
