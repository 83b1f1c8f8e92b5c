// src/graph/mod.rs
//
// Entity Graph module
//
// RULES:
// - The graph holds state and referential integrity, nothing else
// - Reconciliation and unification read it; services mutate it
// - No persistence, no events, no I/O here

pub mod library_graph;

pub use library_graph::{IngestOutcome, LibraryGraph};
