// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Implementation details that support the domain without being part of
// it: here, the on-device chapter archive boundary.
//
// RULES:
// - Infrastructure serves the domain, never dictates its behavior
// - Everything in here is replaceable behind its trait

pub mod offline_store;

pub use offline_store::{LocalArchive, OfflineStore};
