//! klartext-core – Gemeinsame Typen
//!
//! Dieses Crate definiert die Identifikationstypen die alle anderen
//! Klartext-Crates teilen. Es haelt bewusst keine Logik: Nur Typen,
//! damit Abhaengigkeitszyklen zwischen den Crates ausgeschlossen sind.

pub mod types;

pub use types::{ConnectionId, MessageId, UserId};
