//! klartext-chat – Nachrichten-Dienst
//!
//! Validiert eingehende Chat-Nachrichten und haengt sie dauerhaft an
//! den Nachrichten-Speicher an. Die Zustellung an lebende Verbindungen
//! uebernimmt der Relay-Kern; dieser Dienst garantiert nur, dass eine
//! Nachricht gespeichert ist bevor irgendjemand sie zu sehen bekommt.

pub mod error;
pub mod service;
pub mod types;

pub use error::{ChatError, ChatResult};
pub use service::MessageService;
pub use types::Nachricht;
