//! klartext-protocol – Ereignis-Definitionen und Wire-Format
//!
//! Dieses Crate definiert die Ereignisflaeche der persistenten
//! Verbindung zwischen Client und Relay sowie das Frame-Format auf
//! dem Draht.
//!
//! ## Design
//! - Eingehend (`ClientEvent`) und ausgehend (`ServerEvent`) sind
//!   getrennte Tagged Enums: das Protokoll ist asymmetrisch, ein
//!   Client kann keine Server-Ereignisse einschleusen.
//! - JSON-Serialisierung via serde; Feldnamen in camelCase fuer
//!   Web-Clients.
//! - SDP- und ICE-Payloads bleiben opak (`serde_json::Value`): der
//!   Relay leitet sie nur weiter, er inspiziert sie nie.

pub mod event;
pub mod wire;

pub use event::{ClientEvent, MessageInfo, ServerEvent};
pub use wire::{ClientCodec, FrameCodec, ServerCodec};
