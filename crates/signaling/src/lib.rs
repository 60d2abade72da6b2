//! klartext-signaling – Praesenz-, Nachrichten- und Anruf-Relay
//!
//! Dieser Crate implementiert den Relay-Kern von Klartext: er haelt die
//! Zuordnung von Benutzern zu lebenden Verbindungen, stellt Chat-
//! Nachrichten zu (gespeichert wird immer, zugestellt nur wenn der
//! Empfaenger erreichbar ist), leitet Tipp-Impulse und Anruf-
//! Signalisierung (SDP/ICE) punktgenau weiter und raeumt beim
//! Verbindungsende auf – inklusive haengender Anrufe.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (SignalingServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |
//!     v
//! EventDispatcher
//!     |
//!     +-- presence_handler  (user-online, Offline-Aufraeumen)
//!     +-- chat_handler      (send-message: speichern, dann zustellen)
//!     +-- typing_handler    (typing-start/-stop, verlustfrei egal)
//!     +-- call_handler      (offer/answer/ice-candidate/reject/end)
//!
//! PresenceRegistry  – Wer ist gerade erreichbar
//! EventBroadcaster  – Sende-Queues aller Verbindungen
//! CallTracker       – Serverseitige Anruf-Sitzungen fuer das Aufraeumen
//! ```

pub mod broadcast;
pub mod call_session;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod presence;
pub mod server_state;
pub mod tcp;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use call_session::CallTracker;
pub use connection::ClientConnection;
pub use dispatcher::{EventDispatcher, VerbindungsKontext};
pub use error::{SignalingError, SignalingResult};
pub use presence::PresenceRegistry;
pub use server_state::{RelayConfig, RelayState};
pub use tcp::SignalingServer;
