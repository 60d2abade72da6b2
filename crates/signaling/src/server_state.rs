//! Gemeinsamer Relay-Zustand
//!
//! Haelt alle geteilten Dienste und Zustands-Manager als Arc-Referenzen,
//! die sicher zwischen tokio-Tasks geteilt werden koennen.

use klartext_chat::MessageService;
use klartext_db::{BenutzerVerzeichnis, NachrichtenSpeicher};
use std::sync::Arc;

use crate::broadcast::EventBroadcaster;
use crate::call_session::CallTracker;
use crate::presence::PresenceRegistry;

/// Konfiguration fuer den Relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale gleichzeitige Verbindungen
    pub max_verbindungen: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server_name: "Klartext Relay".to_string(),
            max_verbindungen: 512,
        }
    }
}

/// Gemeinsamer Relay-Zustand (thread-safe, Arc-geteilt)
///
/// `V` ist das Benutzer-Verzeichnis, `N` der Nachrichten-Speicher –
/// beide externe Kollaborateure hinter Traits, damit Tests eine
/// In-Memory-Datenbank einsetzen koennen.
pub struct RelayState<V, N>
where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    /// Relay-Konfiguration
    pub config: Arc<RelayConfig>,
    /// Benutzer-Verzeichnis (Online-Flag, Last-Seen)
    pub verzeichnis: Arc<V>,
    /// Nachrichten-Dienst (validieren + speichern)
    pub nachrichten: Arc<MessageService<N>>,
    /// Presence-Registry (wer ist erreichbar)
    pub presence: PresenceRegistry,
    /// Event-Broadcaster (Sende-Queues der Verbindungen)
    pub broadcaster: EventBroadcaster,
    /// Serverseitige Anruf-Sitzungen
    pub anrufe: CallTracker,
}

impl<V, N> RelayState<V, N>
where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    /// Erstellt einen neuen RelayState
    pub fn neu(
        config: RelayConfig,
        verzeichnis: Arc<V>,
        nachrichten: Arc<MessageService<N>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            verzeichnis,
            nachrichten,
            presence: PresenceRegistry::neu(),
            broadcaster: EventBroadcaster::neu(),
            anrufe: CallTracker::neu(),
        })
    }
}
