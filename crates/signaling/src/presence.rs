//! Presence-Registry – Wer ist gerade ueber welche Verbindung erreichbar
//!
//! Die einzige Quelle der Wahrheit fuer "ist dieser Benutzer jetzt
//! erreichbar". Lebt ausschliesslich im Prozessspeicher; nach einem
//! Neustart ist niemand online bis er sich neu angemeldet hat.
//!
//! ## Invarianten
//! - Hoechstens ein Eintrag pro Benutzer: eine zweite Anmeldung
//!   derselben Identitaet verdraengt die alte Zuordnung
//!   (last-connect-wins). Die verwaiste Verbindung schliesst die
//!   Transportschicht irgendwann selbst.
//! - Ein Eintrag ist immer ein vollstaendiges Paar {Benutzer,
//!   Verbindung}; das atomare DashMap-Insert schliesst halb
//!   aktualisierte Eintraege aus.
//! - `abmelden` entfernt den Eintrag nur wenn er noch auf die
//!   abmeldende Verbindung zeigt. Der spaete Disconnect einer
//!   verdraengten Verbindung darf den Nachfolger nicht abmelden.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use klartext_core::types::{ConnectionId, UserId};
use std::sync::Arc;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Presence-Events
// ---------------------------------------------------------------------------

/// Events die die PresenceRegistry versendet
#[derive(Debug, Clone)]
pub enum PresenceEvent {
    /// Ein Benutzer ist erreichbar geworden
    BenutzerOnline { user_id: UserId },
    /// Ein Benutzer ist nicht mehr erreichbar
    BenutzerOffline {
        user_id: UserId,
        zuletzt_gesehen: DateTime<Utc>,
    },
}

// ---------------------------------------------------------------------------
// PresenceRegistry
// ---------------------------------------------------------------------------

/// Groesse des Broadcast-Kanals fuer Presence-Events
const EVENT_KANAL_GROESSE: usize = 256;

/// Verwaltet die Zuordnung von Benutzern zu lebenden Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone der Registry teilt den inneren
/// Zustand.
#[derive(Clone)]
pub struct PresenceRegistry {
    inner: Arc<PresenceRegistryInner>,
}

struct PresenceRegistryInner {
    /// Eintraege, indiziert nach UserId (Quelle der Wahrheit)
    eintraege: DashMap<UserId, ConnectionId>,
    /// Umkehr-Index fuer O(1)-Abmeldung nach Verbindung
    nach_verbindung: DashMap<ConnectionId, UserId>,
    /// Broadcast-Sender fuer Presence-Events
    event_tx: broadcast::Sender<PresenceEvent>,
}

impl PresenceRegistry {
    /// Erstellt eine neue PresenceRegistry
    pub fn neu() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_KANAL_GROESSE);
        Self {
            inner: Arc::new(PresenceRegistryInner {
                eintraege: DashMap::new(),
                nach_verbindung: DashMap::new(),
                event_tx,
            }),
        }
    }

    /// Registriert einen Benutzer unter seiner Verbindung
    ///
    /// Verdraengt eine bestehende Zuordnung derselben Identitaet
    /// (last-connect-wins) und gibt die verdraengte Verbindung zurueck.
    pub fn registrieren(
        &self,
        user_id: UserId,
        verbindung: ConnectionId,
    ) -> Option<ConnectionId> {
        let verdraengt = self.inner.eintraege.insert(user_id, verbindung);
        if let Some(alte) = verdraengt {
            if alte != verbindung {
                self.inner.nach_verbindung.remove(&alte);
            }
        }
        self.inner.nach_verbindung.insert(verbindung, user_id);

        tracing::info!(user_id = %user_id, verbindung = %verbindung, "Benutzer online");
        let _ = self
            .inner
            .event_tx
            .send(PresenceEvent::BenutzerOnline { user_id });

        verdraengt.filter(|alte| *alte != verbindung)
    }

    /// Meldet eine Verbindung ab
    ///
    /// Gibt Benutzer und Last-Seen-Zeitpunkt zurueck wenn ein Eintrag
    /// entfernt wurde. Idempotent: eine doppelt gefeuerte Trennung und
    /// der spaete Disconnect einer verdraengten Verbindung liefern
    /// `None` und loesen kein Offline-Event aus.
    pub fn abmelden(&self, verbindung: ConnectionId) -> Option<(UserId, DateTime<Utc>)> {
        let (_, user_id) = self.inner.nach_verbindung.remove(&verbindung)?;

        // Nur entfernen wenn der Eintrag noch auf diese Verbindung zeigt
        let entfernt = self
            .inner
            .eintraege
            .remove_if(&user_id, |_, aktuelle| *aktuelle == verbindung)
            .is_some();
        if !entfernt {
            return None;
        }

        let zuletzt_gesehen = Utc::now();
        tracing::info!(user_id = %user_id, verbindung = %verbindung, "Benutzer offline");
        let _ = self.inner.event_tx.send(PresenceEvent::BenutzerOffline {
            user_id,
            zuletzt_gesehen,
        });

        Some((user_id, zuletzt_gesehen))
    }

    /// Schlaegt die Verbindung eines Benutzers nach
    ///
    /// Ein Miss ist kein Fehler: der Benutzer ist gerade nicht
    /// erreichbar.
    pub fn nachschlagen(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.inner.eintraege.get(user_id).map(|e| *e.value())
    }

    /// Prueft ob ein Benutzer erreichbar ist
    pub fn ist_online(&self, user_id: &UserId) -> bool {
        self.inner.eintraege.contains_key(user_id)
    }

    /// Gibt die Anzahl der erreichbaren Benutzer zurueck
    pub fn online_anzahl(&self) -> usize {
        self.inner.eintraege.len()
    }

    /// Gibt alle erreichbaren Benutzer zurueck
    pub fn alle_online(&self) -> Vec<UserId> {
        self.inner.eintraege.iter().map(|e| *e.key()).collect()
    }

    /// Abonniert Presence-Events
    pub fn events_abonnieren(&self) -> broadcast::Receiver<PresenceEvent> {
        self.inner.event_tx.subscribe()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
