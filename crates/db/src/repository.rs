//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt den Relay-Kern von der konkreten
//! Datenbank-Implementierung. Die Traits liefern Send-Futures
//! (async-trait), damit Verbindungs-Tasks auf dem Multi-Thread-Runtime
//! laufen koennen – jede Verbindung wird parallel abgearbeitet, nicht
//! kooperativ auf einem einzelnen Thread.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use klartext_core::types::UserId;

use crate::error::DbResult;
use crate::models::{BenutzerRecord, NachrichtRecord, NeueNachricht, NeuerBenutzer};

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://klartext.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://klartext.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Benutzer-Verzeichnis: Datensatz-Lookup und Praesenz-Flags
///
/// Der Relay liest Benutzer nur und pflegt `is_online`/`last_seen`;
/// alles Weitere (Registrierung, Profile) gehoert der aussenliegenden
/// Schicht.
#[async_trait]
pub trait BenutzerVerzeichnis: Send + Sync {
    /// Legt einen neuen Benutzer an
    async fn erstellen(&self, daten: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Laedt einen Benutzer anhand seiner ID
    async fn laden(&self, id: UserId) -> DbResult<Option<BenutzerRecord>>;

    /// Setzt das Online-Flag eines Benutzers
    async fn online_setzen(&self, id: UserId, online: bool) -> DbResult<()>;

    /// Setzt den Last-Seen-Zeitstempel eines Benutzers
    async fn zuletzt_gesehen_setzen(&self, id: UserId, zeitpunkt: DateTime<Utc>) -> DbResult<()>;
}

/// Nachrichten-Speicher: Anhaengen und Verlauf eines Benutzerpaars
#[async_trait]
pub trait NachrichtenSpeicher: Send + Sync {
    /// Haengt eine Nachricht dauerhaft an und gibt den vollstaendigen
    /// Datensatz mit Server-vergebener ID und Zeitstempel zurueck
    async fn anhaengen(&self, daten: NeueNachricht<'_>) -> DbResult<NachrichtRecord>;

    /// Laedt den Verlauf zwischen zwei Benutzern (beide Richtungen),
    /// chronologisch aufsteigend
    async fn verlauf(&self, a: UserId, b: UserId) -> DbResult<Vec<NachrichtRecord>>;

    /// Markiert alle ungelesenen Nachrichten von `sender` an
    /// `empfaenger` als gelesen; gibt die Anzahl der Aenderungen zurueck
    async fn als_gelesen_markieren(&self, sender: UserId, empfaenger: UserId) -> DbResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_config_standard() {
        let cfg = DatabaseConfig::default();
        assert!(cfg.sqlite_wal);
        assert_eq!(cfg.max_verbindungen, 5);
        assert!(cfg.url.starts_with("sqlite://"));
    }
}
