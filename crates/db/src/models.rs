//! Datensatz-Typen fuer Benutzer-Verzeichnis und Nachrichten-Speicher

use chrono::{DateTime, Utc};
use klartext_core::types::{MessageId, UserId};

/// Datensatz eines Benutzers im Verzeichnis
///
/// Identitaets-Ausgabe (Registrierung, Tokens) liegt ausserhalb des
/// Relays; hier stehen nur die Felder die der Relay liest oder pflegt.
#[derive(Debug, Clone, PartialEq)]
pub struct BenutzerRecord {
    pub id: UserId,
    /// Anzeigename (wird u.a. im Offer-Ereignis mitgefuehrt)
    pub name: String,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Anlegen eines Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub name: &'a str,
}

/// Nachrichtentyp: "text" oder ein beliebiger anderer Tag
///
/// Der Typ ist bewusst offen – ein unbekannter Tag wird unveraendert
/// gespeichert und weitergereicht, nie abgelehnt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NachrichtenTyp {
    Text,
    Sonstig(String),
}

impl NachrichtenTyp {
    /// Gibt die Draht-/Speicherform zurueck
    pub fn als_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Sonstig(tag) => tag,
        }
    }

    /// Parst die Speicherform
    pub fn aus_str(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            andere => Self::Sonstig(andere.to_string()),
        }
    }

    /// Parst das optionale Draht-Feld; fehlend bedeutet "text"
    pub fn aus_wire(s: Option<&str>) -> Self {
        s.map(Self::aus_str).unwrap_or(Self::Text)
    }
}

impl Default for NachrichtenTyp {
    fn default() -> Self {
        Self::Text
    }
}

impl std::fmt::Display for NachrichtenTyp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

/// Gespeicherte Chat-Nachricht
///
/// Unveraenderlich bis auf das Gelesen-Flag samt Zeitstempel, das die
/// aussenliegende REST-Schicht gesammelt setzt.
#[derive(Debug, Clone, PartialEq)]
pub struct NachrichtRecord {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub message_type: NachrichtenTyp,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

/// Daten zum Anhaengen einer Nachricht
#[derive(Debug, Clone)]
pub struct NeueNachricht<'a> {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: &'a str,
    pub message_type: NachrichtenTyp,
}
