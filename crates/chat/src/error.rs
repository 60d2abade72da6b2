//! Fehlertypen fuer den Nachrichten-Dienst

use klartext_db::DbError;
use thiserror::Error;

/// Fehlertyp fuer den Nachrichten-Dienst
#[derive(Debug, Error)]
pub enum ChatError {
    /// Eingabe-Validierung fehlgeschlagen (fehlender Empfaenger,
    /// leerer Inhalt, zu lange Nachricht)
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    /// Der Speicher-Vorgang ist fehlgeschlagen
    #[error("Speicherfehler: {0}")]
    Speicher(#[from] DbError),
}

/// Result-Typ fuer den Nachrichten-Dienst
pub type ChatResult<T> = Result<T, ChatError>;
