//! Fehlertypen fuer den Relay-Kern

use thiserror::Error;

/// Fehlertyp fuer den Relay-Kern
///
/// Nichts hiervon ist fatal fuer den Prozess: Fehler einer Verbindung
/// betreffen nur diese Verbindung.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Protokollfehler (ungueltiges Frame)
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    /// Interner Fehler
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl SignalingError {
    /// Erstellt einen Protokollfehler
    pub fn protokoll(msg: impl Into<String>) -> Self {
        Self::Protokoll(msg.into())
    }

    /// Erstellt einen internen Fehler
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

/// Result-Typ fuer den Relay-Kern
pub type SignalingResult<T> = Result<T, SignalingError>;
