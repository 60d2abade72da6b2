//! klartext-db – Benutzer-Verzeichnis und Nachrichten-Speicher
//!
//! Dieses Crate stellt die beiden externen Kollaborateure des Relays
//! hinter Repository-Traits bereit: das Benutzer-Verzeichnis
//! (Online-Flag, Last-Seen, Datensatz-Lookup) und den Nachrichten-
//! Speicher (Anhaengen, Verlauf, Gelesen-Markierung). Die mitgelieferte
//! Implementierung laeuft auf SQLite; die Traits erlauben ein anderes
//! Backend ohne Aenderung am Relay-Kern.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::{DbError, DbResult};
pub use models::{BenutzerRecord, NachrichtRecord, NachrichtenTyp, NeueNachricht, NeuerBenutzer};
pub use repository::{BenutzerVerzeichnis, DatabaseConfig, NachrichtenSpeicher};
pub use sqlite::SqliteDb;
