//! SQLite-Implementierung der Repository-Traits

mod messages;
mod pool;
mod users;

pub use pool::SqliteDb;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Formatiert einen Zeitstempel fuer die TEXT-Spalte
///
/// Feste 6 Nachkommastellen, damit die lexikografische Ordnung der
/// Spalte der chronologischen entspricht.
pub(crate) fn zeit_als_text(zeit: &DateTime<Utc>) -> String {
    zeit.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Parst einen Zeitstempel aus der TEXT-Spalte
pub(crate) fn zeit_aus_text(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::ungueltige_daten(format!("Zeitstempel '{s}': {e}")))
}

/// Parst eine UUID aus einer TEXT-Spalte
pub(crate) fn uuid_aus_text(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::ungueltige_daten(format!("UUID '{s}': {e}")))
}
