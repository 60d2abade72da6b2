//! SQLite-Implementierung des BenutzerVerzeichnis

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use klartext_core::types::UserId;
use sqlx::Row;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{BenutzerRecord, NeuerBenutzer};
use crate::repository::BenutzerVerzeichnis;
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{uuid_aus_text, zeit_als_text, zeit_aus_text};

#[async_trait]
impl BenutzerVerzeichnis for SqliteDb {
    async fn erstellen(&self, daten: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let id = Uuid::new_v4();
        // Auf die Genauigkeit der TEXT-Spalte kuerzen, damit der
        // zurueckgegebene Datensatz dem spaeter geladenen gleicht
        let now = Utc::now().trunc_subsecs(6);

        sqlx::query(
            "INSERT INTO users (id, name, is_online, last_seen, created_at)
             VALUES (?, ?, 0, NULL, ?)",
        )
        .bind(id.to_string())
        .bind(daten.name)
        .bind(zeit_als_text(&now))
        .execute(&self.pool)
        .await?;

        Ok(BenutzerRecord {
            id: UserId(id),
            name: daten.name.to_string(),
            is_online: false,
            last_seen: None,
            created_at: now,
        })
    }

    async fn laden(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query(
            "SELECT id, name, is_online, last_seen, created_at
             FROM users WHERE id = ?",
        )
        .bind(id.inner().to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_zu_benutzer(&r)).transpose()
    }

    async fn online_setzen(&self, id: UserId, online: bool) -> DbResult<()> {
        let affected = sqlx::query("UPDATE users SET is_online = ? WHERE id = ?")
            .bind(online as i32)
            .bind(id.inner().to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Benutzer {id}")));
        }
        Ok(())
    }

    async fn zuletzt_gesehen_setzen(
        &self,
        id: UserId,
        zeitpunkt: DateTime<Utc>,
    ) -> DbResult<()> {
        let affected = sqlx::query("UPDATE users SET last_seen = ? WHERE id = ?")
            .bind(zeit_als_text(&zeitpunkt))
            .bind(id.inner().to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Benutzer {id}")));
        }
        Ok(())
    }
}

fn row_zu_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<BenutzerRecord> {
    let id_str: String = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let is_online: i32 = row.try_get("is_online")?;
    let last_seen_str: Option<String> = row.try_get("last_seen")?;
    let created_str: String = row.try_get("created_at")?;

    Ok(BenutzerRecord {
        id: UserId(uuid_aus_text(&id_str)?),
        name,
        is_online: is_online != 0,
        last_seen: last_seen_str.as_deref().map(zeit_aus_text).transpose()?,
        created_at: zeit_aus_text(&created_str)?,
    })
}
