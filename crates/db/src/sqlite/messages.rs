//! SQLite-Implementierung des NachrichtenSpeicher

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use klartext_core::types::{MessageId, UserId};
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{NachrichtRecord, NachrichtenTyp, NeueNachricht};
use crate::repository::NachrichtenSpeicher;
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{uuid_aus_text, zeit_als_text, zeit_aus_text};

#[async_trait]
impl NachrichtenSpeicher for SqliteDb {
    async fn anhaengen(&self, daten: NeueNachricht<'_>) -> DbResult<NachrichtRecord> {
        let id = Uuid::new_v4();
        // Auf die Genauigkeit der TEXT-Spalte kuerzen, damit der
        // zurueckgegebene Datensatz dem spaeter geladenen gleicht
        let now = Utc::now().trunc_subsecs(6);

        sqlx::query(
            "INSERT INTO messages
             (id, sender_id, receiver_id, content, message_type, created_at, is_read, read_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, NULL)",
        )
        .bind(id.to_string())
        .bind(daten.sender_id.inner().to_string())
        .bind(daten.receiver_id.inner().to_string())
        .bind(daten.content)
        .bind(daten.message_type.als_str())
        .bind(zeit_als_text(&now))
        .execute(&self.pool)
        .await?;

        Ok(NachrichtRecord {
            id: MessageId(id),
            sender_id: daten.sender_id,
            receiver_id: daten.receiver_id,
            content: daten.content.to_string(),
            message_type: daten.message_type,
            created_at: now,
            is_read: false,
            read_at: None,
        })
    }

    async fn verlauf(&self, a: UserId, b: UserId) -> DbResult<Vec<NachrichtRecord>> {
        let a_str = a.inner().to_string();
        let b_str = b.inner().to_string();

        let rows = sqlx::query(
            "SELECT id, sender_id, receiver_id, content, message_type,
                    created_at, is_read, read_at
             FROM messages
             WHERE (sender_id = ? AND receiver_id = ?)
                OR (sender_id = ? AND receiver_id = ?)
             ORDER BY created_at ASC",
        )
        .bind(&a_str)
        .bind(&b_str)
        .bind(&b_str)
        .bind(&a_str)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_zu_nachricht).collect()
    }

    async fn als_gelesen_markieren(&self, sender: UserId, empfaenger: UserId) -> DbResult<u64> {
        let now = Utc::now();

        let affected = sqlx::query(
            "UPDATE messages SET is_read = 1, read_at = ?
             WHERE sender_id = ? AND receiver_id = ? AND is_read = 0",
        )
        .bind(zeit_als_text(&now))
        .bind(sender.inner().to_string())
        .bind(empfaenger.inner().to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected)
    }
}

fn row_zu_nachricht(row: &sqlx::sqlite::SqliteRow) -> DbResult<NachrichtRecord> {
    let id_str: String = row.try_get("id")?;
    let sender_str: String = row.try_get("sender_id")?;
    let receiver_str: String = row.try_get("receiver_id")?;
    let content: String = row.try_get("content")?;
    let typ_str: String = row.try_get("message_type")?;
    let created_str: String = row.try_get("created_at")?;
    let is_read: i32 = row.try_get("is_read")?;
    let read_at_str: Option<String> = row.try_get("read_at")?;

    Ok(NachrichtRecord {
        id: MessageId(uuid_aus_text(&id_str)?),
        sender_id: UserId(uuid_aus_text(&sender_str)?),
        receiver_id: UserId(uuid_aus_text(&receiver_str)?),
        content,
        message_type: NachrichtenTyp::aus_str(&typ_str),
        created_at: zeit_aus_text(&created_str)?,
        is_read: is_read != 0,
        read_at: read_at_str.as_deref().map(zeit_aus_text).transpose()?,
    })
}
