//! Oeffentliche Typen fuer den Nachrichten-Dienst

use chrono::{DateTime, Utc};
use klartext_core::types::{MessageId, UserId};
use klartext_db::{NachrichtRecord, NachrichtenTyp};

/// Eine gespeicherte Chat-Nachricht (Domain-Typ, nicht DB-Record)
#[derive(Debug, Clone, PartialEq)]
pub struct Nachricht {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub message_type: NachrichtenTyp,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<NachrichtRecord> for Nachricht {
    fn from(record: NachrichtRecord) -> Self {
        Self {
            id: record.id,
            sender_id: record.sender_id,
            receiver_id: record.receiver_id,
            content: record.content,
            message_type: record.message_type,
            created_at: record.created_at,
            is_read: record.is_read,
            read_at: record.read_at,
        }
    }
}
