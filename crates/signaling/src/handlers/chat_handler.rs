//! Chat-Handler – Nachrichten speichern und zustellen
//!
//! Speichern kommt vor Zustellen: erst wenn der Nachrichten-Dienst den
//! autoritativen Datensatz zurueckgibt, wird zugestellt. Der Absender
//! bekommt immer ein `message-sent` mit der gespeicherten Form
//! (Server-ID und Zeitstempel), nie sein lokales Provisorium zurueck.

use klartext_chat::Nachricht;
use klartext_core::types::ConnectionId;
use klartext_db::{BenutzerVerzeichnis, NachrichtenSpeicher};
use klartext_protocol::event::{MessageErrorEvent, SendMessageEvent};
use klartext_protocol::{MessageInfo, ServerEvent};
use std::sync::Arc;

use crate::server_state::RelayState;

/// Verarbeitet `send-message`
pub async fn handle_send_message<V, N>(
    ereignis: SendMessageEvent,
    verbindung: ConnectionId,
    state: &Arc<RelayState<V, N>>,
) where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    let ergebnis = state
        .nachrichten
        .nachricht_senden(
            ereignis.sender_id,
            ereignis.receiver_id,
            &ereignis.content,
            ereignis.message_type.as_deref(),
        )
        .await;

    match ergebnis {
        Ok(nachricht) => {
            let info = nachricht_zu_info(&nachricht);

            // Zustellen nur wenn der Empfaenger erreichbar ist; die
            // Nachricht ist bereits gespeichert und geht nicht verloren
            if let Some(ziel) = state.presence.nachschlagen(&nachricht.receiver_id) {
                state
                    .broadcaster
                    .an_verbindung_senden(&ziel, ServerEvent::ReceiveMessage(info.clone()));
            } else {
                tracing::debug!(
                    empfaenger = %nachricht.receiver_id,
                    nachricht = %nachricht.id,
                    "Empfaenger offline – Nachricht nur gespeichert"
                );
            }

            // Bestaetigung an den Absender (immer)
            state
                .broadcaster
                .an_verbindung_senden(&verbindung, ServerEvent::MessageSent(info));

            tracing::debug!(
                sender = %nachricht.sender_id,
                empfaenger = %nachricht.receiver_id,
                nachricht = %nachricht.id,
                "Nachricht gesendet"
            );
        }
        Err(e) => {
            tracing::warn!(
                sender = %ereignis.sender_id,
                fehler = %e,
                "Nachricht senden fehlgeschlagen"
            );
            state.broadcaster.an_verbindung_senden(
                &verbindung,
                ServerEvent::MessageError(MessageErrorEvent {
                    error: e.to_string(),
                }),
            );
        }
    }
}

/// Konvertiert den Domain-Typ in die Draht-Form
pub fn nachricht_zu_info(nachricht: &Nachricht) -> MessageInfo {
    MessageInfo {
        id: nachricht.id,
        sender_id: nachricht.sender_id,
        receiver_id: nachricht.receiver_id,
        content: nachricht.content.clone(),
        message_type: nachricht.message_type.als_str().to_string(),
        created_at: nachricht.created_at.to_rfc3339(),
        is_read: nachricht.is_read,
        read_at: nachricht.read_at.map(|dt| dt.to_rfc3339()),
    }
}
