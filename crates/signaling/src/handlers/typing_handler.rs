//! Typing-Handler – Fluechtige Tipp-Impulse weiterleiten
//!
//! Keine Persistenz, keine Queue, kein Retry: ein verworfener
//! Tipp-Impuls ist folgenlos und darf anderen Verkehr nie blockieren.
//! Die Ratenbegrenzung (2-Sekunden-Debounce) liegt beim Client.

use klartext_db::{BenutzerVerzeichnis, NachrichtenSpeicher};
use klartext_protocol::event::{TypingEvent, UserTypingEvent};
use klartext_protocol::ServerEvent;
use std::sync::Arc;

use crate::server_state::RelayState;

/// Verarbeitet `typing-start` (`tippt` = true) bzw. `typing-stop`
pub async fn handle_typing<V, N>(
    ereignis: TypingEvent,
    tippt: bool,
    state: &Arc<RelayState<V, N>>,
) where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    match state.presence.nachschlagen(&ereignis.receiver_id) {
        Some(ziel) => {
            state.broadcaster.an_verbindung_senden(
                &ziel,
                ServerEvent::UserTyping(UserTypingEvent {
                    user_id: ereignis.sender_id,
                    is_typing: tippt,
                }),
            );
        }
        None => {
            tracing::trace!(
                empfaenger = %ereignis.receiver_id,
                "Tipp-Impuls an Offline-Empfaenger verworfen"
            );
        }
    }
}
