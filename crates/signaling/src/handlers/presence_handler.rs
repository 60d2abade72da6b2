//! Presence-Handler – Anmeldung einer Identitaet auf einer Verbindung
//!
//! Bindet die Verbindung an den Benutzer, pflegt das Online-Flag im
//! Verzeichnis und verteilt die Status-Aenderung an alle Verbindungen.

use klartext_core::types::{ConnectionId, UserId};
use klartext_db::{BenutzerVerzeichnis, NachrichtenSpeicher};
use klartext_protocol::event::{UserOnlineEvent, UserStatusChangeEvent};
use klartext_protocol::ServerEvent;
use std::sync::Arc;

use crate::server_state::RelayState;

/// Verarbeitet `user-online`: registriert die Identitaet der Verbindung
pub async fn handle_user_online<V, N>(
    ereignis: UserOnlineEvent,
    verbindung: ConnectionId,
    state: &Arc<RelayState<V, N>>,
) where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    let user_id = ereignis.user_id;

    if let Some(verdraengt) = state.presence.registrieren(user_id, verbindung) {
        tracing::info!(
            user_id = %user_id,
            verdraengt = %verdraengt,
            "Zweite Anmeldung derselben Identitaet – alte Zuordnung verdraengt"
        );
    }

    // Verzeichnis-Fehler betreffen nur das persistierte Flag, nicht die
    // Erreichbarkeit – loggen und weitermachen
    if let Err(e) = state.verzeichnis.online_setzen(user_id, true).await {
        tracing::warn!(user_id = %user_id, fehler = %e, "Online-Flag setzen fehlgeschlagen");
    }

    statuswechsel_verteilen(user_id, true, state);
}

/// Verteilt einen Online/Offline-Statuswechsel an alle Verbindungen
///
/// Fan-out, nicht gezielt: jede offene Kontaktliste muss die Aenderung
/// sehen, auch auf Verbindungen ohne angemeldete Identitaet.
pub fn statuswechsel_verteilen<V, N>(
    user_id: UserId,
    is_online: bool,
    state: &Arc<RelayState<V, N>>,
) where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    let empfaenger = state
        .broadcaster
        .an_alle_senden(ServerEvent::UserStatusChange(UserStatusChangeEvent {
            user_id,
            is_online,
        }));
    tracing::debug!(
        user_id = %user_id,
        is_online,
        empfaenger,
        "Statuswechsel verteilt"
    );
}
