//! Event-Dispatcher – Routet ClientEvents an die richtigen Handler
//!
//! Der Dispatcher ist die explizite Dispatch-Tabelle von eingehender
//! Ereignisart zu Handler. Er haelt keinerlei eigenen Zustand; der
//! `VerbindungsKontext` traegt die pro Verbindung angemeldete
//! Identitaet, damit das Aufraeumen beim Trennen weiss, welchen
//! Presence-Eintrag es betrifft.

use klartext_core::types::{ConnectionId, UserId};
use klartext_db::{BenutzerVerzeichnis, NachrichtenSpeicher};
use klartext_protocol::ClientEvent;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::handlers::{call_handler, chat_handler, presence_handler, typing_handler};
use crate::server_state::RelayState;

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
#[derive(Debug, Clone)]
pub struct VerbindungsKontext {
    /// ID dieser Verbindung
    pub verbindung: ConnectionId,
    /// Peer-Adresse (nur fuers Logging)
    pub peer_addr: SocketAddr,
    /// Angemeldete Identitaet (None bis zum `user-online`)
    pub user_id: Option<UserId>,
}

impl VerbindungsKontext {
    /// Erstellt einen neuen Kontext fuer eine frische Verbindung
    pub fn neu(verbindung: ConnectionId, peer_addr: SocketAddr) -> Self {
        Self {
            verbindung,
            peer_addr,
            user_id: None,
        }
    }
}

/// Zentraler Event-Dispatcher
///
/// Routet eingehende ClientEvents an die entsprechenden Handler. Alle
/// ausgehenden Ereignisse laufen ueber den EventBroadcaster; der
/// Dispatcher selbst gibt nichts zurueck.
pub struct EventDispatcher<V, N>
where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    state: Arc<RelayState<V, N>>,
}

impl<V, N> EventDispatcher<V, N>
where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<RelayState<V, N>>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein eingehendes ClientEvent
    pub async fn dispatch(&self, ereignis: ClientEvent, ctx: &mut VerbindungsKontext) {
        match ereignis {
            // ---------------------------------------------------------------
            // Lebenszyklus
            // ---------------------------------------------------------------
            ClientEvent::UserOnline(ev) => {
                ctx.user_id = Some(ev.user_id);
                presence_handler::handle_user_online(ev, ctx.verbindung, &self.state).await;
            }

            // ---------------------------------------------------------------
            // Tipp-Impulse
            // ---------------------------------------------------------------
            ClientEvent::TypingStart(ev) => {
                typing_handler::handle_typing(ev, true, &self.state).await;
            }
            ClientEvent::TypingStop(ev) => {
                typing_handler::handle_typing(ev, false, &self.state).await;
            }

            // ---------------------------------------------------------------
            // Chat
            // ---------------------------------------------------------------
            ClientEvent::SendMessage(ev) => {
                chat_handler::handle_send_message(ev, ctx.verbindung, &self.state).await;
            }

            // ---------------------------------------------------------------
            // Anruf-Signalisierung
            // ---------------------------------------------------------------
            ClientEvent::Offer(ev) => {
                call_handler::handle_offer(ev, &self.state).await;
            }
            ClientEvent::Answer(ev) => {
                call_handler::handle_answer(ev, ctx.user_id, &self.state).await;
            }
            ClientEvent::IceCandidate(ev) => {
                call_handler::handle_ice_candidate(ev, &self.state).await;
            }
            ClientEvent::RejectCall(ev) => {
                call_handler::handle_reject(ev, ctx.user_id, &self.state).await;
            }
            ClientEvent::EndCall(ev) => {
                call_handler::handle_end(ev, ctx.user_id, &self.state).await;
            }
        }
    }

    /// Raeumt alle Ressourcen einer Verbindung beim Trennen auf
    ///
    /// Idempotent: eine doppelt gefeuerte Trennung verteilt genau einen
    /// Offline-Statuswechsel und loest keinen Fehler aus. Der spaete
    /// Disconnect einer verdraengten Verbindung (last-connect-wins)
    /// raeumt nur seine Queue ab – der Benutzer bleibt online.
    pub async fn verbindung_bereinigen(&self, verbindung: ConnectionId) {
        if let Some((user_id, zuletzt_gesehen)) = self.state.presence.abmelden(verbindung) {
            // Verzeichnis-Flags pflegen; Fehler betreffen nur die
            // Persistenz, nicht das Aufraeumen
            if let Err(e) = self.state.verzeichnis.online_setzen(user_id, false).await {
                tracing::warn!(user_id = %user_id, fehler = %e, "Offline-Flag setzen fehlgeschlagen");
            }
            if let Err(e) = self
                .state
                .verzeichnis
                .zuletzt_gesehen_setzen(user_id, zuletzt_gesehen)
                .await
            {
                tracing::warn!(user_id = %user_id, fehler = %e, "Last-Seen setzen fehlgeschlagen");
            }

            presence_handler::statuswechsel_verteilen(user_id, false, &self.state);

            // Haengende Anrufe beenden: die Gegenseite bekommt
            // call-ended statt endlos zu warten
            for gegenseite in self.state.anrufe.teilnehmer_trennen(&user_id) {
                if let Some(ziel) = self.state.presence.nachschlagen(&gegenseite) {
                    self.state
                        .broadcaster
                        .an_verbindung_senden(&ziel, klartext_protocol::ServerEvent::CallEnded);
                    tracing::info!(
                        getrennt = %user_id,
                        gegenseite = %gegenseite,
                        "Haengenden Anruf beendet"
                    );
                }
            }
        }

        self.state.broadcaster.verbindung_entfernen(&verbindung);
        tracing::debug!(verbindung = %verbindung, "Verbindungs-Ressourcen bereinigt");
    }
}
