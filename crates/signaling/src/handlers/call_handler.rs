//! Call-Handler – Anruf-Signalisierung weiterleiten
//!
//! Reine Weiterleitungsschicht ueber fuenf Ereignisarten (offer,
//! answer, ice-candidate, reject-call, end-call). Der Relay inspiziert
//! SDP und ICE nie; ein unerreichbares Ziel heisst stilles Verwerfen –
//! Anruf-Signalisierung ist strikt Echtzeit, nichts wird nachgeliefert.
//!
//! Nebenbei pflegt der Handler den CallTracker, damit das Verbindungs-
//! Aufraeumen haengende Anrufe beenden kann.

use klartext_core::types::UserId;
use klartext_db::{BenutzerVerzeichnis, NachrichtenSpeicher};
use klartext_protocol::event::{
    AnswerEvent, AnswerForwardEvent, CallTargetEvent, IceCandidateEvent,
    IceCandidateForwardEvent, OfferEvent, OfferForwardEvent,
};
use klartext_protocol::ServerEvent;
use std::sync::Arc;

use crate::server_state::RelayState;

/// Verarbeitet `offer`: vermerkt die Sitzung und leitet das Offer weiter
///
/// Vermerkt wird nur was auch zugestellt wurde – ein Offer an ein
/// unerreichbares Ziel kann nie zu einem Anruf werden und hinterlaesst
/// keine Sitzung.
pub async fn handle_offer<V, N>(ereignis: OfferEvent, state: &Arc<RelayState<V, N>>)
where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    match state.presence.nachschlagen(&ereignis.to) {
        Some(ziel) => {
            state.anrufe.anruf_vermerken(ereignis.from, ereignis.to);
            state.broadcaster.an_verbindung_senden(
                &ziel,
                ServerEvent::Offer(OfferForwardEvent {
                    from: ereignis.from,
                    name: ereignis.name,
                    offer: ereignis.offer,
                }),
            );
            tracing::debug!(von = %ereignis.from, an = %ereignis.to, "Offer weitergeleitet");
        }
        None => {
            tracing::debug!(an = %ereignis.to, "Angerufener nicht erreichbar – Offer verworfen");
        }
    }
}

/// Verarbeitet `answer`: befoerdert die Sitzung und leitet die Answer weiter
///
/// `von` ist die angemeldete Identitaet der sendenden Verbindung; ohne
/// Anmeldung wird nur weitergeleitet, nicht vermerkt.
pub async fn handle_answer<V, N>(
    ereignis: AnswerEvent,
    von: Option<UserId>,
    state: &Arc<RelayState<V, N>>,
) where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    match state.presence.nachschlagen(&ereignis.to) {
        Some(ziel) => {
            if let Some(angerufener) = von {
                state.anrufe.antwort_vermerken(ereignis.to, angerufener);
            }
            state.broadcaster.an_verbindung_senden(
                &ziel,
                ServerEvent::Answer(AnswerForwardEvent {
                    answer: ereignis.answer,
                }),
            );
            tracing::debug!(an = %ereignis.to, "Answer weitergeleitet");
        }
        None => {
            tracing::debug!(an = %ereignis.to, "Anrufer nicht erreichbar – Answer verworfen");
        }
    }
}

/// Verarbeitet `ice-candidate`: leitet den Kandidaten an die Gegenseite
///
/// Kandidaten fliessen beliebig oft, auch nach dem Verbindungsaufbau
/// (Trickle ICE) – jeder genau einmal an genau die Gegenseite.
pub async fn handle_ice_candidate<V, N>(
    ereignis: IceCandidateEvent,
    state: &Arc<RelayState<V, N>>,
) where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    match state.presence.nachschlagen(&ereignis.to) {
        Some(ziel) => {
            state.broadcaster.an_verbindung_senden(
                &ziel,
                ServerEvent::IceCandidate(IceCandidateForwardEvent {
                    candidate: ereignis.candidate,
                    from: ereignis.from,
                }),
            );
        }
        None => {
            tracing::trace!(an = %ereignis.to, "ICE-Kandidat an Offline-Ziel verworfen");
        }
    }
}

/// Verarbeitet `reject-call`: entfernt die Sitzung, meldet dem Anrufer
pub async fn handle_reject<V, N>(
    ereignis: CallTargetEvent,
    von: Option<UserId>,
    state: &Arc<RelayState<V, N>>,
) where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    if let Some(ablehnender) = von {
        state.anrufe.beenden(&ereignis.to, &ablehnender);
    }

    match state.presence.nachschlagen(&ereignis.to) {
        Some(ziel) => {
            state
                .broadcaster
                .an_verbindung_senden(&ziel, ServerEvent::CallRejected);
            tracing::debug!(an = %ereignis.to, "Anruf abgelehnt");
        }
        None => {
            tracing::debug!(an = %ereignis.to, "Reject an Offline-Ziel verworfen");
        }
    }
}

/// Verarbeitet `end-call`: entfernt die Sitzung, meldet der Gegenseite
pub async fn handle_end<V, N>(
    ereignis: CallTargetEvent,
    von: Option<UserId>,
    state: &Arc<RelayState<V, N>>,
) where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    if let Some(auflegender) = von {
        state.anrufe.beenden(&ereignis.to, &auflegender);
    }

    match state.presence.nachschlagen(&ereignis.to) {
        Some(ziel) => {
            state
                .broadcaster
                .an_verbindung_senden(&ziel, ServerEvent::CallEnded);
            tracing::debug!(an = %ereignis.to, "Anruf beendet");
        }
        None => {
            tracing::debug!(an = %ereignis.to, "End an Offline-Ziel verworfen");
        }
    }
}
