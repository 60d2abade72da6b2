//! Integrationstests fuer den Relay-Kern
//!
//! Die Tests treiben den EventDispatcher direkt, ohne TCP: jede
//! "Verbindung" ist eine registrierte Broadcaster-Queue plus ein
//! Kontext. Als Speicher dient die In-Memory-SQLite-Datenbank.

use std::net::SocketAddr;
use std::sync::Arc;

use klartext_chat::MessageService;
use klartext_core::types::{ConnectionId, UserId};
use klartext_db::{BenutzerVerzeichnis, NeuerBenutzer, SqliteDb};
use klartext_protocol::event::{
    AnswerEvent, CallTargetEvent, IceCandidateEvent, OfferEvent, SendMessageEvent, TypingEvent,
    UserOnlineEvent,
};
use klartext_protocol::{ClientEvent, ServerEvent};
use klartext_signaling::{EventDispatcher, RelayConfig, RelayState, VerbindungsKontext};
use serde_json::json;
use tokio::sync::mpsc;

type TestState = Arc<RelayState<SqliteDb, SqliteDb>>;
type TestDispatcher = EventDispatcher<SqliteDb, SqliteDb>;

async fn test_state() -> TestState {
    let db = Arc::new(
        SqliteDb::in_memory()
            .await
            .expect("In-Memory-DB konnte nicht geoeffnet werden"),
    );
    let nachrichten = MessageService::neu(Arc::clone(&db));
    RelayState::neu(RelayConfig::default(), db, nachrichten)
}

fn test_adresse() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

async fn benutzer_anlegen(state: &TestState, name: &str) -> UserId {
    state
        .verzeichnis
        .erstellen(NeuerBenutzer { name })
        .await
        .expect("Benutzer anlegen fehlgeschlagen")
        .id
}

/// Simuliert Accept + `user-online` einer Verbindung
async fn verbinden(
    dispatcher: &TestDispatcher,
    state: &TestState,
    user_id: UserId,
) -> (VerbindungsKontext, mpsc::Receiver<ServerEvent>) {
    let verbindung = ConnectionId::new();
    let rx = state.broadcaster.verbindung_registrieren(verbindung);
    let mut ctx = VerbindungsKontext::neu(verbindung, test_adresse());
    dispatcher
        .dispatch(
            ClientEvent::UserOnline(UserOnlineEvent { user_id }),
            &mut ctx,
        )
        .await;
    (ctx, rx)
}

/// Liest alle bereits eingereihten Ereignisse aus einer Queue
fn ereignisse_abholen(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut ereignisse = Vec::new();
    while let Ok(ereignis) = rx.try_recv() {
        ereignisse.push(ereignis);
    }
    ereignisse
}

fn send_message(sender: UserId, empfaenger: UserId, content: &str) -> ClientEvent {
    ClientEvent::SendMessage(SendMessageEvent {
        sender_id: sender,
        receiver_id: Some(empfaenger),
        content: content.to_string(),
        message_type: None,
    })
}

// ---------------------------------------------------------------------------
// Nachrichten-Relay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nachricht_wird_gespeichert_und_zugestellt() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;
    let ben = benutzer_anlegen(&state, "Ben").await;

    let (mut ctx_anna, mut rx_anna) = verbinden(&dispatcher, &state, anna).await;
    let (_ctx_ben, mut rx_ben) = verbinden(&dispatcher, &state, ben).await;

    // Status-Fan-outs aus den Queues raeumen
    ereignisse_abholen(&mut rx_anna);
    ereignisse_abholen(&mut rx_ben);

    dispatcher
        .dispatch(send_message(anna, ben, "hallo Ben"), &mut ctx_anna)
        .await;

    // Ben bekommt genau ein receive-message mit der gespeicherten Form
    let bei_ben = ereignisse_abholen(&mut rx_ben);
    assert_eq!(bei_ben.len(), 1);
    let empfangen = match &bei_ben[0] {
        ServerEvent::ReceiveMessage(info) => info.clone(),
        andere => panic!("receive-message erwartet, war {andere:?}"),
    };
    assert_eq!(empfangen.content, "hallo Ben");
    assert_eq!(empfangen.sender_id, anna);
    assert_eq!(empfangen.message_type, "text");

    // Anna bekommt dieselbe gespeicherte Form als Bestaetigung
    let bei_anna = ereignisse_abholen(&mut rx_anna);
    assert_eq!(bei_anna.len(), 1);
    match &bei_anna[0] {
        ServerEvent::MessageSent(info) => assert_eq!(*info, empfangen),
        andere => panic!("message-sent erwartet, war {andere:?}"),
    }

    // Gespeichert vor zugestellt: der Verlauf enthaelt die Nachricht
    let verlauf = state.nachrichten.verlauf_laden(anna, ben).await.unwrap();
    assert_eq!(verlauf.len(), 1);
    assert_eq!(verlauf[0].id, empfangen.id);
}

#[tokio::test]
async fn nachricht_an_offline_empfaenger_wird_nur_gespeichert() {
    // Szenario: u1 online, u2 offline; u1 sendet "hi"
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let u1 = benutzer_anlegen(&state, "u1").await;
    let u2 = benutzer_anlegen(&state, "u2").await;

    let (mut ctx, mut rx) = verbinden(&dispatcher, &state, u1).await;
    ereignisse_abholen(&mut rx);

    dispatcher.dispatch(send_message(u1, u2, "hi"), &mut ctx).await;

    // u1 bekommt die Bestaetigung, sonst feuert nichts
    let ereignisse = ereignisse_abholen(&mut rx);
    assert_eq!(ereignisse.len(), 1);
    match &ereignisse[0] {
        ServerEvent::MessageSent(info) => {
            assert_eq!(info.sender_id, u1);
            assert_eq!(info.receiver_id, u2);
            assert_eq!(info.content, "hi");
        }
        andere => panic!("message-sent erwartet, war {andere:?}"),
    }

    // Der Speicher enthaelt die Nachricht trotzdem
    let verlauf = state.nachrichten.verlauf_laden(u1, u2).await.unwrap();
    assert_eq!(verlauf.len(), 1);
    assert_eq!(verlauf[0].content, "hi");
}

#[tokio::test]
async fn ungueltige_nachricht_liefert_message_error() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;

    let (mut ctx, mut rx) = verbinden(&dispatcher, &state, anna).await;
    ereignisse_abholen(&mut rx);

    // Leerer Inhalt
    dispatcher
        .dispatch(
            ClientEvent::SendMessage(SendMessageEvent {
                sender_id: anna,
                receiver_id: Some(UserId::new()),
                content: "   ".into(),
                message_type: None,
            }),
            &mut ctx,
        )
        .await;

    // Fehlender Empfaenger
    dispatcher
        .dispatch(
            ClientEvent::SendMessage(SendMessageEvent {
                sender_id: anna,
                receiver_id: None,
                content: "hallo".into(),
                message_type: None,
            }),
            &mut ctx,
        )
        .await;

    let ereignisse = ereignisse_abholen(&mut rx);
    assert_eq!(ereignisse.len(), 2);
    for ereignis in &ereignisse {
        assert!(
            matches!(ereignis, ServerEvent::MessageError(_)),
            "message-error erwartet, war {ereignis:?}"
        );
    }
}

// ---------------------------------------------------------------------------
// Tipp-Impulse
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tipp_impulse_werden_weitergeleitet() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;
    let ben = benutzer_anlegen(&state, "Ben").await;

    let (mut ctx_anna, mut rx_anna) = verbinden(&dispatcher, &state, anna).await;
    let (_ctx_ben, mut rx_ben) = verbinden(&dispatcher, &state, ben).await;
    ereignisse_abholen(&mut rx_anna);
    ereignisse_abholen(&mut rx_ben);

    dispatcher
        .dispatch(
            ClientEvent::TypingStart(TypingEvent {
                receiver_id: ben,
                sender_id: anna,
            }),
            &mut ctx_anna,
        )
        .await;
    dispatcher
        .dispatch(
            ClientEvent::TypingStop(TypingEvent {
                receiver_id: ben,
                sender_id: anna,
            }),
            &mut ctx_anna,
        )
        .await;

    let bei_ben = ereignisse_abholen(&mut rx_ben);
    assert_eq!(bei_ben.len(), 2);
    match (&bei_ben[0], &bei_ben[1]) {
        (ServerEvent::UserTyping(start), ServerEvent::UserTyping(stop)) => {
            assert_eq!(start.user_id, anna);
            assert!(start.is_typing);
            assert_eq!(stop.user_id, anna);
            assert!(!stop.is_typing);
        }
        andere => panic!("Zwei user-typing erwartet, war {andere:?}"),
    }

    // Der Absender selbst bekommt nichts
    assert!(ereignisse_abholen(&mut rx_anna).is_empty());
}

#[tokio::test]
async fn tipp_impuls_an_offline_empfaenger_ist_folgenlos() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;

    let (mut ctx, mut rx) = verbinden(&dispatcher, &state, anna).await;
    ereignisse_abholen(&mut rx);

    dispatcher
        .dispatch(
            ClientEvent::TypingStart(TypingEvent {
                receiver_id: UserId::new(),
                sender_id: anna,
            }),
            &mut ctx,
        )
        .await;

    assert!(ereignisse_abholen(&mut rx).is_empty(), "Kein Fehler, kein Echo");
}

// ---------------------------------------------------------------------------
// Anruf-Signalisierung
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signalisierungs_runde_offer_answer_kandidaten() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;
    let ben = benutzer_anlegen(&state, "Ben").await;

    let (mut ctx_anna, mut rx_anna) = verbinden(&dispatcher, &state, anna).await;
    let (mut ctx_ben, mut rx_ben) = verbinden(&dispatcher, &state, ben).await;
    ereignisse_abholen(&mut rx_anna);
    ereignisse_abholen(&mut rx_ben);

    // Anna ruft Ben an
    dispatcher
        .dispatch(
            ClientEvent::Offer(OfferEvent {
                to: ben,
                from: anna,
                name: "Anna".into(),
                offer: json!({"type": "offer", "sdp": "v=0"}),
            }),
            &mut ctx_anna,
        )
        .await;

    let bei_ben = ereignisse_abholen(&mut rx_ben);
    assert_eq!(bei_ben.len(), 1, "Genau ein Offer bei Ben");
    match &bei_ben[0] {
        ServerEvent::Offer(offer) => {
            assert_eq!(offer.from, anna);
            assert_eq!(offer.name, "Anna");
        }
        andere => panic!("offer erwartet, war {andere:?}"),
    }
    assert!(ereignisse_abholen(&mut rx_anna).is_empty(), "Nichts an Anna");

    // Ben nimmt an
    dispatcher
        .dispatch(
            ClientEvent::Answer(AnswerEvent {
                to: anna,
                answer: json!({"type": "answer", "sdp": "v=0"}),
            }),
            &mut ctx_ben,
        )
        .await;

    let bei_anna = ereignisse_abholen(&mut rx_anna);
    assert_eq!(bei_anna.len(), 1, "Genau eine Answer bei Anna");
    assert!(matches!(bei_anna[0], ServerEvent::Answer(_)));

    // Kandidaten beider Seiten: jeder genau einmal, nur an die Gegenseite
    dispatcher
        .dispatch(
            ClientEvent::IceCandidate(IceCandidateEvent {
                to: ben,
                from: anna,
                candidate: json!({"candidate": "a"}),
            }),
            &mut ctx_anna,
        )
        .await;
    dispatcher
        .dispatch(
            ClientEvent::IceCandidate(IceCandidateEvent {
                to: anna,
                from: ben,
                candidate: json!({"candidate": "b"}),
            }),
            &mut ctx_ben,
        )
        .await;

    let kandidaten_ben = ereignisse_abholen(&mut rx_ben);
    assert_eq!(kandidaten_ben.len(), 1);
    match &kandidaten_ben[0] {
        ServerEvent::IceCandidate(k) => {
            assert_eq!(k.from, anna);
            assert_eq!(k.candidate, json!({"candidate": "a"}));
        }
        andere => panic!("ice-candidate erwartet, war {andere:?}"),
    }

    let kandidaten_anna = ereignisse_abholen(&mut rx_anna);
    assert_eq!(kandidaten_anna.len(), 1);
    match &kandidaten_anna[0] {
        ServerEvent::IceCandidate(k) => assert_eq!(k.from, ben),
        andere => panic!("ice-candidate erwartet, war {andere:?}"),
    }

    // Die Sitzung ist serverseitig als verbunden vermerkt
    let sitzung = state.anrufe.sitzung_von(&anna).expect("Sitzung erwartet");
    assert_eq!(sitzung.anrufer, anna);
    assert_eq!(sitzung.angerufener, ben);
}

#[tokio::test]
async fn signal_an_offline_ziel_wird_still_verworfen() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;
    let weg = UserId::new();

    let (mut ctx, mut rx) = verbinden(&dispatcher, &state, anna).await;
    ereignisse_abholen(&mut rx);

    dispatcher
        .dispatch(
            ClientEvent::Offer(OfferEvent {
                to: weg,
                from: anna,
                name: "Anna".into(),
                offer: json!({}),
            }),
            &mut ctx,
        )
        .await;
    dispatcher
        .dispatch(ClientEvent::EndCall(CallTargetEvent { to: weg }), &mut ctx)
        .await;

    // Kein Fehler, kein Echo, keine haengende Sitzung
    assert!(ereignisse_abholen(&mut rx).is_empty());
    assert_eq!(state.anrufe.sitzungs_anzahl(), 0);
}

#[tokio::test]
async fn reject_beendet_die_vermerkte_sitzung() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;
    let ben = benutzer_anlegen(&state, "Ben").await;

    let (mut ctx_anna, mut rx_anna) = verbinden(&dispatcher, &state, anna).await;
    let (mut ctx_ben, mut rx_ben) = verbinden(&dispatcher, &state, ben).await;
    ereignisse_abholen(&mut rx_anna);
    ereignisse_abholen(&mut rx_ben);

    dispatcher
        .dispatch(
            ClientEvent::Offer(OfferEvent {
                to: ben,
                from: anna,
                name: "Anna".into(),
                offer: json!({}),
            }),
            &mut ctx_anna,
        )
        .await;
    assert_eq!(state.anrufe.sitzungs_anzahl(), 1);

    dispatcher
        .dispatch(
            ClientEvent::RejectCall(CallTargetEvent { to: anna }),
            &mut ctx_ben,
        )
        .await;

    let bei_anna = ereignisse_abholen(&mut rx_anna);
    assert_eq!(bei_anna, vec![ServerEvent::CallRejected]);
    assert_eq!(state.anrufe.sitzungs_anzahl(), 0);
}

// ---------------------------------------------------------------------------
// Verbindungs-Lebenszyklus
// ---------------------------------------------------------------------------

#[tokio::test]
async fn statuswechsel_erreicht_alle_verbindungen() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;
    let ben = benutzer_anlegen(&state, "Ben").await;

    let (_ctx_anna, mut rx_anna) = verbinden(&dispatcher, &state, anna).await;

    // Bens Anmeldung erreicht auch Anna
    let (_ctx_ben, _rx_ben) = verbinden(&dispatcher, &state, ben).await;

    let bei_anna = ereignisse_abholen(&mut rx_anna);
    let online_von_ben = bei_anna.iter().any(|e| {
        matches!(e, ServerEvent::UserStatusChange(s) if s.user_id == ben && s.is_online)
    });
    assert!(online_von_ben, "Anna muss Bens Online-Status sehen");
}

#[tokio::test]
async fn doppelte_trennung_verteilt_genau_einen_offline_status() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;
    let ben = benutzer_anlegen(&state, "Ben").await;

    let (_ctx_anna, mut rx_anna) = verbinden(&dispatcher, &state, anna).await;
    let (ctx_ben, rx_ben) = verbinden(&dispatcher, &state, ben).await;
    ereignisse_abholen(&mut rx_anna);

    // Trennung feuert doppelt
    dispatcher.verbindung_bereinigen(ctx_ben.verbindung).await;
    dispatcher.verbindung_bereinigen(ctx_ben.verbindung).await;
    drop(rx_ben);

    let bei_anna = ereignisse_abholen(&mut rx_anna);
    let offline_meldungen = bei_anna
        .iter()
        .filter(|e| {
            matches!(e, ServerEvent::UserStatusChange(s) if s.user_id == ben && !s.is_online)
        })
        .count();
    assert_eq!(offline_meldungen, 1);

    // Presence und Verzeichnis sind konsistent
    assert!(!state.presence.ist_online(&ben));
    let record = state.verzeichnis.laden(ben).await.unwrap().unwrap();
    assert!(!record.is_online);
    assert!(record.last_seen.is_some());
}

#[tokio::test]
async fn trennung_beendet_haengende_anrufe() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;
    let ben = benutzer_anlegen(&state, "Ben").await;

    let (mut ctx_anna, mut rx_anna) = verbinden(&dispatcher, &state, anna).await;
    let (ctx_ben, mut rx_ben) = verbinden(&dispatcher, &state, ben).await;
    ereignisse_abholen(&mut rx_anna);
    ereignisse_abholen(&mut rx_ben);

    dispatcher
        .dispatch(
            ClientEvent::Offer(OfferEvent {
                to: ben,
                from: anna,
                name: "Anna".into(),
                offer: json!({}),
            }),
            &mut ctx_anna,
        )
        .await;
    assert_eq!(state.anrufe.sitzungs_anzahl(), 1);

    // Ben verschwindet mitten im Anruf
    dispatcher.verbindung_bereinigen(ctx_ben.verbindung).await;

    let bei_anna = ereignisse_abholen(&mut rx_anna);
    assert!(
        bei_anna.contains(&ServerEvent::CallEnded),
        "Anna darf nicht endlos warten: {bei_anna:?}"
    );
    assert_eq!(state.anrufe.sitzungs_anzahl(), 0);
}

#[tokio::test]
async fn wiederverbindung_letzte_gewinnt() {
    let state = test_state().await;
    let dispatcher = EventDispatcher::neu(Arc::clone(&state));
    let anna = benutzer_anlegen(&state, "Anna").await;
    let ben = benutzer_anlegen(&state, "Ben").await;

    let (_ctx_ben, mut rx_ben) = verbinden(&dispatcher, &state, ben).await;

    // Anna verbindet sich zweimal (z.B. Netzwechsel)
    let (ctx_alt, _rx_alt) = verbinden(&dispatcher, &state, anna).await;
    let (ctx_neu, _rx_neu) = verbinden(&dispatcher, &state, anna).await;
    ereignisse_abholen(&mut rx_ben);

    // Der spaete Disconnect der verdraengten Verbindung
    dispatcher.verbindung_bereinigen(ctx_alt.verbindung).await;

    // Anna bleibt ueber die neue Verbindung erreichbar, kein Offline-Status
    assert_eq!(state.presence.nachschlagen(&anna), Some(ctx_neu.verbindung));
    let bei_ben = ereignisse_abholen(&mut rx_ben);
    let offline_von_anna = bei_ben.iter().any(|e| {
        matches!(e, ServerEvent::UserStatusChange(s) if s.user_id == anna && !s.is_online)
    });
    assert!(!offline_von_anna, "Verdraengte Verbindung meldet nicht ab");
}
