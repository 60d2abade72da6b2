//! Integrationstests fuer den Nachrichten-Speicher (SQLite)

use klartext_core::UserId;
use klartext_db::{NachrichtenSpeicher, NachrichtenTyp, NeueNachricht, SqliteDb};

async fn test_db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory-DB konnte nicht geoeffnet werden")
}

fn neue_nachricht<'a>(sender: UserId, empfaenger: UserId, content: &'a str) -> NeueNachricht<'a> {
    NeueNachricht {
        sender_id: sender,
        receiver_id: empfaenger,
        content,
        message_type: NachrichtenTyp::Text,
    }
}

#[tokio::test]
async fn anhaengen_vergibt_id_und_zeitstempel() {
    let db = test_db().await;
    let (a, b) = (UserId::new(), UserId::new());

    let record = db
        .anhaengen(neue_nachricht(a, b, "hallo"))
        .await
        .expect("Anhaengen fehlgeschlagen");

    assert_eq!(record.sender_id, a);
    assert_eq!(record.receiver_id, b);
    assert_eq!(record.content, "hallo");
    assert_eq!(record.message_type, NachrichtenTyp::Text);
    assert!(!record.is_read);
    assert!(record.read_at.is_none());
}

#[tokio::test]
async fn verlauf_umfasst_beide_richtungen_chronologisch() {
    let db = test_db().await;
    let (a, b) = (UserId::new(), UserId::new());
    let c = UserId::new();

    db.anhaengen(neue_nachricht(a, b, "erste")).await.unwrap();
    db.anhaengen(neue_nachricht(b, a, "zweite")).await.unwrap();
    db.anhaengen(neue_nachricht(a, b, "dritte")).await.unwrap();
    // Fremdes Paar darf nicht auftauchen
    db.anhaengen(neue_nachricht(a, c, "fremd")).await.unwrap();

    let verlauf = db.verlauf(a, b).await.unwrap();
    let inhalte: Vec<&str> = verlauf.iter().map(|n| n.content.as_str()).collect();
    assert_eq!(inhalte, vec!["erste", "zweite", "dritte"]);

    // Verlauf ist symmetrisch
    let verlauf_umgekehrt = db.verlauf(b, a).await.unwrap();
    assert_eq!(verlauf, verlauf_umgekehrt);
}

#[tokio::test]
async fn nachrichtentyp_bleibt_erhalten() {
    let db = test_db().await;
    let (a, b) = (UserId::new(), UserId::new());

    db.anhaengen(NeueNachricht {
        sender_id: a,
        receiver_id: b,
        content: "schau mal",
        message_type: NachrichtenTyp::Sonstig("gif".into()),
    })
    .await
    .unwrap();

    let verlauf = db.verlauf(a, b).await.unwrap();
    assert_eq!(
        verlauf[0].message_type,
        NachrichtenTyp::Sonstig("gif".into())
    );
}

#[tokio::test]
async fn als_gelesen_markieren_ist_gerichtet() {
    let db = test_db().await;
    let (a, b) = (UserId::new(), UserId::new());

    db.anhaengen(neue_nachricht(a, b, "eins")).await.unwrap();
    db.anhaengen(neue_nachricht(a, b, "zwei")).await.unwrap();
    db.anhaengen(neue_nachricht(b, a, "antwort")).await.unwrap();

    // b liest die Nachrichten von a
    let geaendert = db.als_gelesen_markieren(a, b).await.unwrap();
    assert_eq!(geaendert, 2);

    let verlauf = db.verlauf(a, b).await.unwrap();
    for nachricht in &verlauf {
        if nachricht.sender_id == a {
            assert!(nachricht.is_read);
            assert!(nachricht.read_at.is_some());
        } else {
            assert!(!nachricht.is_read, "Gegenrichtung bleibt ungelesen");
        }
    }

    // Zweiter Aufruf aendert nichts mehr
    let nochmal = db.als_gelesen_markieren(a, b).await.unwrap();
    assert_eq!(nochmal, 0);
}
