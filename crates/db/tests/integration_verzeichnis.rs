//! Integrationstests fuer das Benutzer-Verzeichnis (SQLite)

use chrono::Utc;
use klartext_db::{BenutzerVerzeichnis, DbError, NeuerBenutzer, SqliteDb};

async fn test_db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory-DB konnte nicht geoeffnet werden")
}

#[tokio::test]
async fn benutzer_anlegen_und_laden() {
    let db = test_db().await;

    let benutzer = db
        .erstellen(NeuerBenutzer { name: "Anna" })
        .await
        .expect("Benutzer anlegen fehlgeschlagen");
    assert_eq!(benutzer.name, "Anna");
    assert!(!benutzer.is_online);
    assert!(benutzer.last_seen.is_none());

    let geladen = db
        .laden(benutzer.id)
        .await
        .expect("Laden fehlgeschlagen")
        .expect("Benutzer muss existieren");
    assert_eq!(geladen, benutzer);
}

#[tokio::test]
async fn online_flag_setzen() {
    let db = test_db().await;
    let benutzer = db.erstellen(NeuerBenutzer { name: "Ben" }).await.unwrap();

    db.online_setzen(benutzer.id, true).await.unwrap();
    let geladen = db.laden(benutzer.id).await.unwrap().unwrap();
    assert!(geladen.is_online);

    db.online_setzen(benutzer.id, false).await.unwrap();
    let geladen = db.laden(benutzer.id).await.unwrap().unwrap();
    assert!(!geladen.is_online);
}

#[tokio::test]
async fn zuletzt_gesehen_setzen() {
    let db = test_db().await;
    let benutzer = db.erstellen(NeuerBenutzer { name: "Cleo" }).await.unwrap();

    let zeitpunkt = Utc::now();
    db.zuletzt_gesehen_setzen(benutzer.id, zeitpunkt)
        .await
        .unwrap();

    let geladen = db.laden(benutzer.id).await.unwrap().unwrap();
    let gespeichert = geladen.last_seen.expect("last_seen muss gesetzt sein");
    // Mikrosekunden-Genauigkeit der TEXT-Spalte
    assert!((gespeichert - zeitpunkt).num_milliseconds().abs() < 1);
}

#[tokio::test]
async fn unbekannter_benutzer_ist_kein_fehler_beim_laden() {
    let db = test_db().await;
    let ergebnis = db.laden(klartext_core::UserId::new()).await.unwrap();
    assert!(ergebnis.is_none());
}

#[tokio::test]
async fn update_auf_unbekanntem_benutzer_schlaegt_fehl() {
    let db = test_db().await;
    let ergebnis = db
        .online_setzen(klartext_core::UserId::new(), true)
        .await;
    assert!(matches!(ergebnis, Err(DbError::NichtGefunden(_))));
}
