//! Tipp-Debounce – begrenzt die Rate der Tipp-Ereignisse
//!
//! Vertrag den jede Client-Implementierung reproduzieren muss: bei
//! jedem Tastendruck wird `typing-start` ausgeloest (nur beim ersten
//! einer Serie tatsaechlich gemeldet) und ein 2-Sekunden-Ruhetimer
//! zurueckgesetzt; feuert der Timer ohne weiteren Tastendruck, geht
//! genau ein `typing-stop` raus. Damit entsteht hoechstens ein Stop
//! pro zwei Sekunden Stille, unabhaengig von der Tastenfrequenz.
//!
//! Dieser Timer ist der einzige Timer im gesamten Kern – und er lebt
//! komplett im Client, nie im Relay.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Ruhezeit nach dem letzten Tastendruck bis zum Stop
pub const TIPP_RUHEZEIT: Duration = Duration::from_secs(2);

/// Groesse der internen Tastendruck-Queue
const TASTEN_QUEUE_GROESSE: usize = 16;

/// Gemeldete Tipp-Ereignisse
///
/// Die Integrationsschicht uebersetzt sie in `typing-start` bzw.
/// `typing-stop` an den Relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TippEreignis {
    /// Erster Tastendruck einer Serie
    Gestartet,
    /// Zwei Sekunden Ruhe nach dem letzten Tastendruck
    Gestoppt,
}

/// Meldet Tipp-Serien mit Debounce
///
/// Haelt einen Hintergrund-Task der die Tastendruecke entgegennimmt
/// und die Ereignisse auf dem Ausgangskanal meldet. Wird der Melder
/// fallengelassen, endet der Task; eine laufende Serie wird dabei noch
/// mit `Gestoppt` abgeschlossen.
pub struct TippMelder {
    taste_tx: mpsc::Sender<()>,
}

impl TippMelder {
    /// Startet den Melder; Ereignisse kommen auf `ereignis_tx` an
    pub fn starten(ereignis_tx: mpsc::Sender<TippEreignis>) -> Self {
        let (taste_tx, mut taste_rx) = mpsc::channel::<()>(TASTEN_QUEUE_GROESSE);

        tokio::spawn(async move {
            loop {
                // Auf den ersten Tastendruck einer Serie warten
                if taste_rx.recv().await.is_none() {
                    return;
                }
                if ereignis_tx.send(TippEreignis::Gestartet).await.is_err() {
                    return;
                }

                // Ruhetimer, wird pro Tastendruck zurueckgesetzt
                loop {
                    tokio::select! {
                        taste = taste_rx.recv() => {
                            match taste {
                                Some(()) => {
                                    // Weiter getippt: Timer neu aufziehen
                                    continue;
                                }
                                None => {
                                    // Melder fallengelassen: Serie abschliessen
                                    let _ = ereignis_tx.send(TippEreignis::Gestoppt).await;
                                    return;
                                }
                            }
                        }
                        _ = sleep(TIPP_RUHEZEIT) => {
                            if ereignis_tx.send(TippEreignis::Gestoppt).await.is_err() {
                                return;
                            }
                            break;
                        }
                    }
                }
            }
        });

        Self { taste_tx }
    }

    /// Meldet einen Tastendruck
    ///
    /// Nicht-blockierend; eine volle Queue heisst nur, dass die Serie
    /// ohnehin schon laeuft.
    pub fn tastendruck(&self) {
        let _ = self.taste_tx.try_send(());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
