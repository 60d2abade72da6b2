//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Der Task liest Frames, dispatcht sie und leert parallel
//! die Sende-Queue des Broadcasters in den Socket.
//!
//! ## Lebenszyklus
//! ```text
//! Accept -> Broadcaster-Queue registrieren -> Frame-Loop
//!     |  (Identitaet erst ab `user-online` bekannt)
//!     v
//! Trennung / Frame-Fehler / Shutdown -> verbindung_bereinigen
//! ```
//!
//! Ein fehlerhaftes Frame beendet nur diese Verbindung; das Aufraeumen
//! meldet hoechstens ihre eigene Praesenz ab und laesst alle anderen
//! Verbindungen unberuehrt.

use futures_util::{SinkExt, StreamExt};
use klartext_core::types::ConnectionId;
use klartext_db::{BenutzerVerzeichnis, NachrichtenSpeicher};
use klartext_protocol::wire::ServerCodec;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::dispatcher::{EventDispatcher, VerbindungsKontext};
use crate::server_state::RelayState;

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Frames via `ServerCodec`, dispatcht an `EventDispatcher` und
/// sendet ausgehende Ereignisse aus der Broadcaster-Queue. Laeuft in
/// einem eigenen tokio-Task.
pub struct ClientConnection<V, N>
where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    state: Arc<RelayState<V, N>>,
    peer_addr: SocketAddr,
}

impl<V, N> ClientConnection<V, N>
where
    V: BenutzerVerzeichnis + 'static,
    N: NachrichtenSpeicher + 'static,
{
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<RelayState<V, N>>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        let verbindung = ConnectionId::new();

        tracing::info!(peer = %peer_addr, verbindung = %verbindung, "Neue Verbindung");

        // Framed-Stream mit ServerCodec einrichten
        let mut framed = Framed::new(stream, ServerCodec::new());

        // Sende-Queue sofort registrieren: Status-Fan-outs muessen auch
        // Verbindungen erreichen die noch keine Identitaet angemeldet haben
        let mut sende_rx = self.state.broadcaster.verbindung_registrieren(verbindung);

        let mut ctx = VerbindungsKontext::neu(verbindung, peer_addr);
        let dispatcher = EventDispatcher::neu(Arc::clone(&self.state));

        loop {
            tokio::select! {
                // Eingehendes Ereignis vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(ereignis)) => {
                            dispatcher.dispatch(ereignis, &mut ctx).await;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                peer = %peer_addr,
                                fehler = %e,
                                "Frame-Lesefehler"
                            );
                            break;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehendes Ereignis aus dem Broadcaster
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = framed.send(ausgehend).await {
                        tracing::warn!(
                            peer = %peer_addr,
                            fehler = %e,
                            "Senden fehlgeschlagen"
                        );
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        break;
                    }
                }
            }
        }

        // Aufraeumen beim Verbindungsende (idempotent)
        dispatcher.verbindung_bereinigen(verbindung).await;

        tracing::info!(peer = %peer_addr, "Verbindungs-Task beendet");
    }
}
