//! klartext-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und verdrahtet die Subsysteme:
//! SQLite-Pool -> Nachrichten-Dienst -> Relay-Zustand -> TCP-Listener.

pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use klartext_chat::MessageService;
use klartext_db::{DatabaseConfig, SqliteDb};
use klartext_signaling::{RelayConfig, RelayState, SignalingServer};

use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen (Migrationen laufen mit)
    /// 2. TCP-Listener starten (Relay-Protokoll)
    /// 3. Auf Ctrl-C / SIGTERM warten
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %self.config.tcp_bind_adresse(),
            "Server startet"
        );

        // Datenbank oeffnen
        let db_config = DatabaseConfig {
            url: self.config.datenbank.url.clone(),
            max_verbindungen: self.config.datenbank.max_verbindungen,
            sqlite_wal: self.config.datenbank.wal,
        };
        let db = Arc::new(
            SqliteDb::oeffnen(&db_config)
                .await
                .context("Datenbankverbindung fehlgeschlagen")?,
        );

        // Relay-Zustand verdrahten
        let nachrichten = MessageService::neu(Arc::clone(&db));
        let relay_config = RelayConfig {
            server_name: self.config.server.name.clone(),
            max_verbindungen: self.config.server.max_verbindungen,
        };
        let state = RelayState::neu(relay_config, db, nachrichten);

        // TCP-Listener starten
        let bind_addr: SocketAddr = self
            .config
            .tcp_bind_adresse()
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse '{}'", self.config.tcp_bind_adresse()))?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let listener = SignalingServer::neu(state, bind_addr);
        let listener_task = tokio::spawn(listener.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c()
            .await
            .context("Warten auf Ctrl-C fehlgeschlagen")?;

        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
        let _ = shutdown_tx.send(true);
        listener_task
            .await
            .context("Listener-Task abgebrochen")?
            .context("Listener beendete sich mit Fehler")?;

        Ok(())
    }
}
