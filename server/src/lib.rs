//! rufzeichen-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt den oeffentlichen
//! Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use rufzeichen_signaling::{SignalingConfig, SignalingServer, SignalingState};
use std::net::SocketAddr;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Signaling-Hub und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Gemeinsamen Hub-Zustand aufbauen
    /// 2. TCP-Listener starten (Signalisierungsprotokoll)
    /// 3. Auf Ctrl-C / SIGTERM warten und Shutdown signalisieren
    pub async fn starten(self) -> Result<()> {
        let bind_addr: SocketAddr = self.config.tcp_bind_adresse().parse()?;

        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %bind_addr,
            "Server startet"
        );

        let signaling_config = SignalingConfig {
            server_name: self.config.server.name.clone(),
            max_clients: self.config.server.max_clients,
            keepalive_sek: self.config.netzwerk.keepalive_sek,
            verbindungs_timeout_sek: self.config.netzwerk.verbindungs_timeout_sek,
        };
        let state = SignalingState::neu(signaling_config);

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        let listener = SignalingServer::neu(state, bind_addr);
        let listener_task = tokio::spawn(async move {
            if let Err(e) = listener.starten(shutdown_rx).await {
                tracing::error!(fehler = %e, "Signaling-Server beendet mit Fehler");
            }
        });

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        let _ = shutdown_tx.send(true);
        listener_task.await?;

        Ok(())
    }
}
