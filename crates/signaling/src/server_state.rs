//! Gemeinsamer Server-Zustand fuer den Signaling-Hub
//!
//! Haelt die beiden Stores und den Broadcaster als gemeinsam genutzte
//! Handles, die sicher zwischen tokio-Tasks geteilt werden koennen.
//! Die Stores kennen weder einander noch den Transport – der Hub
//! (Dispatcher + Handler) ist die einzige Komponente die sie komponiert.

use std::sync::Arc;
use std::time::Instant;

use crate::broadcast::EventBroadcaster;
use crate::directory::ClientDirectory;
use crate::registry::CallRegistry;

/// Konfiguration fuer den Signaling-Hub
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale gleichzeitige Verbindungen
    pub max_clients: u32,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Rufzeichen Hub".to_string(),
            max_clients: 512,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState {
    /// Server-Konfiguration
    pub config: SignalingConfig,
    /// Client-Verzeichnis (wer ist verbunden, wer ist eingeloggt)
    pub directory: ClientDirectory,
    /// Anruf-Registry (welche Anrufe klingeln bzw. laufen)
    pub registry: CallRegistry,
    /// Event-Broadcaster (Nachrichten an Clients senden)
    pub broadcaster: EventBroadcaster,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
}

impl SignalingState {
    /// Erstellt einen neuen SignalingState
    pub fn neu(config: SignalingConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            directory: ClientDirectory::neu(),
            registry: CallRegistry::neu(),
            broadcaster: EventBroadcaster::neu(),
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
