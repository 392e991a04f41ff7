//! Event-Broadcaster – Sendet Nachrichten an verbundene Clients
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen
//! Clients und stellt Methoden bereit, um Nachrichten gezielt oder an
//! alle zu senden.
//!
//! ## Selektives Senden
//! - An einen Client: `an_client_senden`
//! - An alle Clients: `an_alle_senden`

use dashmap::DashMap;
use rufzeichen_core::ConnectionId;
use rufzeichen_protocol::control::ControlMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Client
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub id: ConnectionId,
    pub tx: mpsc::Sender<ControlMessage>,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, nachricht: ControlMessage) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.id, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.id, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<DashMap<ConnectionId, ClientSender>>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Registriert einen neuen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und sendet via TCP.
    pub fn client_registrieren(&self, id: ConnectionId) -> mpsc::Receiver<ControlMessage> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        self.inner.insert(id, ClientSender { id, tx });
        tracing::debug!(verbindung = %id, "Client im Broadcaster registriert");
        rx
    }

    /// Entfernt einen Client aus dem Broadcaster
    pub fn client_entfernen(&self, id: &ConnectionId) {
        self.inner.remove(id);
        tracing::debug!(verbindung = %id, "Client aus Broadcaster entfernt");
    }

    /// Sendet eine Nachricht an einen einzelnen Client
    ///
    /// Gibt `true` zurueck wenn der Client gefunden und die Nachricht
    /// eingereiht wurde.
    pub fn an_client_senden(&self, id: &ConnectionId, nachricht: ControlMessage) -> bool {
        match self.inner.get(id) {
            Some(sender) => sender.senden(nachricht),
            None => {
                tracing::debug!(verbindung = %id, "Senden an unbekannten Client");
                false
            }
        }
    }

    /// Sendet eine Nachricht an alle verbundenen Clients
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_alle_senden(&self, nachricht: ControlMessage) -> usize {
        let mut gesendet = 0;
        self.inner.iter().for_each(|entry| {
            if entry.value().senden(nachricht.clone()) {
                gesendet += 1;
            }
        });
        gesendet
    }

    /// Gibt die Anzahl der registrierten Clients zurueck
    pub fn client_anzahl(&self) -> usize {
        self.inner.len()
    }

    /// Prueft ob ein Client registriert ist
    pub fn ist_registriert(&self, id: &ConnectionId) -> bool {
        self.inner.contains_key(id)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
