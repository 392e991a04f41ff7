//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Beim Start wird die Verbindung im Verzeichnis und im
//! Broadcaster registriert; beim Ende laeuft zwingend der Cleanup-Pfad
//! (Anruf beenden, Verzeichnis-Eintrag entfernen, Peers informieren) –
//! egal ob der Client sauber trennt, das Timeout zuschlaegt oder der
//! Server herunterfaehrt.
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen Ping
//! - Client muss innerhalb von `verbindungs_timeout_sek` irgendetwas senden
//! - Bei Timeout wird die Verbindung getrennt

use futures_util::{SinkExt, StreamExt};
use rufzeichen_core::ConnectionId;
use rufzeichen_protocol::control::{ControlMessage, ErrorCode};
use rufzeichen_protocol::wire::FrameCodec;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::server_state::SignalingState;

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Frames via `FrameCodec`, dispatcht an `MessageDispatcher` und
/// sendet Antworten sowie Broadcaster-Nachrichten zurueck. Laeuft in
/// einem eigenen tokio-Task.
pub struct ClientConnection {
    state: Arc<SignalingState>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<SignalingState>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Diese Methode laeuft bis die Verbindung getrennt wird oder ein
    /// Shutdown-Signal eingeht.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        let keepalive_intervall = Duration::from_secs(self.state.config.keepalive_sek);
        let timeout_dauer = Duration::from_secs(self.state.config.verbindungs_timeout_sek);

        // Server-vergebene Identitaet dieser Verbindung
        let verbindungs_id = ConnectionId::new();

        tracing::info!(peer = %peer_addr, verbindung = %verbindungs_id, "Neue Verbindung");

        // Framed-Stream mit FrameCodec einrichten
        let mut framed = Framed::new(stream, FrameCodec::new());

        // Broadcaster-Queue zuerst registrieren, damit die Peer-Liste aus
        // dem Connect-Handler bereits eingereiht werden kann
        let mut empfangs_queue = self.state.broadcaster.client_registrieren(verbindungs_id);

        let ctx = DispatcherContext {
            verbindungs_id,
            peer_addr,
        };
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));
        dispatcher.client_verbunden(&ctx);

        // Zeitpunkt des letzten empfangenen Frames
        let mut letzter_empfang = Instant::now();
        // Zeitpunkt des naechsten Ping
        let mut naechster_ping = Instant::now() + keepalive_intervall;
        let mut ping_request_id: u32 = 0;

        loop {
            let jetzt = Instant::now();

            // Timeout-Pruefung
            if jetzt.duration_since(letzter_empfang) > timeout_dauer {
                tracing::warn!(peer = %peer_addr, verbindung = %verbindungs_id, "Verbindungs-Timeout");
                break;
            }

            // Naechsten Ping-Zeitpunkt berechnen
            let ping_verzoegerung = if jetzt < naechster_ping {
                naechster_ping.duration_since(jetzt)
            } else {
                Duration::from_millis(1)
            };

            tokio::select! {
                // Eingehende Nachricht vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(nachricht)) => {
                            letzter_empfang = Instant::now();
                            tracing::trace!(
                                verbindung = %verbindungs_id,
                                request_id = nachricht.request_id,
                                "Nachricht empfangen"
                            );

                            if let Some(antwort) = dispatcher.dispatch(nachricht, &ctx) {
                                if let Err(e) = framed.send(antwort).await {
                                    tracing::warn!(
                                        verbindung = %verbindungs_id,
                                        fehler = %e,
                                        "Senden fehlgeschlagen"
                                    );
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                verbindung = %verbindungs_id,
                                fehler = %e,
                                "Frame-Lesefehler"
                            );
                            break;
                        }
                        None => {
                            // Verbindung geschlossen
                            tracing::info!(verbindung = %verbindungs_id, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehende Nachricht aus dem Broadcaster
                Some(ausgehend) = empfangs_queue.recv() => {
                    if let Err(e) = framed.send(ausgehend).await {
                        tracing::warn!(
                            verbindung = %verbindungs_id,
                            fehler = %e,
                            "Broadcast-Senden fehlgeschlagen"
                        );
                        break;
                    }
                }

                // Keepalive-Ping
                _ = tokio::time::sleep(ping_verzoegerung) => {
                    if jetzt >= naechster_ping {
                        ping_request_id = ping_request_id.wrapping_add(1);
                        let ts = std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_millis() as u64;
                        let ping = ControlMessage::ping(ping_request_id, ts);

                        if let Err(e) = framed.send(ping).await {
                            tracing::warn!(
                                verbindung = %verbindungs_id,
                                fehler = %e,
                                "Ping-Senden fehlgeschlagen"
                            );
                            break;
                        }
                        naechster_ping = Instant::now() + keepalive_intervall;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(verbindung = %verbindungs_id, "Shutdown-Signal – Verbindung wird getrennt");
                        // Abschiedsnachricht senden
                        let abschied = ControlMessage::error(
                            0,
                            ErrorCode::InternalError,
                            "Server wird heruntergefahren",
                        );
                        let _ = framed.send(abschied).await;
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende – gibt Anruf- und Presence-
        // Ressourcen deterministisch frei
        dispatcher.client_cleanup(verbindungs_id);

        tracing::info!(peer = %peer_addr, verbindung = %verbindungs_id, "Verbindungs-Task beendet");
    }
}
