//! Message-Dispatcher – Routet ControlMessages an die richtigen Handler
//!
//! Der Dispatcher empfaengt ControlMessages von einer ClientConnection,
//! bestimmt den richtigen Handler und gibt – falls vorhanden – die
//! direkte Antwort zurueck. Benachrichtigungen an andere Clients laufen
//! ueber den EventBroadcaster.
//!
//! Die Identitaet des Absenders kommt immer aus dem Verbindungs-Kontext,
//! nie aus der Nachricht selbst – ein Client kann sich nicht als andere
//! Verbindung ausgeben.
//!
//! Jede Hub-Operation ist reine In-Memory-Arbeit; der Dispatch blockiert
//! nie und hat deshalb keine async-Signatur.

use rufzeichen_core::ConnectionId;
use rufzeichen_protocol::control::{ControlMessage, ControlPayload, ErrorCode};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::handlers::{call_handler, client_handler, relay_handler};
use crate::server_state::SignalingState;

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
pub struct DispatcherContext {
    /// Server-vergebene Identitaet dieser Verbindung
    pub verbindungs_id: ConnectionId,
    /// Peer-Adresse fuer Protokollierung
    pub peer_addr: SocketAddr,
}

/// Zentraler Message-Dispatcher
///
/// Routet eingehende ControlMessages an die entsprechenden Handler und
/// gibt die direkte Antwort-ControlMessage zurueck.
pub struct MessageDispatcher {
    state: Arc<SignalingState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Registriert eine neue Verbindung und schickt ihr die Peer-Liste
    pub fn client_verbunden(&self, ctx: &DispatcherContext) {
        client_handler::handle_connect(ctx.verbindungs_id, &self.state);
    }

    /// Bereinigt alle Ressourcen einer Verbindung beim Trennen
    ///
    /// Registry zuerst, dann Verzeichnis (siehe client_handler), zuletzt
    /// der Broadcaster-Eintrag.
    pub fn client_cleanup(&self, verbindungs_id: ConnectionId) {
        client_handler::handle_disconnect(verbindungs_id, &self.state);
        self.state.broadcaster.client_entfernen(&verbindungs_id);
        tracing::debug!(verbindung = %verbindungs_id, "Client-Ressourcen bereinigt");
    }

    /// Verarbeitet eine eingehende ControlMessage und gibt die Antwort zurueck
    ///
    /// Gibt `None` zurueck wenn keine direkte Antwort gesendet werden
    /// soll – die meisten Anruf-Ereignisse antworten ausschliesslich
    /// ueber Benachrichtigungen an die betroffenen Verbindungen.
    pub fn dispatch(
        &self,
        message: ControlMessage,
        ctx: &DispatcherContext,
    ) -> Option<ControlMessage> {
        let request_id = message.request_id;

        match message.payload {
            // -------------------------------------------------------------------
            // Auth / Presence
            // -------------------------------------------------------------------
            ControlPayload::Login(req) => Some(client_handler::handle_login(
                req,
                request_id,
                ctx.verbindungs_id,
                &self.state,
            )),

            // -------------------------------------------------------------------
            // Anrufe
            // -------------------------------------------------------------------
            ControlPayload::CallRequest(req) => {
                call_handler::handle_call_request(req, ctx.verbindungs_id, &self.state);
                None
            }

            ControlPayload::CallAccept(req) => {
                call_handler::handle_call_accept(req, ctx.verbindungs_id, &self.state);
                None
            }

            ControlPayload::CallDecline(req) => {
                call_handler::handle_call_decline(req, ctx.verbindungs_id, &self.state);
                None
            }

            ControlPayload::CallEnd(req) => {
                call_handler::handle_call_end(req, ctx.verbindungs_id, &self.state);
                None
            }

            ControlPayload::CancelCalls => {
                call_handler::handle_cancel_calls(ctx.verbindungs_id, &self.state);
                None
            }

            // -------------------------------------------------------------------
            // Signalisierungsdaten-Relay
            // -------------------------------------------------------------------
            ControlPayload::SignalingData(req) => {
                relay_handler::handle_signaling_data(req, ctx.verbindungs_id, &self.state);
                None
            }

            // -------------------------------------------------------------------
            // Keepalive
            // -------------------------------------------------------------------
            ControlPayload::Ping(ping) => {
                let server_ts = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;
                Some(ControlMessage::pong(
                    request_id,
                    ping.timestamp_ms,
                    server_ts,
                ))
            }

            ControlPayload::Pong(_) => {
                // Pong-Antworten vom Client werden nur geloggt (RTT-Messung)
                tracing::trace!(peer = %ctx.peer_addr, "Pong empfangen");
                None
            }

            // -------------------------------------------------------------------
            // Unerwartete Server->Client Nachrichten
            // -------------------------------------------------------------------
            ControlPayload::LoginResponse(_)
            | ControlPayload::IncomingCall(_)
            | ControlPayload::CallAccepted(_)
            | ControlPayload::CallStarted(_)
            | ControlPayload::CallDeclined(_)
            | ControlPayload::CallEnded(_)
            | ControlPayload::CancelAllCalls
            | ControlPayload::ReceiveSignalingData(_)
            | ControlPayload::ConnectedClients(_)
            | ControlPayload::ClientDisconnected(_)
            | ControlPayload::Error(_) => {
                tracing::warn!(
                    verbindung = %ctx.verbindungs_id,
                    request_id,
                    "Unerwartete Server->Client Nachricht vom Client empfangen"
                );
                Some(ControlMessage::error(
                    request_id,
                    ErrorCode::InvalidRequest,
                    "Unerwartete Nachricht",
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
