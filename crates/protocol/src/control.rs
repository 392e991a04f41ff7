//! Control-Protokoll (TCP)
//!
//! Definiert alle Steuerungsnachrichten die ueber die TCP-Verbindung
//! zwischen Client und Signaling-Hub ausgetauscht werden.
//!
//! ## Design
//! - Request/Response Pattern: jede Nachricht hat eine `request_id: u32`;
//!   Server-initiierte Benachrichtigungen tragen `request_id = 0`
//! - JSON-Serialisierung via serde (TCP, nicht zeitkritisch)
//! - Tagged Enums fuer typsichere Nachrichtentypen

use rufzeichen_core::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Error-Responses
///
/// Nur fuer Protokoll-Muell (unerwartete Nachrichtentypen) – fachliche
/// Fehlschlaege (unbekanntes Ziel, besetzter Anrufer) werden nie an den
/// Client gemeldet, sondern nur geloggt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InternalError,
    InvalidRequest,
}

// ---------------------------------------------------------------------------
// Client-Informationen
// ---------------------------------------------------------------------------

/// Peer-sichtbare Informationen eines verbundenen Clients
///
/// `name` ist `None` solange der Client nicht eingeloggt ist. Unbenannte
/// Clients tauchen in keiner Peer-Liste auf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub id: ConnectionId,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Auth-Nachrichten
// ---------------------------------------------------------------------------

/// Login-Anfrage vom Client (Anzeigename vergeben)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Gewuenschter Anzeigename
    pub name: String,
}

/// Login-Antwort
///
/// `client` ist `None` wenn die Verbindung dem Hub nicht bekannt war.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub client: Option<ClientInfo>,
}

// ---------------------------------------------------------------------------
// Anruf-Nachrichten
// ---------------------------------------------------------------------------

/// Anruf anfordern – das Ziel klingelt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequestMessage {
    /// Verbindungs-ID des gewuenschten Gespraechspartners
    pub target_id: ConnectionId,
}

/// Klingelnden Anruf annehmen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAcceptRequest {
    /// Verbindungs-ID des Anrufers (Schluessel des Anruf-Eintrags)
    pub caller_id: ConnectionId,
}

/// Klingelnden Anruf ablehnen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallDeclineRequest {
    pub caller_id: ConnectionId,
}

/// Laufenden Anruf beenden
///
/// Der Hub sucht den Anruf ueber die eigene Verbindungs-ID des
/// Absenders; `peer_id` dient nur der Protokollierung.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEndRequest {
    pub peer_id: ConnectionId,
}

/// Anruf wurde beendet – geht an beide Teilnehmer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEndedMessage {
    /// Verbindung die das Ende ausgeloest hat
    pub initiator_id: ConnectionId,
}

// ---------------------------------------------------------------------------
// Signalisierungsdaten (SDP / ICE-Kandidaten, fuer den Hub opak)
// ---------------------------------------------------------------------------

/// ICE-Kandidat wie vom Media-Stack geliefert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub sdp: String,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: i32,
    #[serde(rename = "sdpMid")]
    pub sdp_mid: String,
}

/// Session-Beschreibung bzw. Kandidat zwischen zwei Gespraechspartnern
///
/// Der Hub leitet den Inhalt unveraendert weiter und interpretiert ihn nicht.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalingMessage {
    /// "offer", "answer" oder leer (reiner Kandidat)
    #[serde(rename = "type")]
    pub sdp_type: String,
    pub sdp: String,
    pub candidate: Option<Candidate>,
}

/// Signalisierungsdaten an den Gespraechspartner senden
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalingDataRequest {
    pub target_id: ConnectionId,
    pub data: SignalingMessage,
}

/// Empfangene Signalisierungsdaten (Server -> Ziel-Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveSignalingDataMessage {
    pub sender: ClientInfo,
    pub data: SignalingMessage,
}

// ---------------------------------------------------------------------------
// Presence-Benachrichtigungen
// ---------------------------------------------------------------------------

/// Liste der eingeloggten Peers – pro Empfaenger berechnet, ohne ihn selbst
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedClientsMessage {
    pub clients: Vec<ClientInfo>,
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Ping (Client -> Server oder Server -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingMessage {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (spiegelt Timestamp zurueck)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    /// Originaler Timestamp aus dem Ping
    pub echo_timestamp_ms: u64,
    /// Server-eigener Timestamp
    pub server_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Haupt-Enum: ControlPayload
// ---------------------------------------------------------------------------

/// Alle moeglichen Control-Nachrichten (typsicher via Tagged Enum)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlPayload {
    // Auth
    Login(LoginRequest),
    LoginResponse(LoginResponse),

    // Anrufe (Client -> Server)
    CallRequest(CallRequestMessage),
    CallAccept(CallAcceptRequest),
    CallDecline(CallDeclineRequest),
    CallEnd(CallEndRequest),
    CancelCalls,

    // Anrufe (Server -> Client)
    IncomingCall(ClientInfo),
    CallAccepted(ClientInfo),
    CallStarted(ClientInfo),
    CallDeclined(ClientInfo),
    CallEnded(CallEndedMessage),
    CancelAllCalls,

    // Signalisierungsdaten-Relay
    SignalingData(SignalingDataRequest),
    ReceiveSignalingData(ReceiveSignalingDataMessage),

    // Presence (Server -> Client)
    ConnectedClients(ConnectedClientsMessage),
    ClientDisconnected(ClientInfo),

    // Keepalive
    Ping(PingMessage),
    Pong(PongMessage),

    // Error
    Error(ErrorResponse),
}

/// Standardisierte Fehler-Antwort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Control-Frame (Umschlag fuer alle Nachrichten)
// ---------------------------------------------------------------------------

/// Control-Protokoll-Nachricht mit Request/Response-Zuordnung
///
/// Jede Anfrage traegt eine `request_id` die der Client vergibt. Der
/// Server kopiert die ID in die direkte Antwort; Benachrichtigungen die
/// der Server von sich aus verschickt tragen `request_id = 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    /// Nachrichten-ID fuer Request/Response-Zuordnung
    pub request_id: u32,
    /// Inhalt der Nachricht
    pub payload: ControlPayload,
}

impl ControlMessage {
    /// Erstellt eine neue Control-Nachricht
    pub fn new(request_id: u32, payload: ControlPayload) -> Self {
        Self {
            request_id,
            payload,
        }
    }

    /// Erstellt eine Server-initiierte Benachrichtigung (`request_id = 0`)
    pub fn benachrichtigung(payload: ControlPayload) -> Self {
        Self::new(0, payload)
    }

    /// Erstellt eine Ping-Nachricht
    pub fn ping(request_id: u32, timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            ControlPayload::Ping(PingMessage { timestamp_ms }),
        )
    }

    /// Erstellt eine Pong-Antwort
    pub fn pong(request_id: u32, echo_timestamp_ms: u64, server_timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            ControlPayload::Pong(PongMessage {
                echo_timestamp_ms,
                server_timestamp_ms,
            }),
        )
    }

    /// Erstellt eine Fehler-Antwort
    pub fn error(request_id: u32, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(
            request_id,
            ControlPayload::Error(ErrorResponse {
                code,
                message: message.into(),
            }),
        )
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
