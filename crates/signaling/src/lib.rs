//! rufzeichen-signaling – Presence- und Anruf-Signalisierung
//!
//! Dieser Crate implementiert den Signaling-Hub fuer Rufzeichen. Er
//! verwaltet TCP-Verbindungen, das Client-Verzeichnis (wer ist online,
//! unter welchem Namen) und die Anruf-Zustandsmaschine (Klingelt ->
//! Aktiv -> beendet) inklusive Weiterleitung der SDP/ICE-Payloads
//! zwischen den Gespraechspartnern.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (SignalingServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- client_handler   (Connect, Disconnect, Login, Peer-Listen)
//!     +-- call_handler     (CallRequest, Accept, Decline, End, CancelCalls)
//!     +-- relay_handler    (SignalingData-Weiterleitung)
//!
//! ClientDirectory  – Wer ist verbunden, wer ist eingeloggt
//! CallRegistry     – Welche Anrufe klingeln bzw. laufen
//! EventBroadcaster – Nachrichten an Clients senden
//! ```
//!
//! Der Hub selbst fuehrt keine I/O aus: jede Hub-Operation ist reine
//! In-Memory-Arbeit (Mutation zuerst, Benachrichtigungen danach), die
//! beiden Stores kennen weder einander noch den Transport.

pub mod broadcast;
pub mod connection;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod server_state;
pub mod tcp;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use directory::{ClientDirectory, ClientEintrag};
pub use dispatcher::MessageDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use registry::{AnrufInfo, AnrufStartFehler, AnrufZustand, CallRegistry};
pub use server_state::{SignalingConfig, SignalingState};
pub use tcp::SignalingServer;
