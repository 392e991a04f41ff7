//! rufzeichen-protocol – Nachrichten- und Wire-Format
//!
//! Definiert das Control-Protokoll zwischen Client und Signaling-Hub
//! sowie das frame-basierte Wire-Format fuer TCP-Verbindungen.

pub mod control;
pub mod wire;

pub use control::{ClientInfo, ControlMessage, ControlPayload, ErrorCode, SignalingMessage};
pub use wire::FrameCodec;
