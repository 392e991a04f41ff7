//! Handler fuer alle Hub-Ereignisse
//!
//! Jeder Handler ist fuer einen bestimmten Ereignistyp zustaendig und
//! hat Zugriff auf den gemeinsamen SignalingState. Grundregel: zuerst
//! die Store-Mutation, danach die Benachrichtigungen – das Ergebnis der
//! Mutation ist die einzige Verzweigungsbedingung fuer das Senden.

pub mod call_handler;
pub mod client_handler;
pub mod relay_handler;
