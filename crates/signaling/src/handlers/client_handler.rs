//! Client-Handler – Connect, Disconnect, Login, Peer-Listen
//!
//! Verwaltet den Presence-Lebenszyklus einer Verbindung und verteilt
//! die peer-sichtbaren Listen. Unbenannte Clients tauchen in keiner
//! Liste auf und erhalten auch keine Listen-Updates.

use rufzeichen_core::ConnectionId;
use rufzeichen_protocol::control::{
    CallEndedMessage, ClientInfo, ConnectedClientsMessage, ControlMessage, ControlPayload,
    LoginRequest, LoginResponse,
};
use std::sync::Arc;

use crate::server_state::SignalingState;

/// Verarbeitet eine neu aufgebaute Verbindung
///
/// Registriert die Verbindung im Verzeichnis und schickt ihr – und nur
/// ihr – die aktuelle Liste der eingeloggten Peers.
pub fn handle_connect(verbindungs_id: ConnectionId, state: &Arc<SignalingState>) {
    state.directory.verbinden(verbindungs_id);

    let peers: Vec<ClientInfo> = state
        .directory
        .benannte()
        .iter()
        .filter(|e| e.id != verbindungs_id)
        .map(|e| e.als_info())
        .collect();

    state.broadcaster.an_client_senden(
        &verbindungs_id,
        ControlMessage::benachrichtigung(ControlPayload::ConnectedClients(
            ConnectedClientsMessage { clients: peers },
        )),
    );

    tracing::info!(verbindung = %verbindungs_id, "Client verbunden");
}

/// Verarbeitet eine getrennte Verbindung
///
/// Reihenfolge ist bewusst: zuerst die Registry (ein haengender
/// Anruf-Eintrag waere schaedlicher als ein haengender Verzeichnis-
/// Eintrag), dann das Verzeichnis, dann die Benachrichtigungen.
pub fn handle_disconnect(verbindungs_id: ConnectionId, state: &Arc<SignalingState>) {
    // Laufenden Anruf beenden und den anderen Teilnehmer informieren
    if let Some(anruf) = state.registry.beenden(&verbindungs_id) {
        let anderer = anruf.anderer_teilnehmer(&verbindungs_id);
        state.broadcaster.an_client_senden(
            &anderer,
            ControlMessage::benachrichtigung(ControlPayload::CallEnded(CallEndedMessage {
                initiator_id: verbindungs_id,
            })),
        );
        tracing::info!(
            verbindung = %verbindungs_id,
            anderer = %anderer,
            "Anruf durch Verbindungsabbruch beendet"
        );
    }

    if let Some(entfernt) = state.directory.trennen(&verbindungs_id) {
        benannte_liste_verteilen(state);
        state.broadcaster.an_alle_senden(ControlMessage::benachrichtigung(
            ControlPayload::ClientDisconnected(entfernt.als_info()),
        ));
        tracing::info!(
            verbindung = %verbindungs_id,
            name = entfernt.name.as_deref().unwrap_or("<unbenannt>"),
            "Client getrennt"
        );
    }
}

/// Verarbeitet Login-Anfrage (Anzeigename vergeben)
///
/// Wiederholter Login ist ein Namens-Update. Schlaegt der Login fehl
/// (Verbindung nie registriert), erhaelt der Client eine leere Antwort
/// und keine weitere Fehlermeldung.
pub fn handle_login(
    request: LoginRequest,
    request_id: u32,
    verbindungs_id: ConnectionId,
    state: &Arc<SignalingState>,
) -> ControlMessage {
    match state.directory.name_setzen(&verbindungs_id, request.name) {
        Some(eintrag) => {
            benannte_liste_verteilen(state);
            tracing::info!(
                verbindung = %verbindungs_id,
                name = eintrag.name.as_deref().unwrap_or_default(),
                "Client eingeloggt"
            );
            ControlMessage::new(
                request_id,
                ControlPayload::LoginResponse(LoginResponse {
                    client: Some(eintrag.als_info()),
                }),
            )
        }
        None => {
            tracing::warn!(verbindung = %verbindungs_id, "Login ohne registrierte Verbindung");
            ControlMessage::new(
                request_id,
                ControlPayload::LoginResponse(LoginResponse { client: None }),
            )
        }
    }
}

/// Verteilt die Peer-Liste an alle eingeloggten Clients
///
/// Jeder Empfaenger bekommt eine individuell berechnete Liste ohne sich
/// selbst. Das kostet O(n^2) Sendevorgaenge pro Login/Disconnect –
/// bekannte Skalierungsgrenze, bei den erwarteten Teilnehmerzahlen
/// unkritisch.
pub fn benannte_liste_verteilen(state: &Arc<SignalingState>) {
    let benannte = state.directory.benannte();

    for empfaenger in &benannte {
        let andere: Vec<ClientInfo> = benannte
            .iter()
            .filter(|e| e.id != empfaenger.id)
            .map(|e| e.als_info())
            .collect();

        state.broadcaster.an_client_senden(
            &empfaenger.id,
            ControlMessage::benachrichtigung(ControlPayload::ConnectedClients(
                ConnectedClientsMessage { clients: andere },
            )),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
