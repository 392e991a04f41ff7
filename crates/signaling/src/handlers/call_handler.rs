//! Anruf-Handler – CallRequest, Accept, Decline, End, CancelCalls
//!
//! Implementiert die Anruf-Zustandsmaschine des Hubs. Jeder Handler
//! mutiert zuerst die Registry; das Ergebnis der Mutation entscheidet
//! allein darueber welche Benachrichtigungen gesendet werden. Fachliche
//! Fehlschlaege (unbekanntes Ziel, besetzte Teilnehmer, fehlender
//! Anruf) werden geloggt und still verworfen – der ausbleibende Event
//! ist das Fehlersignal fuer den Client.

use rufzeichen_core::ConnectionId;
use rufzeichen_protocol::control::{
    CallAcceptRequest, CallDeclineRequest, CallEndRequest, CallEndedMessage, CallRequestMessage,
    ControlMessage, ControlPayload,
};
use std::sync::Arc;

use crate::registry::AnrufStartFehler;
use crate::server_state::SignalingState;

/// Verarbeitet eine Anruf-Anfrage
///
/// Beide Seiten muessen verbunden und eingeloggt sein. Bei Erfolg
/// klingelt es beim Ziel (`IncomingCall`); bei jedem Fehlschlag wird
/// keinerlei Nachricht gesendet.
pub fn handle_call_request(
    request: CallRequestMessage,
    verbindungs_id: ConnectionId,
    state: &Arc<SignalingState>,
) {
    let anrufer = match state.directory.holen(&verbindungs_id) {
        Some(e) if e.ist_benannt() => e,
        _ => {
            tracing::info!(verbindung = %verbindungs_id, "Anrufer unbekannt oder nicht eingeloggt");
            return;
        }
    };

    let angerufener = match state.directory.holen(&request.target_id) {
        Some(e) if e.ist_benannt() => e,
        _ => {
            tracing::info!(ziel = %request.target_id, "Angerufener unbekannt oder nicht eingeloggt");
            return;
        }
    };

    match state.registry.starten(verbindungs_id, request.target_id) {
        Ok(_) => {
            state.broadcaster.an_client_senden(
                &request.target_id,
                ControlMessage::benachrichtigung(ControlPayload::IncomingCall(anrufer.als_info())),
            );
            tracing::info!(
                anrufer = %verbindungs_id,
                angerufener = %request.target_id,
                anrufer_name = anrufer.name.as_deref().unwrap_or_default(),
                angerufener_name = angerufener.name.as_deref().unwrap_or_default(),
                "Anruf angefordert"
            );
        }
        Err(AnrufStartFehler::AnruferBesetzt) => {
            tracing::info!(anrufer = %verbindungs_id, "Anrufer ist bereits im Gespraech");
        }
        Err(AnrufStartFehler::AngerufenerBesetzt) => {
            tracing::info!(angerufener = %request.target_id, "Angerufener ist bereits im Gespraech");
        }
    }
}

/// Verarbeitet die Annahme eines klingelnden Anrufs
///
/// Der Anrufer erhaelt `CallAccepted(Angerufener)`, der Angerufene
/// `CallStarted(Anrufer)`.
pub fn handle_call_accept(
    request: CallAcceptRequest,
    verbindungs_id: ConnectionId,
    state: &Arc<SignalingState>,
) {
    let anruf = match state.registry.annehmen(&request.caller_id) {
        Some(a) => a,
        None => {
            tracing::info!(
                verbindung = %verbindungs_id,
                anrufer = %request.caller_id,
                "Kein klingelnder Anruf zum Annehmen gefunden"
            );
            return;
        }
    };

    let anrufer = state.directory.holen(&anruf.anrufer_id);
    let angerufener = state.directory.holen(&anruf.angerufener_id);

    if let (Some(anrufer), Some(angerufener)) = (anrufer, angerufener) {
        state.broadcaster.an_client_senden(
            &anrufer.id,
            ControlMessage::benachrichtigung(ControlPayload::CallAccepted(angerufener.als_info())),
        );
        state.broadcaster.an_client_senden(
            &angerufener.id,
            ControlMessage::benachrichtigung(ControlPayload::CallStarted(anrufer.als_info())),
        );
        tracing::info!(
            anrufer = %anrufer.id,
            angerufener = %angerufener.id,
            "Anruf angenommen"
        );
    }
}

/// Verarbeitet die Ablehnung eines Anrufs
///
/// Entfernt den Eintrag unabhaengig vom Zustand; der Anrufer erhaelt
/// `CallDeclined(Angerufener)`.
pub fn handle_call_decline(
    request: CallDeclineRequest,
    verbindungs_id: ConnectionId,
    state: &Arc<SignalingState>,
) {
    let anruf = match state.registry.ablehnen(&request.caller_id) {
        Some(a) => a,
        None => {
            tracing::info!(
                verbindung = %verbindungs_id,
                anrufer = %request.caller_id,
                "Kein Anruf zum Ablehnen gefunden"
            );
            return;
        }
    };

    let anrufer = state.directory.holen(&anruf.anrufer_id);
    let angerufener = state.directory.holen(&anruf.angerufener_id);

    if let (Some(anrufer), Some(angerufener)) = (anrufer, angerufener) {
        state.broadcaster.an_client_senden(
            &anrufer.id,
            ControlMessage::benachrichtigung(ControlPayload::CallDeclined(angerufener.als_info())),
        );
        tracing::info!(
            anrufer = %anrufer.id,
            angerufener = %angerufener.id,
            "Anruf abgelehnt"
        );
    }
}

/// Verarbeitet das Beenden eines Anrufs
///
/// Der Anruf wird ueber die eigene Verbindungs-ID des Absenders gesucht
/// (symmetrisch ueber beide Rollen); beide Teilnehmer – auch der
/// Ausloeser – erhalten `CallEnded`.
pub fn handle_call_end(
    request: CallEndRequest,
    verbindungs_id: ConnectionId,
    state: &Arc<SignalingState>,
) {
    let anruf = match state.registry.beenden(&verbindungs_id) {
        Some(a) => a,
        None => {
            tracing::info!(
                verbindung = %verbindungs_id,
                peer = %request.peer_id,
                "Kein laufender Anruf zum Beenden gefunden"
            );
            return;
        }
    };

    let nachricht = ControlMessage::benachrichtigung(ControlPayload::CallEnded(CallEndedMessage {
        initiator_id: verbindungs_id,
    }));
    state
        .broadcaster
        .an_client_senden(&anruf.anrufer_id, nachricht.clone());
    state
        .broadcaster
        .an_client_senden(&anruf.angerufener_id, nachricht);

    tracing::info!(
        initiator = %verbindungs_id,
        anrufer = %anruf.anrufer_id,
        angerufener = %anruf.angerufener_id,
        "Anruf beendet"
    );
}

/// Verarbeitet den administrativen Abbruch aller Anrufe
pub fn handle_cancel_calls(verbindungs_id: ConnectionId, state: &Arc<SignalingState>) {
    state.registry.alle_loeschen();
    state
        .broadcaster
        .an_alle_senden(ControlMessage::benachrichtigung(
            ControlPayload::CancelAllCalls,
        ));
    tracing::info!(ausgeloest_von = %verbindungs_id, "Alle Anrufe abgebrochen");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
