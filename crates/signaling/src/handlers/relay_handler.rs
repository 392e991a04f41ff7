//! Relay-Handler – Weiterleitung der Signalisierungsdaten
//!
//! Leitet SDP-Beschreibungen und ICE-Kandidaten unveraendert zwischen
//! den beiden Teilnehmern eines aktiven Anrufs weiter. Die Autorisierung
//! ist eine Sicherheitsgrenze: ohne aktiven Anruf dessen Teilnehmermenge
//! exakt {Absender, Ziel} ist, wird nichts weitergeleitet – auch keine
//! Fehlermeldung.

use rufzeichen_core::ConnectionId;
use rufzeichen_protocol::control::{
    ControlMessage, ControlPayload, ReceiveSignalingDataMessage, SignalingDataRequest,
};
use std::sync::Arc;

use crate::registry::AnrufZustand;
use crate::server_state::SignalingState;

/// Verarbeitet Signalisierungsdaten vom Absender an sein Gegenueber
pub fn handle_signaling_data(
    request: SignalingDataRequest,
    verbindungs_id: ConnectionId,
    state: &Arc<SignalingState>,
) {
    let absender = match state.directory.holen(&verbindungs_id) {
        Some(e) => e,
        None => {
            tracing::debug!(verbindung = %verbindungs_id, "Relay von unbekannter Verbindung");
            return;
        }
    };
    if state.directory.holen(&request.target_id).is_none() {
        tracing::debug!(ziel = %request.target_id, "Relay an unbekanntes Ziel");
        return;
    }

    // Sicherheitsgrenze: nur innerhalb eines aktiven Anrufs, dessen
    // Teilnehmermenge exakt {Absender, Ziel} ist
    let autorisiert = state
        .registry
        .zwischen(&verbindungs_id, &request.target_id)
        .map(|anruf| anruf.zustand == AnrufZustand::Aktiv)
        .unwrap_or(false);

    if !autorisiert {
        tracing::debug!(
            absender = %verbindungs_id,
            ziel = %request.target_id,
            "Relay ohne passenden aktiven Anruf verworfen"
        );
        return;
    }

    state.broadcaster.an_client_senden(
        &request.target_id,
        ControlMessage::benachrichtigung(ControlPayload::ReceiveSignalingData(
            ReceiveSignalingDataMessage {
                sender: absender.als_info(),
                data: request.data,
            },
        )),
    );

    tracing::debug!(
        absender = %verbindungs_id,
        ziel = %request.target_id,
        "Signalisierungsdaten weitergeleitet"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::call_handler::{handle_call_accept, handle_call_request};
    use crate::handlers::client_handler::{handle_connect, handle_login};
    use crate::server_state::SignalingConfig;
    use rufzeichen_protocol::control::{
        CallAcceptRequest, CallRequestMessage, LoginRequest, SignalingMessage,
    };
    use tokio::sync::mpsc;

    fn test_state() -> Arc<SignalingState> {
        SignalingState::neu(SignalingConfig::default())
    }

    fn eingeloggter_client(
        state: &Arc<SignalingState>,
        name: &str,
    ) -> (ConnectionId, mpsc::Receiver<ControlMessage>) {
        let id = ConnectionId::new();
        let mut rx = state.broadcaster.client_registrieren(id);
        handle_connect(id, state);
        handle_login(
            LoginRequest {
                name: name.to_string(),
            },
            1,
            id,
            state,
        );
        while rx.try_recv().is_ok() {}
        (id, rx)
    }

    fn test_offer() -> SignalingMessage {
        SignalingMessage {
            sdp_type: "offer".to_string(),
            sdp: "v=0...".to_string(),
            candidate: None,
        }
    }

    fn aktiver_anruf(
        state: &Arc<SignalingState>,
        a: ConnectionId,
        b: ConnectionId,
        rx_a: &mut mpsc::Receiver<ControlMessage>,
        rx_b: &mut mpsc::Receiver<ControlMessage>,
    ) {
        handle_call_request(CallRequestMessage { target_id: b }, a, state);
        handle_call_accept(CallAcceptRequest { caller_id: a }, b, state);
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}
    }

    #[tokio::test]
    async fn relay_im_aktiven_anruf() {
        let state = test_state();
        let (a, mut rx_a) = eingeloggter_client(&state, "alice");
        let (b, mut rx_b) = eingeloggter_client(&state, "bob");
        aktiver_anruf(&state, a, b, &mut rx_a, &mut rx_b);

        handle_signaling_data(
            SignalingDataRequest {
                target_id: b,
                data: test_offer(),
            },
            a,
            &state,
        );

        let msg = rx_b.try_recv().expect("ReceiveSignalingData erwartet");
        if let ControlPayload::ReceiveSignalingData(weitergeleitet) = msg.payload {
            assert_eq!(weitergeleitet.sender.id, a);
            assert_eq!(weitergeleitet.data, test_offer());
        } else {
            panic!("Erwartet ReceiveSignalingData");
        }
        // Der Absender selbst bekommt nichts
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn relay_ohne_anruf_wird_verworfen() {
        let state = test_state();
        let (a, _rx_a) = eingeloggter_client(&state, "alice");
        let (b, mut rx_b) = eingeloggter_client(&state, "bob");

        handle_signaling_data(
            SignalingDataRequest {
                target_id: b,
                data: test_offer(),
            },
            a,
            &state,
        );
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn relay_im_klingelnden_anruf_wird_verworfen() {
        let state = test_state();
        let (a, _rx_a) = eingeloggter_client(&state, "alice");
        let (b, mut rx_b) = eingeloggter_client(&state, "bob");

        handle_call_request(CallRequestMessage { target_id: b }, a, &state);
        while rx_b.try_recv().is_ok() {}

        handle_signaling_data(
            SignalingDataRequest {
                target_id: b,
                data: test_offer(),
            },
            a,
            &state,
        );
        assert!(rx_b.try_recv().is_err(), "Klingelt reicht nicht fuer Relay");
    }

    #[tokio::test]
    async fn relay_an_unbeteiligtes_ziel_wird_verworfen() {
        let state = test_state();
        let (a, mut rx_a) = eingeloggter_client(&state, "alice");
        let (b, mut rx_b) = eingeloggter_client(&state, "bob");
        let (c, mut rx_c) = eingeloggter_client(&state, "carol");
        aktiver_anruf(&state, a, b, &mut rx_a, &mut rx_b);

        // a ist im Anruf mit b, versucht aber an c zu senden
        handle_signaling_data(
            SignalingDataRequest {
                target_id: c,
                data: test_offer(),
            },
            a,
            &state,
        );
        assert!(rx_c.try_recv().is_err(), "c ist nicht Teilnehmer des Anrufs");
    }

    #[tokio::test]
    async fn relay_von_unbeteiligtem_absender_wird_verworfen() {
        let state = test_state();
        let (a, mut rx_a) = eingeloggter_client(&state, "alice");
        let (b, mut rx_b) = eingeloggter_client(&state, "bob");
        let (c, _rx_c) = eingeloggter_client(&state, "carol");
        aktiver_anruf(&state, a, b, &mut rx_a, &mut rx_b);

        // c haengt nicht im Anruf und darf b nichts unterschieben
        handle_signaling_data(
            SignalingDataRequest {
                target_id: b,
                data: test_offer(),
            },
            c,
            &state,
        );
        assert!(rx_b.try_recv().is_err());
    }
}
