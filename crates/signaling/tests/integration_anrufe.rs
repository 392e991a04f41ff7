//! Integrationstests fuer den kompletten Anruf-Ablauf auf Dispatcher-Ebene
//!
//! Simuliert Clients als registrierte Broadcaster-Queues und treibt den
//! Hub ueber den MessageDispatcher – derselbe Pfad den eine echte
//! TCP-Verbindung nimmt, nur ohne Socket.

use rufzeichen_core::ConnectionId;
use rufzeichen_protocol::control::{
    CallAcceptRequest, CallRequestMessage, ControlMessage, ControlPayload, LoginRequest,
    SignalingDataRequest, SignalingMessage,
};
use rufzeichen_signaling::dispatcher::{DispatcherContext, MessageDispatcher};
use rufzeichen_signaling::server_state::{SignalingConfig, SignalingState};
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Test-Harness
// ---------------------------------------------------------------------------

struct TestClient {
    ctx: DispatcherContext,
    rx: mpsc::Receiver<ControlMessage>,
}

impl TestClient {
    /// Verbindet einen neuen Client mit dem Hub
    fn verbinden(dispatcher: &MessageDispatcher, state: &Arc<SignalingState>) -> Self {
        let verbindungs_id = ConnectionId::new();
        let rx = state.broadcaster.client_registrieren(verbindungs_id);
        let ctx = DispatcherContext {
            verbindungs_id,
            peer_addr: "127.0.0.1:9000".parse().unwrap(),
        };
        dispatcher.client_verbunden(&ctx);
        Self { ctx, rx }
    }

    fn id(&self) -> ConnectionId {
        self.ctx.verbindungs_id
    }

    fn senden(&self, dispatcher: &MessageDispatcher, payload: ControlPayload) -> Option<ControlMessage> {
        dispatcher.dispatch(ControlMessage::new(1, payload), &self.ctx)
    }

    fn login(&self, dispatcher: &MessageDispatcher, name: &str) -> Option<ControlMessage> {
        self.senden(
            dispatcher,
            ControlPayload::Login(LoginRequest {
                name: name.to_string(),
            }),
        )
    }

    /// Naechste empfangene Nachricht, falls vorhanden
    fn empfangen(&mut self) -> Option<ControlMessage> {
        self.rx.try_recv().ok()
    }

    /// Verwirft alle anstehenden Nachrichten
    fn leeren(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

fn test_hub() -> (MessageDispatcher, Arc<SignalingState>) {
    let state = SignalingState::neu(SignalingConfig::default());
    (MessageDispatcher::neu(Arc::clone(&state)), state)
}

fn test_offer() -> SignalingMessage {
    SignalingMessage {
        sdp_type: "offer".to_string(),
        sdp: "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\n".to_string(),
        candidate: None,
    }
}

// ---------------------------------------------------------------------------
// Szenarien
// ---------------------------------------------------------------------------

#[tokio::test]
async fn kompletter_anruf_ablauf() {
    let (dispatcher, state) = test_hub();

    // A und B verbinden und loggen sich ein
    let mut a = TestClient::verbinden(&dispatcher, &state);
    let mut b = TestClient::verbinden(&dispatcher, &state);
    a.login(&dispatcher, "Alice");
    a.leeren();
    b.leeren();
    b.login(&dispatcher, "Bob");

    // Beide erhalten die Peer-Liste ohne sich selbst
    let liste_a = a.empfangen().expect("Peer-Liste fuer A erwartet");
    if let ControlPayload::ConnectedClients(liste) = liste_a.payload {
        assert_eq!(liste.clients.len(), 1);
        assert_eq!(liste.clients[0].id, b.id());
        assert_eq!(liste.clients[0].name.as_deref(), Some("Bob"));
    } else {
        panic!("Erwartet ConnectedClients");
    }
    let liste_b = b.empfangen().expect("Peer-Liste fuer B erwartet");
    if let ControlPayload::ConnectedClients(liste) = liste_b.payload {
        assert_eq!(liste.clients.len(), 1);
        assert_eq!(liste.clients[0].id, a.id());
        assert_eq!(liste.clients[0].name.as_deref(), Some("Alice"));
    } else {
        panic!("Erwartet ConnectedClients");
    }

    // A ruft B an – B klingelt
    a.senden(
        &dispatcher,
        ControlPayload::CallRequest(CallRequestMessage { target_id: b.id() }),
    );
    let klingeln = b.empfangen().expect("IncomingCall erwartet");
    if let ControlPayload::IncomingCall(anrufer) = klingeln.payload {
        assert_eq!(anrufer.id, a.id());
        assert_eq!(anrufer.name.as_deref(), Some("Alice"));
    } else {
        panic!("Erwartet IncomingCall");
    }

    // B nimmt an
    b.senden(
        &dispatcher,
        ControlPayload::CallAccept(CallAcceptRequest { caller_id: a.id() }),
    );
    let angenommen = a.empfangen().expect("CallAccepted erwartet");
    if let ControlPayload::CallAccepted(angerufener) = angenommen.payload {
        assert_eq!(angerufener.name.as_deref(), Some("Bob"));
    } else {
        panic!("Erwartet CallAccepted");
    }
    let gestartet = b.empfangen().expect("CallStarted erwartet");
    if let ControlPayload::CallStarted(anrufer) = gestartet.payload {
        assert_eq!(anrufer.name.as_deref(), Some("Alice"));
    } else {
        panic!("Erwartet CallStarted");
    }

    // A schickt ein Offer – B empfaengt es unveraendert
    a.senden(
        &dispatcher,
        ControlPayload::SignalingData(SignalingDataRequest {
            target_id: b.id(),
            data: test_offer(),
        }),
    );
    let offer = b.empfangen().expect("ReceiveSignalingData erwartet");
    if let ControlPayload::ReceiveSignalingData(daten) = offer.payload {
        assert_eq!(daten.sender.id, a.id());
        assert_eq!(daten.data, test_offer());
    } else {
        panic!("Erwartet ReceiveSignalingData");
    }

    // B trennt die Verbindung – A erfaehrt vom Anruf-Ende und vom Abgang
    let b_id = b.id();
    dispatcher.client_cleanup(b_id);

    let ende = a.empfangen().expect("CallEnded erwartet");
    if let ControlPayload::CallEnded(e) = ende.payload {
        assert_eq!(e.initiator_id, b_id);
    } else {
        panic!("Erwartet CallEnded");
    }
    let liste = a.empfangen().expect("Aktualisierte Peer-Liste erwartet");
    if let ControlPayload::ConnectedClients(l) = liste.payload {
        assert!(l.clients.is_empty());
    } else {
        panic!("Erwartet ConnectedClients");
    }
    let abgang = a.empfangen().expect("ClientDisconnected erwartet");
    if let ControlPayload::ClientDisconnected(info) = abgang.payload {
        assert_eq!(info.id, b_id);
        assert_eq!(info.name.as_deref(), Some("Bob"));
    } else {
        panic!("Erwartet ClientDisconnected");
    }

    // Beide Stores sind bereinigt
    assert!(state.registry.von_partei(&a.id()).is_none());
    assert!(!state.directory.ist_verbunden(&b_id));
}

#[tokio::test]
async fn doppelte_anfrage_ist_noop() {
    let (dispatcher, state) = test_hub();
    let mut a = TestClient::verbinden(&dispatcher, &state);
    let mut b = TestClient::verbinden(&dispatcher, &state);
    a.login(&dispatcher, "Alice");
    b.login(&dispatcher, "Bob");
    a.leeren();
    b.leeren();

    a.senden(
        &dispatcher,
        ControlPayload::CallRequest(CallRequestMessage { target_id: b.id() }),
    );
    assert!(b.empfangen().is_some(), "Erstes IncomingCall erwartet");

    // Zweite Anfrage ohne Reaktion von B: kein zweites Klingeln,
    // erster Anruf bleibt unveraendert
    a.senden(
        &dispatcher,
        ControlPayload::CallRequest(CallRequestMessage { target_id: b.id() }),
    );
    assert!(b.empfangen().is_none());

    let anruf = state.registry.von_partei(&a.id()).expect("Anruf erwartet");
    assert_eq!(anruf.angerufener_id, b.id());
}

#[tokio::test]
async fn besetzter_angerufener_klingelt_nicht_erneut() {
    let (dispatcher, state) = test_hub();
    let mut a = TestClient::verbinden(&dispatcher, &state);
    let mut b = TestClient::verbinden(&dispatcher, &state);
    let mut c = TestClient::verbinden(&dispatcher, &state);
    a.login(&dispatcher, "Alice");
    b.login(&dispatcher, "Bob");
    c.login(&dispatcher, "Carol");
    a.leeren();
    b.leeren();
    c.leeren();

    a.senden(
        &dispatcher,
        ControlPayload::CallRequest(CallRequestMessage { target_id: b.id() }),
    );
    assert!(b.empfangen().is_some());

    // C versucht den bereits klingelnden B zu erreichen
    c.senden(
        &dispatcher,
        ControlPayload::CallRequest(CallRequestMessage { target_id: b.id() }),
    );
    assert!(b.empfangen().is_none(), "B ist besetzt und darf nicht erneut klingeln");
    assert!(state.registry.von_partei(&c.id()).is_none());
}

#[tokio::test]
async fn relay_ohne_aktiven_anruf_bleibt_stumm() {
    let (dispatcher, state) = test_hub();
    let mut a = TestClient::verbinden(&dispatcher, &state);
    let mut b = TestClient::verbinden(&dispatcher, &state);
    a.login(&dispatcher, "Alice");
    b.login(&dispatcher, "Bob");
    a.leeren();
    b.leeren();

    // Kein Anruf: Relay wird still verworfen, keine Fehlermeldung an A
    let antwort = a.senden(
        &dispatcher,
        ControlPayload::SignalingData(SignalingDataRequest {
            target_id: b.id(),
            data: test_offer(),
        }),
    );
    assert!(antwort.is_none());
    assert!(b.empfangen().is_none());

    // Klingelnder Anruf reicht ebenfalls nicht
    a.senden(
        &dispatcher,
        ControlPayload::CallRequest(CallRequestMessage { target_id: b.id() }),
    );
    b.leeren();
    a.senden(
        &dispatcher,
        ControlPayload::SignalingData(SignalingDataRequest {
            target_id: b.id(),
            data: test_offer(),
        }),
    );
    assert!(b.empfangen().is_none());
}

#[tokio::test]
async fn unbenannte_clients_sind_unsichtbar() {
    let (dispatcher, state) = test_hub();
    let mut a = TestClient::verbinden(&dispatcher, &state);
    let mut b = TestClient::verbinden(&dispatcher, &state);
    b.leeren();

    // Nur A loggt sich ein; B bleibt unbenannt
    a.login(&dispatcher, "Alice");
    a.leeren();

    // Ein frisch verbundener Client sieht in der Begruessungs-Liste nur Alice
    let mut c = TestClient::verbinden(&dispatcher, &state);
    let begruessung = c.empfangen().expect("ConnectedClients erwartet");
    if let ControlPayload::ConnectedClients(liste) = begruessung.payload {
        assert_eq!(liste.clients.len(), 1);
        assert_eq!(liste.clients[0].name.as_deref(), Some("Alice"));
    } else {
        panic!("Erwartet ConnectedClients");
    }

    // B ist kein gueltiges Anruf-Ziel
    a.senden(
        &dispatcher,
        ControlPayload::CallRequest(CallRequestMessage { target_id: b.id() }),
    );
    assert!(b.empfangen().is_none());
    assert!(state.registry.von_partei(&a.id()).is_none());
}
