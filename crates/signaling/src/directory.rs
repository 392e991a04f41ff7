//! Client-Verzeichnis – Verwaltet verbundene Clients und ihre Namen
//!
//! Wer ist verbunden, unter welchem Anzeigenamen? Das Verzeichnis haelt
//! den ephemeren Presence-Zustand aller Verbindungen. Ein Eintrag ohne
//! Namen gilt als "nicht eingeloggt" und taucht in keiner peer-sichtbaren
//! Liste auf.

use dashmap::DashMap;
use rufzeichen_core::ConnectionId;
use rufzeichen_protocol::control::ClientInfo;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// ClientEintrag
// ---------------------------------------------------------------------------

/// Presence-Eintrag einer verbundenen Transport-Verbindung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEintrag {
    pub id: ConnectionId,
    /// Anzeigename; `None` solange der Client nicht eingeloggt ist
    pub name: Option<String>,
}

impl ClientEintrag {
    /// Prueft ob der Client eingeloggt ist (Name vergeben)
    pub fn ist_benannt(&self) -> bool {
        self.name.is_some()
    }

    /// Konvertiert den Eintrag in die peer-sichtbare Protokoll-Form
    pub fn als_info(&self) -> ClientInfo {
        ClientInfo {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientDirectory
// ---------------------------------------------------------------------------

/// Verwaltet alle verbundenen Clients, indiziert nach ConnectionId
///
/// Thread-safe via Arc + DashMap. Clone des Verzeichnisses teilt den
/// inneren Zustand. Jede Operation ist atomar bezueglich ihres Eintrags.
#[derive(Clone)]
pub struct ClientDirectory {
    inner: Arc<DashMap<ConnectionId, ClientEintrag>>,
}

impl ClientDirectory {
    /// Erstellt ein neues leeres Verzeichnis
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Registriert eine neue Verbindung ohne Namen
    ///
    /// Idempotent: eine bereits bekannte ID wird ueberschrieben
    /// (Reconnect-Randfall, last-write-wins).
    pub fn verbinden(&self, id: ConnectionId) {
        self.inner.insert(id, ClientEintrag { id, name: None });
        tracing::debug!(verbindung = %id, "Client im Verzeichnis registriert");
    }

    /// Entfernt eine Verbindung und gibt den Eintrag zurueck
    pub fn trennen(&self, id: &ConnectionId) -> Option<ClientEintrag> {
        self.inner.remove(id).map(|(_, eintrag)| eintrag)
    }

    /// Gibt den Eintrag einer Verbindung zurueck
    pub fn holen(&self, id: &ConnectionId) -> Option<ClientEintrag> {
        self.inner.get(id).map(|e| e.clone())
    }

    /// Setzt den Anzeigenamen einer Verbindung
    ///
    /// Gibt `None` zurueck wenn die Verbindung nie registriert wurde –
    /// der Client muss sich vor dem Login verbunden haben. Wiederholter
    /// Aufruf aktualisiert den Namen (kein Fehler).
    pub fn name_setzen(&self, id: &ConnectionId, name: impl Into<String>) -> Option<ClientEintrag> {
        let mut eintrag = self.inner.get_mut(id)?;
        eintrag.name = Some(name.into());
        Some(eintrag.clone())
    }

    /// Gibt alle Eintraege zurueck (Momentaufnahme, Reihenfolge unspezifiziert)
    pub fn alle(&self) -> Vec<ClientEintrag> {
        self.inner.iter().map(|e| e.value().clone()).collect()
    }

    /// Gibt alle eingeloggten Eintraege zurueck
    ///
    /// Nur diese sind peer-sichtbar und gueltige Anruf-Ziele.
    pub fn benannte(&self) -> Vec<ClientEintrag> {
        self.inner
            .iter()
            .filter(|e| e.ist_benannt())
            .map(|e| e.value().clone())
            .collect()
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_verbunden(&self, id: &ConnectionId) -> bool {
        self.inner.contains_key(id)
    }

    /// Gibt die Anzahl der registrierten Verbindungen zurueck
    pub fn anzahl(&self) -> usize {
        self.inner.len()
    }
}

impl Default for ClientDirectory {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
