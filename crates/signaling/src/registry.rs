//! Anruf-Registry – Verwaltet den Lebenszyklus aller laufenden Anrufe
//!
//! Ein Anruf ist nach seinem Anrufer indiziert: eine Verbindung kann
//! hoechstens einen ausgehenden Anruf gleichzeitig besitzen. Angerufene
//! Seite wird prozedural geprueft (siehe `starten`). Es gibt keinen
//! "beendet"-Zustand – das Entfernen des Eintrags ist der terminale
//! Uebergang.
//!
//! Alle Operationen laufen unter einem Mutex, weil `starten` eine
//! Invariante ueber mehrere Schluessel hinweg prueft (ist der Angerufene
//! irgendwo im Gespraech?) und nicht mit nebenlaeufigen Inserts
//! verschraenken darf.

use parking_lot::Mutex;
use rufzeichen_core::ConnectionId;
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// AnrufZustand / AnrufInfo
// ---------------------------------------------------------------------------

/// Lebenszyklus-Zustand eines Anrufs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnrufZustand {
    /// Angefordert, vom Angerufenen noch nicht angenommen
    Klingelt,
    /// Angenommen – Signalisierungsdaten duerfen fliessen
    Aktiv,
}

/// Eintrag eines laufenden Anrufs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnrufInfo {
    pub anrufer_id: ConnectionId,
    pub angerufener_id: ConnectionId,
    pub zustand: AnrufZustand,
}

impl AnrufInfo {
    /// Prueft ob die Verbindung Teilnehmer dieses Anrufs ist
    pub fn betrifft(&self, id: &ConnectionId) -> bool {
        self.anrufer_id == *id || self.angerufener_id == *id
    }

    /// Gibt den jeweils anderen Teilnehmer zurueck
    ///
    /// Setzt voraus dass `id` Teilnehmer ist; andernfalls wird der
    /// Anrufer zurueckgegeben.
    pub fn anderer_teilnehmer(&self, id: &ConnectionId) -> ConnectionId {
        if self.anrufer_id == *id {
            self.angerufener_id
        } else {
            self.anrufer_id
        }
    }
}

/// Fehlschlaege beim Starten eines Anrufs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnrufStartFehler {
    /// Der Anrufer besitzt bereits einen klingelnden oder aktiven Anruf
    AnruferBesetzt,
    /// Der Angerufene ist bereits Teilnehmer eines anderen Anrufs
    AngerufenerBesetzt,
}

// ---------------------------------------------------------------------------
// CallRegistry
// ---------------------------------------------------------------------------

/// Verwaltet alle laufenden Anrufe, indiziert nach Anrufer-ID
///
/// Thread-safe via Arc + Mutex. Clone der Registry teilt den inneren
/// Zustand.
#[derive(Clone)]
pub struct CallRegistry {
    inner: Arc<Mutex<HashMap<ConnectionId, AnrufInfo>>>,
}

impl CallRegistry {
    /// Erstellt eine neue leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Startet einen neuen Anruf im Zustand `Klingelt`
    ///
    /// Schlaegt fehl wenn der Anrufer bereits einen Anruf besitzt oder
    /// der Angerufene in irgendeinem Anruf steckt (beide Rollen).
    /// Pruefungen und Insert laufen unter demselben Lock.
    pub fn starten(
        &self,
        anrufer_id: ConnectionId,
        angerufener_id: ConnectionId,
    ) -> Result<AnrufInfo, AnrufStartFehler> {
        let mut anrufe = self.inner.lock();

        if anrufe.contains_key(&anrufer_id) {
            return Err(AnrufStartFehler::AnruferBesetzt);
        }
        if anrufe.values().any(|a| a.betrifft(&angerufener_id)) {
            return Err(AnrufStartFehler::AngerufenerBesetzt);
        }

        let info = AnrufInfo {
            anrufer_id,
            angerufener_id,
            zustand: AnrufZustand::Klingelt,
        };
        anrufe.insert(anrufer_id, info.clone());
        Ok(info)
    }

    /// Nimmt einen klingelnden Anruf an (`Klingelt` -> `Aktiv`)
    ///
    /// Idempotent: ein bereits aktiver Anruf bleibt aktiv und wird
    /// unveraendert zurueckgegeben. `None` wenn kein Anruf dieses
    /// Anrufers existiert.
    pub fn annehmen(&self, anrufer_id: &ConnectionId) -> Option<AnrufInfo> {
        let mut anrufe = self.inner.lock();
        let info = anrufe.get_mut(anrufer_id)?;
        info.zustand = AnrufZustand::Aktiv;
        Some(info.clone())
    }

    /// Lehnt einen Anruf ab und entfernt ihn – unabhaengig vom Zustand
    pub fn ablehnen(&self, anrufer_id: &ConnectionId) -> Option<AnrufInfo> {
        self.inner.lock().remove(anrufer_id)
    }

    /// Beendet den Anruf an dem die Verbindung teilnimmt
    ///
    /// Symmetrisch ueber beide Rollen: die ID darf Anrufer oder
    /// Angerufener sein. Linearer Scan – die erwartete Anzahl
    /// gleichzeitiger Anrufe ist klein.
    pub fn beenden(&self, teilnehmer_id: &ConnectionId) -> Option<AnrufInfo> {
        let mut anrufe = self.inner.lock();
        let anrufer_id = anrufe
            .values()
            .find(|a| a.betrifft(teilnehmer_id))
            .map(|a| a.anrufer_id)?;
        anrufe.remove(&anrufer_id)
    }

    /// Sucht den Anruf an dem die Verbindung teilnimmt (nicht-mutierend)
    pub fn von_partei(&self, teilnehmer_id: &ConnectionId) -> Option<AnrufInfo> {
        self.inner
            .lock()
            .values()
            .find(|a| a.betrifft(teilnehmer_id))
            .cloned()
    }

    /// Sucht den Anruf dessen Teilnehmermenge exakt {a, b} ist
    ///
    /// Autorisiert das Signalisierungsdaten-Relay. Eine Verbindung kann
    /// gleichzeitig Angerufener eines klingelnden und Anrufer eines
    /// weiteren Anrufs sein – deshalb reicht `von_partei` hier nicht.
    pub fn zwischen(&self, a: &ConnectionId, b: &ConnectionId) -> Option<AnrufInfo> {
        self.inner
            .lock()
            .values()
            .find(|anruf| anruf.betrifft(a) && anruf.betrifft(b))
            .cloned()
    }

    /// Entfernt alle Anrufe (administrativer Reset)
    pub fn alle_loeschen(&self) {
        let mut anrufe = self.inner.lock();
        let anzahl = anrufe.len();
        anrufe.clear();
        if anzahl > 0 {
            tracing::info!(anzahl, "Alle Anrufe entfernt");
        }
    }

    /// Gibt die Anzahl der laufenden Anrufe zurueck
    pub fn anzahl(&self) -> usize {
        self.inner.lock().len()
    }
}

impl Default for CallRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
