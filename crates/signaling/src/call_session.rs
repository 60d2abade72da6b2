//! Call-Tracker – Serverseitige Anruf-Sitzungen
//!
//! Der Relay leitet Anruf-Signalisierung blind weiter; den Lebenszyklus
//! halten die Clients. Dieser Tracker fuehrt trotzdem einen minimalen
//! serverseitigen Sitzungs-Datensatz {Anrufer, Angerufener, Phase},
//! damit das Verbindungs-Aufraeumen haengende Anrufe beenden kann:
//! verschwindet ein Teilnehmer, bekommt die Gegenseite `call-ended`
//! statt endlos zu warten.
//!
//! Angelegt beim `offer`, befoerdert beim `answer`, entfernt bei
//! `end-call`/`reject-call` und beim Disconnect eines Teilnehmers.
//! Kein Klingel-Timeout: der einzige Timer in diesem Kern ist der
//! clientseitige Tipp-Debounce.

use dashmap::DashMap;
use klartext_core::types::UserId;
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Sitzungs-Typen
// ---------------------------------------------------------------------------

/// Phase einer serverseitig vermerkten Anruf-Sitzung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnrufPhase {
    /// Offer wurde weitergeleitet, Answer steht aus
    Klingelt,
    /// Answer wurde weitergeleitet
    Verbunden,
}

/// Serverseitiger Anruf-Sitzungs-Datensatz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSitzung {
    pub anrufer: UserId,
    pub angerufener: UserId,
    pub phase: AnrufPhase,
}

impl CallSitzung {
    /// Prueft ob der Benutzer an dieser Sitzung teilnimmt
    fn betrifft(&self, user_id: &UserId) -> bool {
        self.anrufer == *user_id || self.angerufener == *user_id
    }

    /// Gibt den jeweils anderen Teilnehmer zurueck
    fn gegenseite(&self, user_id: &UserId) -> UserId {
        if self.anrufer == *user_id {
            self.angerufener
        } else {
            self.anrufer
        }
    }

    /// Prueft ob die Sitzung genau dieses Paar verbindet
    /// (Richtung egal – beenden darf jede Seite)
    fn ist_paar(&self, a: &UserId, b: &UserId) -> bool {
        (self.anrufer == *a && self.angerufener == *b)
            || (self.anrufer == *b && self.angerufener == *a)
    }
}

// ---------------------------------------------------------------------------
// CallTracker
// ---------------------------------------------------------------------------

/// Verwaltet alle serverseitig vermerkten Anruf-Sitzungen
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
/// Die Scans ueber alle Sitzungen sind O(n); bei zwei Teilnehmern pro
/// Sitzung und einer Verbindung pro Benutzer bleibt n klein.
#[derive(Clone)]
pub struct CallTracker {
    inner: Arc<CallTrackerInner>,
}

struct CallTrackerInner {
    sitzungen: DashMap<Uuid, CallSitzung>,
}

impl CallTracker {
    /// Erstellt einen neuen CallTracker
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(CallTrackerInner {
                sitzungen: DashMap::new(),
            }),
        }
    }

    /// Vermerkt eine Sitzung beim weitergeleiteten Offer
    ///
    /// Ein erneutes Offer desselben Anrufers an denselben Angerufenen
    /// (Re-Negotiation) erzeugt keine zweite Sitzung.
    pub fn anruf_vermerken(&self, anrufer: UserId, angerufener: UserId) {
        let vorhanden = self
            .inner
            .sitzungen
            .iter()
            .any(|e| e.value().anrufer == anrufer && e.value().angerufener == angerufener);
        if vorhanden {
            tracing::debug!(
                anrufer = %anrufer,
                angerufener = %angerufener,
                "Erneutes Offer fuer bestehende Sitzung"
            );
            return;
        }

        self.inner.sitzungen.insert(
            Uuid::new_v4(),
            CallSitzung {
                anrufer,
                angerufener,
                phase: AnrufPhase::Klingelt,
            },
        );
        tracing::debug!(anrufer = %anrufer, angerufener = %angerufener, "Anruf vermerkt");
    }

    /// Befoerdert die Sitzung des Paars beim weitergeleiteten Answer
    pub fn antwort_vermerken(&self, anrufer: UserId, angerufener: UserId) {
        for mut eintrag in self.inner.sitzungen.iter_mut() {
            let sitzung = eintrag.value_mut();
            if sitzung.anrufer == anrufer && sitzung.angerufener == angerufener {
                sitzung.phase = AnrufPhase::Verbunden;
                tracing::debug!(anrufer = %anrufer, angerufener = %angerufener, "Anruf verbunden");
                return;
            }
        }
        // Answer ohne vermerkte Sitzung: blind weitergeleitet, kein Fehler
        tracing::debug!(anrufer = %anrufer, angerufener = %angerufener, "Answer ohne Sitzung");
    }

    /// Entfernt die Sitzung zwischen zwei Benutzern (Richtung egal)
    ///
    /// Gibt `true` zurueck wenn eine Sitzung entfernt wurde. Ein
    /// Beenden ohne Sitzung ist ein No-op.
    pub fn beenden(&self, a: &UserId, b: &UserId) -> bool {
        let schluessel: Vec<Uuid> = self
            .inner
            .sitzungen
            .iter()
            .filter(|e| e.value().ist_paar(a, b))
            .map(|e| *e.key())
            .collect();

        let mut entfernt = false;
        for k in schluessel {
            if self.inner.sitzungen.remove(&k).is_some() {
                entfernt = true;
            }
        }
        entfernt
    }

    /// Entfernt alle Sitzungen eines verschwundenen Teilnehmers
    ///
    /// Gibt die Gegenseiten zurueck, damit der Aufrufer jede mit
    /// `call-ended` benachrichtigen kann.
    pub fn teilnehmer_trennen(&self, user_id: &UserId) -> Vec<UserId> {
        let betroffen: Vec<(Uuid, UserId)> = self
            .inner
            .sitzungen
            .iter()
            .filter(|e| e.value().betrifft(user_id))
            .map(|e| (*e.key(), e.value().gegenseite(user_id)))
            .collect();

        let mut gegenseiten = Vec::with_capacity(betroffen.len());
        for (k, gegenseite) in betroffen {
            if self.inner.sitzungen.remove(&k).is_some() {
                gegenseiten.push(gegenseite);
            }
        }

        if !gegenseiten.is_empty() {
            tracing::debug!(
                user_id = %user_id,
                anzahl = gegenseiten.len(),
                "Haengende Anrufe getrennt"
            );
        }
        gegenseiten
    }

    /// Gibt die Sitzung eines Teilnehmers zurueck (falls vorhanden)
    pub fn sitzung_von(&self, user_id: &UserId) -> Option<CallSitzung> {
        self.inner
            .sitzungen
            .iter()
            .find(|e| e.value().betrifft(user_id))
            .map(|e| e.value().clone())
    }

    /// Gibt die Anzahl der aktiven Sitzungen zurueck
    pub fn sitzungs_anzahl(&self) -> usize {
        self.inner.sitzungen.len()
    }
}

impl Default for CallTracker {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
