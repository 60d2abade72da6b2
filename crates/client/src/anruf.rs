//! Anruf-Zustandsmaschine – der Anruf-Lebenszyklus eines Clients
//!
//! Der Relay haelt keinen Anruf-Zustand; jeder Client fuehrt seinen
//! Lebenszyklus selbst:
//!
//! ```text
//! Untaetig -> ErfasseMedien -> Anbieten --\
//!     \                                    +-> Verbinden -> Aktiv
//!      \-> Klingeln -> NimmtAn -----------/
//!                                   (alles) -> Beendet
//! ```
//!
//! Die Maschine ist eine reine Uebergangsfunktion: `verarbeiten`
//! nimmt ein Ereignis und gibt die auszufuehrenden Aktionen zurueck.
//! Medien-Erfassung, WebRTC und Netzwerk stecken in den Aktionen bzw.
//! den zurueckgespeisten Ereignissen – dadurch ist jeder Uebergang
//! ohne lebende Transportschicht testbar.
//!
//! ## Randfaelle
//! - Schlaegt die Medien-Erfassung fehl, bricht der Anruf lokal ab
//!   bevor irgendeine Signalisierung gesendet wurde.
//! - ICE-Kandidaten die vor der Remote-Beschreibung eintreffen werden
//!   gepuffert und nach dem Setzen in Ankunftsreihenfolge angewendet,
//!   nie verworfen.
//! - Ein zweites Offer waehrend eines laufenden Anrufs wird mit
//!   `reject-call` beantwortet; der laufende Anruf bleibt unberuehrt.
//! - Ein `call-ended`/`call-rejected` zu einem Anruf den die Maschine
//!   nicht (mehr) kennt ist ein No-op, kein Fehler.

use klartext_core::types::UserId;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Zustaende, Ereignisse, Aktionen
// ---------------------------------------------------------------------------

/// Grund fuer das Anruf-Ende
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndeGrund {
    /// Lokaler Benutzer hat aufgelegt
    Lokal,
    /// Gegenseite hat aufgelegt oder die Verbindung verloren
    Gegenseite,
    /// Gegenseite hat den Anruf abgelehnt
    Abgelehnt,
}

/// Zustand des Anruf-Lebenszyklus
#[derive(Debug, Clone, PartialEq)]
pub enum AnrufZustand {
    /// Kein Anruf
    Untaetig,
    /// Ausgehend: Medien-Erfassung laeuft, noch nichts signalisiert
    ErfasseMedien { ziel: UserId },
    /// Ausgehend: Offer gesendet, Answer steht aus
    Anbieten { ziel: UserId },
    /// Eingehend: Offer liegt vor, Benutzer entscheidet
    Klingeln {
        anrufer: UserId,
        name: String,
        offer: Value,
    },
    /// Eingehend: angenommen, Medien-Erfassung laeuft
    NimmtAn { anrufer: UserId, offer: Value },
    /// Signalisierung abgeschlossen, Peer-Transport verbindet sich
    Verbinden { partner: UserId },
    /// Peer-Transport steht, Medien fliessen direkt
    Aktiv { partner: UserId },
    /// Anruf vorbei; `zuruecksetzen` macht die Maschine wieder frei
    Beendet { grund: EndeGrund },
}

/// Eingehende Ereignisse der Zustandsmaschine
///
/// Lokale Benutzeraktionen, Signalisierung vom Relay und Rueckmeldungen
/// der Medien-/Transportschicht laufen durch dieselbe Funktion.
#[derive(Debug, Clone, PartialEq)]
pub enum AnrufEreignis {
    /// Lokaler Benutzer startet einen Anruf
    AnrufStarten { ziel: UserId },
    /// Medien-Erfassung erfolgreich
    MedienErfasst,
    /// Medien-Erfassung fehlgeschlagen (z.B. Berechtigung verweigert)
    MedienFehlgeschlagen { fehler: String },
    /// `offer` vom Relay
    OfferEmpfangen {
        von: UserId,
        name: String,
        offer: Value,
    },
    /// Lokaler Benutzer nimmt den klingelnden Anruf an
    Annehmen,
    /// Lokaler Benutzer lehnt den klingelnden Anruf ab
    Ablehnen,
    /// `answer` vom Relay
    AnswerEmpfangen { answer: Value },
    /// `ice-candidate` vom Relay
    KandidatEmpfangen { kandidat: Value },
    /// Peer-Transport meldet verbunden (lokal beobachtet)
    TransportVerbunden,
    /// Lokaler Benutzer legt auf
    Auflegen,
    /// `call-ended` vom Relay
    GegenseiteBeendet,
    /// `call-rejected` vom Relay
    GegenseiteAbgelehnt,
}

/// Aktionen die die Integrationsschicht ausfuehren muss
#[derive(Debug, Clone, PartialEq)]
pub enum AnrufAktion {
    /// Lokale Audio/Video-Erfassung starten; Ergebnis kommt als
    /// `MedienErfasst` oder `MedienFehlgeschlagen` zurueck
    MedienAnfordern,
    /// SDP-Offer erzeugen und als `offer` an das Ziel senden
    SendeOffer { an: UserId },
    /// SDP-Answer erzeugen und als `answer` senden
    SendeAnswer { an: UserId },
    /// `reject-call` senden
    SendeRejectCall { an: UserId },
    /// `end-call` senden
    SendeEndCall { an: UserId },
    /// Empfangene Beschreibung als Remote-Description setzen
    RemoteBeschreibungSetzen { beschreibung: Value },
    /// ICE-Kandidat auf die Peer-Verbindung anwenden
    KandidatAnwenden { kandidat: Value },
    /// Lokale Erfassung und Peer-Verbindung freigeben
    MedienFreigeben,
    /// Fehler an den Benutzer melden
    FehlerMelden { fehler: String },
}

// ---------------------------------------------------------------------------
// AnrufAutomat
// ---------------------------------------------------------------------------

/// Fuehrt den Anruf-Lebenszyklus eines Clients
pub struct AnrufAutomat {
    zustand: AnrufZustand,
    /// Ist die Remote-Beschreibung bereits gesetzt?
    remote_gesetzt: bool,
    /// Kandidaten die vor der Remote-Beschreibung eingetroffen sind
    kandidaten_puffer: Vec<Value>,
}

impl AnrufAutomat {
    /// Erstellt eine neue Maschine im Zustand `Untaetig`
    pub fn neu() -> Self {
        Self {
            zustand: AnrufZustand::Untaetig,
            remote_gesetzt: false,
            kandidaten_puffer: Vec::new(),
        }
    }

    /// Gibt den aktuellen Zustand zurueck
    pub fn zustand(&self) -> &AnrufZustand {
        &self.zustand
    }

    /// Macht die Maschine nach `Beendet` wieder frei
    pub fn zuruecksetzen(&mut self) {
        self.zustand = AnrufZustand::Untaetig;
        self.remote_gesetzt = false;
        self.kandidaten_puffer.clear();
    }

    /// Verarbeitet ein Ereignis und gibt die auszufuehrenden Aktionen zurueck
    pub fn verarbeiten(&mut self, ereignis: AnrufEreignis) -> Vec<AnrufAktion> {
        use AnrufEreignis as E;
        use AnrufZustand as Z;

        let mut aktionen = Vec::new();

        match (self.zustand.clone(), ereignis) {
            // ---------------------------------------------------------------
            // Ausgehender Anruf
            // ---------------------------------------------------------------
            (Z::Untaetig, E::AnrufStarten { ziel }) => {
                self.zustand = Z::ErfasseMedien { ziel };
                aktionen.push(AnrufAktion::MedienAnfordern);
            }

            (Z::ErfasseMedien { ziel }, E::MedienErfasst) => {
                self.zustand = Z::Anbieten { ziel };
                aktionen.push(AnrufAktion::SendeOffer { an: ziel });
            }

            // Ohne Medien kein Anruf: Abbruch bevor irgendetwas
            // signalisiert wurde
            (Z::ErfasseMedien { .. }, E::MedienFehlgeschlagen { fehler }) => {
                self.zuruecksetzen();
                aktionen.push(AnrufAktion::FehlerMelden { fehler });
            }

            (Z::Anbieten { ziel }, E::AnswerEmpfangen { answer }) => {
                self.zustand = Z::Verbinden { partner: ziel };
                self.remote_setzen(answer, &mut aktionen);
            }

            (Z::Anbieten { .. }, E::GegenseiteAbgelehnt) => {
                self.beenden(EndeGrund::Abgelehnt, &mut aktionen);
            }

            // ---------------------------------------------------------------
            // Eingehender Anruf
            // ---------------------------------------------------------------
            (Z::Untaetig, E::OfferEmpfangen { von, name, offer }) => {
                self.zustand = Z::Klingeln {
                    anrufer: von,
                    name,
                    offer,
                };
            }

            (Z::Klingeln { anrufer, offer, .. }, E::Annehmen) => {
                self.zustand = Z::NimmtAn { anrufer, offer };
                aktionen.push(AnrufAktion::MedienAnfordern);
            }

            (Z::Klingeln { anrufer, .. }, E::Ablehnen)
            | (Z::Klingeln { anrufer, .. }, E::Auflegen) => {
                self.zuruecksetzen();
                aktionen.push(AnrufAktion::SendeRejectCall { an: anrufer });
            }

            (Z::NimmtAn { anrufer, offer }, E::MedienErfasst) => {
                self.zustand = Z::Verbinden { partner: anrufer };
                self.remote_setzen(offer, &mut aktionen);
                aktionen.push(AnrufAktion::SendeAnswer { an: anrufer });
            }

            (Z::NimmtAn { .. }, E::MedienFehlgeschlagen { fehler }) => {
                self.zuruecksetzen();
                aktionen.push(AnrufAktion::FehlerMelden { fehler });
            }

            // ---------------------------------------------------------------
            // Zweites Offer waehrend eines laufenden Anrufs: ablehnen,
            // niemals den laufenden Anruf ueberschreiben
            // ---------------------------------------------------------------
            (
                Z::ErfasseMedien { .. }
                | Z::Anbieten { .. }
                | Z::Klingeln { .. }
                | Z::NimmtAn { .. }
                | Z::Verbinden { .. }
                | Z::Aktiv { .. },
                E::OfferEmpfangen { von, .. },
            ) => {
                tracing::debug!(von = %von, "Offer waehrend laufendem Anruf – besetzt");
                aktionen.push(AnrufAktion::SendeRejectCall { an: von });
            }

            // ---------------------------------------------------------------
            // Trickle ICE: puffern bis die Remote-Beschreibung steht,
            // danach direkt anwenden (auch nach Aktiv)
            // ---------------------------------------------------------------
            (
                Z::ErfasseMedien { .. }
                | Z::Anbieten { .. }
                | Z::Klingeln { .. }
                | Z::NimmtAn { .. }
                | Z::Verbinden { .. }
                | Z::Aktiv { .. },
                E::KandidatEmpfangen { kandidat },
            ) => {
                if self.remote_gesetzt {
                    aktionen.push(AnrufAktion::KandidatAnwenden { kandidat });
                } else {
                    self.kandidaten_puffer.push(kandidat);
                }
            }

            // ---------------------------------------------------------------
            // Verbindungsaufbau und Ende
            // ---------------------------------------------------------------
            (Z::Verbinden { partner }, E::TransportVerbunden) => {
                self.zustand = Z::Aktiv { partner };
            }

            (Z::ErfasseMedien { .. }, E::Auflegen) => {
                // Noch nichts signalisiert – niemand muss es erfahren
                self.zuruecksetzen();
                aktionen.push(AnrufAktion::MedienFreigeben);
            }

            (Z::Anbieten { ziel }, E::Auflegen) => {
                aktionen.push(AnrufAktion::SendeEndCall { an: ziel });
                self.beenden(EndeGrund::Lokal, &mut aktionen);
            }

            (Z::NimmtAn { anrufer, .. }, E::Auflegen) => {
                aktionen.push(AnrufAktion::SendeEndCall { an: anrufer });
                self.beenden(EndeGrund::Lokal, &mut aktionen);
            }

            (Z::Verbinden { partner } | Z::Aktiv { partner }, E::Auflegen) => {
                aktionen.push(AnrufAktion::SendeEndCall { an: partner });
                self.beenden(EndeGrund::Lokal, &mut aktionen);
            }

            (
                Z::Anbieten { .. }
                | Z::Klingeln { .. }
                | Z::NimmtAn { .. }
                | Z::Verbinden { .. }
                | Z::Aktiv { .. },
                E::GegenseiteBeendet,
            ) => {
                // Kein end-call zurueck: das Ende war ja die Ursache
                self.beenden(EndeGrund::Gegenseite, &mut aktionen);
            }

            // Spaete Erfassung nach Auflegen – sofort wieder freigeben
            (Z::Untaetig | Z::Beendet { .. }, E::MedienErfasst) => {
                aktionen.push(AnrufAktion::MedienFreigeben);
            }

            // ---------------------------------------------------------------
            // Alles Uebrige ist ein veraltetes oder unpassendes Signal:
            // No-op, kein Fehler
            // ---------------------------------------------------------------
            (zustand, ereignis) => {
                tracing::trace!(?zustand, ?ereignis, "Ereignis ignoriert");
            }
        }

        aktionen
    }

    /// Setzt die Remote-Beschreibung und wendet gepufferte Kandidaten
    /// in Ankunftsreihenfolge an
    fn remote_setzen(&mut self, beschreibung: Value, aktionen: &mut Vec<AnrufAktion>) {
        self.remote_gesetzt = true;
        aktionen.push(AnrufAktion::RemoteBeschreibungSetzen { beschreibung });
        for kandidat in self.kandidaten_puffer.drain(..) {
            aktionen.push(AnrufAktion::KandidatAnwenden { kandidat });
        }
    }

    /// Wechselt nach `Beendet` und gibt die Medien frei
    fn beenden(&mut self, grund: EndeGrund, aktionen: &mut Vec<AnrufAktion>) {
        self.zustand = AnrufZustand::Beendet { grund };
        self.remote_gesetzt = false;
        self.kandidaten_puffer.clear();
        aktionen.push(AnrufAktion::MedienFreigeben);
    }
}

impl Default for AnrufAutomat {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
