//! klartext-client – Client-seitige Protokoll-Logik
//!
//! Der Relay ist fuer Anrufe eine blinde Weiterleitungsschicht: den
//! Anruf-Lebenszyklus haelt jeder Client selbst. Dieses Crate buendelt
//! die Logik die jede Client-Implementierung reproduzieren muss, ohne
//! UI- oder Medien-Abhaengigkeiten:
//!
//! - [`anruf::AnrufAutomat`] – der Anruf-Lebenszyklus als reine
//!   Uebergangsfunktion (Zustand, Ereignis) -> Aktionen. Die
//!   Integrationsschicht (WebRTC, UI) fuehrt die Aktionen aus und
//!   speist Ereignisse zurueck.
//! - [`tippen::TippMelder`] – der 2-Sekunden-Tipp-Debounce: ein
//!   `typing-start` beim ersten Tastendruck, genau ein `typing-stop`
//!   nach zwei Sekunden Ruhe.

pub mod anruf;
pub mod tippen;

pub use anruf::{AnrufAktion, AnrufAutomat, AnrufEreignis, AnrufZustand, EndeGrund};
pub use tippen::{TippEreignis, TippMelder, TIPP_RUHEZEIT};
