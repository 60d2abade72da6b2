//! MessageService – Nachrichten validieren, speichern, Verlauf laden

use std::sync::Arc;

use klartext_core::types::UserId;
use klartext_db::{NachrichtenSpeicher, NachrichtenTyp, NeueNachricht};

use crate::error::{ChatError, ChatResult};
use crate::types::Nachricht;

/// Maximale Nachrichtenlaenge in Zeichen
const MAX_INHALT_LAENGE: usize = 4096;

/// MessageService verwaltet Direkt-Nachrichten zwischen Benutzerpaaren
///
/// Speichern kommt vor Zustellen: `nachricht_senden` haengt die
/// Nachricht genau einmal an den Speicher an (kein automatischer
/// Retry) und gibt den autoritativen Datensatz zurueck. Schlaegt das
/// Anhaengen fehl, darf der Aufrufer nichts zustellen.
pub struct MessageService<S: NachrichtenSpeicher> {
    speicher: Arc<S>,
}

impl<S: NachrichtenSpeicher> MessageService<S> {
    /// Erstellt einen neuen MessageService
    pub fn neu(speicher: Arc<S>) -> Arc<Self> {
        Arc::new(Self { speicher })
    }

    /// Validiert und speichert eine Nachricht
    ///
    /// `empfaenger` und ein nicht-leerer `content` sind Pflicht;
    /// `typ` faellt auf "text" zurueck wenn er fehlt.
    pub async fn nachricht_senden(
        &self,
        sender: UserId,
        empfaenger: Option<UserId>,
        content: &str,
        typ: Option<&str>,
    ) -> ChatResult<Nachricht> {
        let empfaenger = empfaenger.ok_or_else(|| {
            ChatError::UngueltigeEingabe("Empfaenger ist erforderlich".into())
        })?;

        if content.trim().is_empty() {
            return Err(ChatError::UngueltigeEingabe(
                "Nachrichteninhalt darf nicht leer sein".into(),
            ));
        }

        if content.chars().count() > MAX_INHALT_LAENGE {
            return Err(ChatError::UngueltigeEingabe(format!(
                "Nachricht zu lang: {} Zeichen (Maximum: {})",
                content.chars().count(),
                MAX_INHALT_LAENGE
            )));
        }

        let record = self
            .speicher
            .anhaengen(NeueNachricht {
                sender_id: sender,
                receiver_id: empfaenger,
                content,
                message_type: NachrichtenTyp::aus_wire(typ),
            })
            .await?;

        Ok(record.into())
    }

    /// Laedt den Verlauf zwischen zwei Benutzern (beide Richtungen)
    pub async fn verlauf_laden(&self, a: UserId, b: UserId) -> ChatResult<Vec<Nachricht>> {
        let records = self.speicher.verlauf(a, b).await?;
        Ok(records.into_iter().map(Nachricht::from).collect())
    }

    /// Markiert alle ungelesenen Nachrichten von `sender` an
    /// `empfaenger` gesammelt als gelesen
    pub async fn als_gelesen_markieren(
        &self,
        sender: UserId,
        empfaenger: UserId,
    ) -> ChatResult<u64> {
        Ok(self.speicher.als_gelesen_markieren(sender, empfaenger).await?)
    }
}
