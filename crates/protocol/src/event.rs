//! Ereignisflaeche der persistenten Verbindung
//!
//! Alle Ereignisse die ueber die dauerhafte Verbindung zwischen Client
//! und Relay ausgetauscht werden. Die Tags entsprechen den Ereignisnamen
//! auf dem Draht (`user-online`, `send-message`, ...), die Payload-Felder
//! sind camelCase.

use klartext_core::types::{MessageId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Eingehende Payloads (Client -> Relay)
// ---------------------------------------------------------------------------

/// Ein Client meldet seine Identitaet an (bindet Verbindung an Benutzer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOnlineEvent {
    pub user_id: UserId,
}

/// Tipp-Impuls (Start oder Stop, je nach Ereignis-Tag)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub receiver_id: UserId,
    pub sender_id: UserId,
}

/// Chat-Nachricht senden
///
/// `receiver_id` ist optional auf dem Draht damit ein fehlender
/// Empfaenger als `message-error` beantwortet werden kann statt die
/// Verbindung mit einem Frame-Fehler zu beenden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageEvent {
    pub sender_id: UserId,
    pub receiver_id: Option<UserId>,
    pub content: String,
    /// Nachrichtentyp, Standard ist "text"
    pub message_type: Option<String>,
}

/// SDP-Offer eines Anrufers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferEvent {
    pub to: UserId,
    pub from: UserId,
    /// Anzeigename des Anrufers
    pub name: String,
    /// SDP-Offer, opak
    pub offer: Value,
}

/// SDP-Answer des Angerufenen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvent {
    pub to: UserId,
    /// SDP-Answer, opak
    pub answer: Value,
}

/// Einzelner ICE-Kandidat (Trickle ICE, beliebig oft)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateEvent {
    pub to: UserId,
    pub from: UserId,
    /// ICE-Kandidat, opak
    pub candidate: Value,
}

/// Anruf ablehnen oder beenden – nur das Ziel zaehlt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTargetEvent {
    pub to: UserId,
}

// ---------------------------------------------------------------------------
// Ausgehende Payloads (Relay -> Client)
// ---------------------------------------------------------------------------

/// Online-Status-Aenderung (Fan-out an alle Verbindungen)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusChangeEvent {
    pub user_id: UserId,
    pub is_online: bool,
}

/// Tipp-Anzeige fuer den Empfaenger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTypingEvent {
    pub user_id: UserId,
    pub is_typing: bool,
}

/// Vollstaendige gespeicherte Nachricht
///
/// Wird sowohl als `receive-message` (an den Empfaenger) als auch als
/// `message-sent` (Bestaetigung an den Absender) verschickt, damit
/// beide Seiten die autoritative persistierte Form sehen – inklusive
/// Server-vergebener ID und Zeitstempel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub message_type: String,
    /// RFC-3339-Zeitstempel
    pub created_at: String,
    pub is_read: bool,
    pub read_at: Option<String>,
}

/// Fehler beim Nachricht-Senden (nur an den Absender)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageErrorEvent {
    pub error: String,
}

/// Weitergeleitetes Offer an den Angerufenen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferForwardEvent {
    pub from: UserId,
    pub name: String,
    pub offer: Value,
}

/// Weitergeleitete Answer an den Anrufer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerForwardEvent {
    pub answer: Value,
}

/// Weitergeleiteter ICE-Kandidat an die Gegenseite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateForwardEvent {
    pub candidate: Value,
    pub from: UserId,
}

// ---------------------------------------------------------------------------
// Haupt-Enums: ClientEvent / ServerEvent
// ---------------------------------------------------------------------------

/// Alle eingehenden Ereignisse (Client -> Relay)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    UserOnline(UserOnlineEvent),
    TypingStart(TypingEvent),
    TypingStop(TypingEvent),
    SendMessage(SendMessageEvent),
    Offer(OfferEvent),
    Answer(AnswerEvent),
    IceCandidate(IceCandidateEvent),
    RejectCall(CallTargetEvent),
    EndCall(CallTargetEvent),
}

/// Alle ausgehenden Ereignisse (Relay -> Client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    UserStatusChange(UserStatusChangeEvent),
    UserTyping(UserTypingEvent),
    ReceiveMessage(MessageInfo),
    MessageSent(MessageInfo),
    MessageError(MessageErrorEvent),
    Offer(OfferForwardEvent),
    Answer(AnswerForwardEvent),
    IceCandidate(IceCandidateForwardEvent),
    CallRejected,
    CallEnded,
}
