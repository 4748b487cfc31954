// Message types — messages, two-party rooms and conversation summaries

use crate::LabiError;
use serde::{Deserialize, Serialize};

/// A chat message between two addresses.
///
/// Field names and shape match the JSON the browser client stores, so an
/// existing `localStorage` blob decodes without migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID (UUID v4)
    pub id: String,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Message text
    pub content: String,
    /// Unix timestamp (milliseconds)
    pub timestamp: u64,
    /// Opaque signature, never checked here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Message {
    /// Create a new message stamped with a fresh ID and the current time
    pub fn new(from: String, to: String, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            from,
            to,
            content,
            timestamp: crate::now_millis(),
            signature: None,
        }
    }

    /// Build a message from composer input: surrounding whitespace is
    /// dropped and blank text is rejected.
    pub fn compose(from: String, to: String, raw: &str) -> Result<Self, LabiError> {
        let content = raw.trim();
        if content.is_empty() || from.is_empty() || to.is_empty() {
            return Err(LabiError::InvalidInput);
        }
        Ok(Self::new(from, to, content.to_string()))
    }

    pub fn with_signature(mut self, signature: String) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Whether `address` sent or received this message
    pub fn involves(&self, address: &str) -> bool {
        self.from == address || self.to == address
    }
}

/// Canonical key for an unordered participant pair.
///
/// (A, B) and (B, A) produce the same key. The pair is kept as a sorted
/// tuple rather than a joined string so no separator can collide with
/// address contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomKey {
    low: String,
    high: String,
}

impl RoomKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    pub fn of(message: &Message) -> Self {
        Self::new(&message.from, &message.to)
    }

    pub fn members(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }
}

/// A two-party conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Both addresses, in the order they were first seen
    pub participants: [String; 2],
    /// Messages in insertion order
    pub messages: Vec<Message>,
    /// Timestamp of the last appended message
    pub last_activity: u64,
}

impl Room {
    /// Open a room with its first message
    pub fn open(first: Message) -> Self {
        Self {
            participants: [first.from.clone(), first.to.clone()],
            last_activity: first.timestamp,
            messages: vec![first],
        }
    }

    pub fn key(&self) -> RoomKey {
        RoomKey::new(&self.participants[0], &self.participants[1])
    }

    pub fn has_participant(&self, address: &str) -> bool {
        self.participants.iter().any(|p| p == address)
    }

    pub fn append(&mut self, message: Message) {
        self.last_activity = message.timestamp;
        self.messages.push(message);
    }

    /// The participant that is not `address`. A room with oneself
    /// answers with `address`.
    pub fn other_participant<'a>(&'a self, address: &'a str) -> &'a str {
        self.participants
            .iter()
            .find(|p| p.as_str() != address)
            .map(String::as_str)
            .unwrap_or(address)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Summary row for a conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentChat {
    pub other_user: String,
    pub last_message: Message,
    /// Read tracking does not exist yet; always 0
    pub unread_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(from: &str, to: &str, content: &str, timestamp: u64) -> Message {
        Message {
            id: format!("{}-{}", from, timestamp),
            from: from.to_string(),
            to: to.to_string(),
            content: content.to_string(),
            timestamp,
            signature: None,
        }
    }

    #[test]
    fn test_create_message() {
        let msg = Message::new("0xA".into(), "0xB".into(), "hello".into());

        assert_eq!(msg.from, "0xA");
        assert_eq!(msg.to, "0xB");
        assert!(!msg.id.is_empty());
        assert!(msg.timestamp > 0);
        assert!(msg.signature.is_none());
    }

    #[test]
    fn test_message_ids_unique() {
        let a = Message::new("0xA".into(), "0xB".into(), "x".into());
        let b = Message::new("0xA".into(), "0xB".into(), "x".into());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_compose_trims_and_rejects_blank() {
        let msg = Message::compose("0xA".into(), "0xB".into(), "  hi there \n").unwrap();
        assert_eq!(msg.content, "hi there");

        assert_eq!(
            Message::compose("0xA".into(), "0xB".into(), "   "),
            Err(LabiError::InvalidInput)
        );
        assert_eq!(
            Message::compose(String::new(), "0xB".into(), "hi"),
            Err(LabiError::InvalidInput)
        );
    }

    #[test]
    fn test_room_key_is_order_insensitive() {
        assert_eq!(RoomKey::new("0xA", "0xB"), RoomKey::new("0xB", "0xA"));
        assert_ne!(RoomKey::new("0xA", "0xB"), RoomKey::new("0xa", "0xB"));
        // A joined-string key would confuse these two pairs
        assert_ne!(RoomKey::new("a:b", "c"), RoomKey::new("a", "b:c"));
    }

    #[test]
    fn test_room_append_tracks_last_activity() {
        let mut room = Room::open(message("0xA", "0xB", "hi", 1000));
        assert_eq!(room.participants, ["0xA".to_string(), "0xB".to_string()]);
        assert_eq!(room.last_activity, 1000);

        // Out-of-order timestamps are kept in call order
        room.append(message("0xB", "0xA", "late", 500));
        assert_eq!(room.last_activity, 500);
        assert_eq!(room.last_message().unwrap().content, "late");
        assert_eq!(room.messages.len(), 2);
    }

    #[test]
    fn test_other_participant() {
        let room = Room::open(message("0xA", "0xB", "hi", 1));
        assert_eq!(room.other_participant("0xA"), "0xB");
        assert_eq!(room.other_participant("0xB"), "0xA");

        let solo = Room::open(message("0xA", "0xA", "note to self", 1));
        assert_eq!(solo.other_participant("0xA"), "0xA");
    }

    #[test]
    fn test_other_participant_outlives_query_borrow() {
        let room = Room::open(message("0xA", "0xB", "hi", 1));
        let others: Vec<String> = ["0xA", "0xB"]
            .iter()
            .map(|me| me.to_string())
            .map(|me| room.other_participant(&me).to_string())
            .collect();
        assert_eq!(others, vec!["0xB", "0xA"]);
    }

    #[test]
    fn test_wire_shape() {
        let room = Room::open(message("0xA", "0xB", "hi", 1000));
        let json = serde_json::to_value(&room).unwrap();

        assert_eq!(json["participants"], serde_json::json!(["0xA", "0xB"]));
        assert_eq!(json["lastActivity"], 1000);
        assert_eq!(json["messages"][0]["content"], "hi");
        assert!(json["messages"][0].get("signature").is_none());
    }

    #[test]
    fn test_decode_browser_blob() {
        let raw = r#"[{"participants":["0xA","0xB"],"messages":[{"id":"1700000000000-k3j2h1g0f","from":"0xA","to":"0xB","content":"gm","timestamp":1700000000000,"signature":"0xsig"}],"lastActivity":1700000000000}]"#;
        let rooms: Vec<Room> = serde_json::from_str(raw).unwrap();

        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].messages[0].signature.as_deref(), Some("0xsig"));
        assert_eq!(rooms[0].last_activity, 1_700_000_000_000);
    }
}
