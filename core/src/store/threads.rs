// Two-party chat rooms persisted as one JSON blob
//
// The whole room collection lives under a single storage slot. Every write
// is load, modify, store. Two processes sharing a slot are not coordinated:
// the last writer wins.

use crate::message::{Message, RecentChat, Room, RoomKey};
use crate::store::backend::StorageBackend;
use crate::LabiError;
use std::collections::HashMap;
use std::sync::Arc;

/// Slot name used by the browser client
pub const DEFAULT_SLOT: &str = "labi-chat-messages";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub rooms: usize,
    pub messages: usize,
}

/// Decoded room collection with a pair index.
///
/// Rooms keep their storage order; `index` maps each canonical pair to the
/// first room holding it.
#[derive(Debug, Default)]
struct RoomBook {
    rooms: Vec<Room>,
    index: HashMap<RoomKey, usize>,
}

impl RoomBook {
    fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        let rooms: Vec<Room> = serde_json::from_str(raw)?;
        let mut index = HashMap::with_capacity(rooms.len());
        for (position, room) in rooms.iter().enumerate() {
            index.entry(room.key()).or_insert(position);
        }
        Ok(Self { rooms, index })
    }

    fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.rooms)
    }

    fn room(&self, a: &str, b: &str) -> Option<&Room> {
        self.index
            .get(&RoomKey::new(a, b))
            .and_then(|&position| self.rooms.get(position))
    }

    /// Append to the pair's room, opening it if needed. Returns true when a
    /// new room was created.
    fn insert(&mut self, message: Message) -> bool {
        let key = RoomKey::of(&message);
        match self.index.get(&key) {
            Some(&position) => {
                self.rooms[position].append(message);
                false
            }
            None => {
                self.index.insert(key, self.rooms.len());
                self.rooms.push(Room::open(message));
                true
            }
        }
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            rooms: self.rooms.len(),
            messages: self.rooms.iter().map(|r| r.messages.len()).sum(),
        }
    }
}

/// Chat room store over an injectable [`StorageBackend`].
#[derive(Clone)]
pub struct ThreadStore {
    backend: Arc<dyn StorageBackend>,
    slot: String,
}

impl ThreadStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_slot(backend, DEFAULT_SLOT)
    }

    pub fn with_slot(backend: Arc<dyn StorageBackend>, slot: impl Into<String>) -> Self {
        Self {
            backend,
            slot: slot.into(),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Read the raw blob, or `None` if the slot is empty.
    fn read_raw(&self) -> Result<Option<String>, LabiError> {
        self.backend.get(&self.slot).map_err(|e| {
            tracing::warn!("Failed to read chat slot {}: {}", self.slot, e);
            LabiError::StorageError
        })
    }

    /// Lenient load for queries: anything unreadable is an empty collection.
    fn load(&self) -> RoomBook {
        match self.read_raw() {
            Ok(raw) => self.decode_or_empty(raw),
            Err(_) => RoomBook::default(),
        }
    }

    /// Load for a write. A failed read aborts so stored rooms are never
    /// replaced by a fresh collection; an unparsable blob is still replaced.
    fn load_for_write(&self) -> Result<RoomBook, LabiError> {
        let raw = self.read_raw()?;
        Ok(self.decode_or_empty(raw))
    }

    fn decode_or_empty(&self, raw: Option<String>) -> RoomBook {
        let Some(raw) = raw else {
            return RoomBook::default();
        };

        match RoomBook::decode(&raw) {
            Ok(book) => book,
            Err(e) => {
                tracing::warn!(
                    "Chat slot {} is unparsable, treating as empty: {}",
                    self.slot,
                    e
                );
                RoomBook::default()
            }
        }
    }

    fn store(&self, book: &RoomBook) -> Result<(), LabiError> {
        let raw = book.encode().map_err(|_| LabiError::Internal)?;
        self.backend
            .put(&self.slot, &raw)
            .map_err(|_| LabiError::StorageError)
    }

    /// Append a message to the room of its sender/recipient pair, opening
    /// the room on first contact.
    ///
    /// An unparsable stored collection is replaced, not reported. A failed
    /// read or write of the backend is `StorageError`, and nothing is written
    /// after a failed read.
    pub fn add_message(&self, message: Message) -> Result<(), LabiError> {
        let mut book = self.load_for_write()?;
        let (id, from, to) = (message.id.clone(), message.from.clone(), message.to.clone());

        if book.insert(message) {
            tracing::debug!("Opened room {} <-> {}", from, to);
        }
        self.store(&book)?;

        tracing::debug!("Stored message {} ({} rooms)", id, book.rooms.len());
        Ok(())
    }

    /// Messages exchanged between two addresses, in insertion order.
    /// Argument order does not matter.
    pub fn get_messages(&self, user1: &str, user2: &str) -> Vec<Message> {
        self.load()
            .room(user1, user2)
            .map(|room| room.messages.clone())
            .unwrap_or_default()
    }

    /// Every room `user_address` takes part in, in storage order.
    pub fn get_chat_rooms(&self, user_address: &str) -> Vec<Room> {
        self.load()
            .rooms
            .into_iter()
            .filter(|room| room.has_participant(user_address))
            .collect()
    }

    /// Conversation list for `user_address`, most recent first.
    pub fn get_recent_chats(&self, user_address: &str) -> Vec<RecentChat> {
        let mut chats: Vec<RecentChat> = self
            .get_chat_rooms(user_address)
            .iter()
            .filter_map(|room| {
                let last = room.last_message()?;
                Some(RecentChat {
                    other_user: room.other_participant(user_address).to_string(),
                    last_message: last.clone(),
                    unread_count: 0,
                })
            })
            .collect();

        chats.sort_by(|a, b| b.last_message.timestamp.cmp(&a.last_message.timestamp));
        chats
    }

    /// Drop every room. There is no undo.
    pub fn clear_all_chats(&self) -> Result<(), LabiError> {
        self.backend
            .remove(&self.slot)
            .map_err(|_| LabiError::StorageError)?;
        tracing::info!("Cleared chat slot {}", self.slot);
        Ok(())
    }

    /// Strict load that reports a corrupted slot instead of hiding it.
    pub fn verify(&self) -> Result<StoreStats, LabiError> {
        match self.read_raw()? {
            None => Ok(StoreStats::default()),
            Some(raw) => RoomBook::decode(&raw)
                .map(|book| book.stats())
                .map_err(|_| LabiError::CorruptedStore),
        }
    }

    pub fn flush(&self) -> Result<(), LabiError> {
        self.backend.flush().map_err(|e| {
            tracing::warn!("Failed to flush chat slot {}: {}", self.slot, e);
            LabiError::StorageError
        })
    }
}
