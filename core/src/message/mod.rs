// Message module — chat messages, rooms and conversation summaries

pub mod types;

pub use types::{Message, RecentChat, Room, RoomKey};
