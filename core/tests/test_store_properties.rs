use labichat_core::{MemoryStorage, Message, ThreadStore};
use proptest::prelude::*;
use std::sync::Arc;

const ADDRESSES: [&str; 4] = ["0xA", "0xB", "0xC", "0xD"];

fn arb_message() -> impl Strategy<Value = (usize, usize, String, u64)> {
    (0..ADDRESSES.len(), 0..ADDRESSES.len(), "[a-z ]{1,12}", 0u64..10_000)
}

fn build(ops: &[(usize, usize, String, u64)]) -> (ThreadStore, Vec<Message>) {
    let threads = ThreadStore::new(Arc::new(MemoryStorage::new()));
    let mut added = Vec::new();
    for (i, (from, to, content, timestamp)) in ops.iter().enumerate() {
        let message = Message {
            id: format!("m{}", i),
            from: ADDRESSES[*from].to_string(),
            to: ADDRESSES[*to].to_string(),
            content: content.clone(),
            timestamp: *timestamp,
            signature: None,
        };
        threads.add_message(message.clone()).unwrap();
        added.push(message);
    }
    (threads, added)
}

proptest! {
    #[test]
    fn prop_get_messages_order_insensitive(ops in prop::collection::vec(arb_message(), 0..40)) {
        let (threads, _) = build(&ops);
        for a in ADDRESSES {
            for b in ADDRESSES {
                prop_assert_eq!(threads.get_messages(a, b), threads.get_messages(b, a));
            }
        }
    }

    #[test]
    fn prop_added_message_is_last(ops in prop::collection::vec(arb_message(), 1..40)) {
        let (threads, added) = build(&ops);
        let last = added.last().unwrap();
        let messages = threads.get_messages(&last.from, &last.to);
        prop_assert_eq!(messages.last(), Some(last));
    }

    #[test]
    fn prop_rooms_contain_user(ops in prop::collection::vec(arb_message(), 0..40)) {
        let (threads, _) = build(&ops);
        for user in ADDRESSES {
            for room in threads.get_chat_rooms(user) {
                prop_assert!(room.participants.iter().any(|p| p == user));
                prop_assert_eq!(room.last_activity, room.messages.last().unwrap().timestamp);
            }
        }
    }

    #[test]
    fn prop_recent_chats_descending(ops in prop::collection::vec(arb_message(), 0..40)) {
        let (threads, _) = build(&ops);
        for user in ADDRESSES {
            let recent = threads.get_recent_chats(user);
            for pair in recent.windows(2) {
                prop_assert!(pair[0].last_message.timestamp >= pair[1].last_message.timestamp);
            }
        }
    }

    #[test]
    fn prop_one_room_per_pair(ops in prop::collection::vec(arb_message(), 0..40)) {
        let (threads, added) = build(&ops);
        let mut pairs: Vec<_> = added
            .iter()
            .map(|m| labichat_core::RoomKey::new(&m.from, &m.to))
            .collect();
        pairs.sort();
        pairs.dedup();
        prop_assert_eq!(threads.verify().unwrap().rooms, pairs.len());
        prop_assert_eq!(threads.verify().unwrap().messages, added.len());
    }

    #[test]
    fn prop_reads_are_idempotent(ops in prop::collection::vec(arb_message(), 0..40)) {
        let (threads, _) = build(&ops);
        prop_assert_eq!(threads.get_messages("0xA", "0xB"), threads.get_messages("0xA", "0xB"));
        prop_assert_eq!(threads.get_recent_chats("0xC"), threads.get_recent_chats("0xC"));
    }

    #[test]
    fn prop_clear_empties_everything(ops in prop::collection::vec(arb_message(), 0..40)) {
        let (threads, _) = build(&ops);
        threads.clear_all_chats().unwrap();
        for user in ADDRESSES {
            prop_assert!(threads.get_chat_rooms(user).is_empty());
        }
    }
}
