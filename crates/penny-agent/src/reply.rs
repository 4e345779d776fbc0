// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splitting replies to fit the channel and recording them as they go out.

use std::sync::Arc;

use penny_core::types::NewMessage;
use penny_core::{ChannelAdapter, StorageAdapter};
use tracing::{debug, error, warn};

/// Splits `text` into chunks of at most `max_len` bytes.
///
/// Lines are kept whole where possible. A line longer than `max_len` is
/// split at its last space before the limit, or hard-split at a char
/// boundary if it has none. Chunks are trimmed and never empty.
pub fn split_reply(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let mut line = line;
        while line.len() > max_len {
            flush(&mut current, &mut chunks);
            let (head, tail) = split_long_line(line, max_len);
            push_chunk(head, &mut chunks);
            line = tail;
        }

        let needed = if current.is_empty() {
            line.len()
        } else {
            current.len() + 1 + line.len()
        };
        if needed > max_len {
            flush(&mut current, &mut chunks);
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    flush(&mut current, &mut chunks);
    chunks
}

fn flush(current: &mut String, chunks: &mut Vec<String>) {
    push_chunk(current, chunks);
    current.clear();
}

fn push_chunk(text: &str, chunks: &mut Vec<String>) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn split_long_line(line: &str, max_len: usize) -> (&str, &str) {
    let mut boundary = max_len;
    while !line.is_char_boundary(boundary) {
        boundary -= 1;
    }
    if boundary == 0 {
        // A single char wider than the limit still has to go somewhere.
        boundary = line.chars().next().map_or(line.len(), char::len_utf8);
    }

    let region = &line[..boundary];
    match region.rfind(' ') {
        Some(pos) if pos > 0 => (&line[..pos], line[pos + 1..].trim_start()),
        _ => (region, &line[boundary..]),
    }
}

/// Where a reply goes and what it hangs off.
pub struct Delivery<'a> {
    pub sender: &'a str,
    pub recipient: &'a str,
    /// Record the first chunk replies to. `None` starts a new thread.
    pub parent_id: Option<i64>,
    pub attachments: &'a [String],
}

/// Records and sends a reply, chunked to the channel's limit.
///
/// Each chunk is stored before it is sent, with the previous stored chunk as
/// its parent. Multi-part replies carry `chunk_index` 0..n counted over the
/// chunks actually stored, so a failed write leaves no gap in the run;
/// single-part replies carry none. Attachments ride on the first chunk.
/// Storage failures are logged and do not stop the send. Returns the id of
/// the last stored chunk.
pub async fn deliver(
    store: &Arc<dyn StorageAdapter>,
    channel: &Arc<dyn ChannelAdapter>,
    delivery: Delivery<'_>,
    text: &str,
) -> Option<i64> {
    let chunks = split_reply(text, channel.max_message_length());
    let multipart = chunks.len() > 1;
    let mut parent_id = delivery.parent_id;
    let mut stored: u32 = 0;

    for (index, chunk) in chunks.iter().enumerate() {
        let record = NewMessage::outgoing(delivery.sender, delivery.recipient, chunk.as_str())
            .with_parent(parent_id)
            .with_chunk_index(multipart.then_some(stored));

        match store.append_message(&record).await {
            Ok(id) => {
                parent_id = Some(id);
                stored += 1;
            }
            Err(e) => warn!(error = %e, index, "failed to record outgoing message"),
        }

        let attachments: &[String] = if index == 0 { delivery.attachments } else { &[] };
        if let Err(e) = channel
            .send_message(delivery.recipient, chunk, attachments)
            .await
        {
            error!(recipient = delivery.recipient, error = %e, "failed to send reply");
        }
    }

    debug!(recipient = delivery.recipient, chunks = chunks.len(), "reply delivered");
    parent_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use penny_core::types::Direction;
    use penny_test_utils::{FlakyStore, MockChannel, TempStore};
    use proptest::prelude::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_reply("hello\nworld", 100), vec!["hello\nworld"]);
    }

    #[test]
    fn splits_on_line_boundaries() {
        let text = "first line\nsecond line\nthird line";
        assert_eq!(
            split_reply(text, 22),
            vec!["first line\nsecond line", "third line"]
        );
    }

    #[test]
    fn long_line_splits_at_space_then_hard() {
        assert_eq!(
            split_reply("OneLongWordThen another word", 20),
            vec!["OneLongWordThen", "another word"]
        );
        assert_eq!(
            split_reply("abcdefghijklmnopqrstuvwxyz", 10),
            vec!["abcdefghij", "klmnopqrst", "uvwxyz"]
        );
    }

    #[test]
    fn blank_text_yields_no_chunks() {
        assert!(split_reply("\n  \n", 10).is_empty());
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let chunks = split_reply("ééééé", 4);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
    }

    proptest! {
        #[test]
        fn chunks_fit_and_keep_content(text in "[a-z \\n]{0,300}", max_len in 4usize..60) {
            let chunks = split_reply(&text, max_len);
            for chunk in &chunks {
                prop_assert!(chunk.len() <= max_len);
                prop_assert!(!chunk.is_empty());
            }
            let original: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            let rebuilt: String = chunks.concat().chars().filter(|c| !c.is_whitespace()).collect();
            prop_assert_eq!(original, rebuilt);
        }
    }

    #[tokio::test]
    async fn multipart_reply_is_chained_and_indexed() {
        let temp = TempStore::new().await.unwrap();
        let store = temp.adapter();
        let mock = Arc::new(MockChannel::new().with_max_message_length(12));
        let channel: Arc<dyn ChannelAdapter> = mock.clone();

        let root = store
            .append_message(&NewMessage::incoming("+1", "penny", "question"))
            .await
            .unwrap();
        let images = vec!["aW1n".to_string()];
        let last = deliver(
            &store,
            &channel,
            Delivery {
                sender: "penny",
                recipient: "+1",
                parent_id: Some(root),
                attachments: &images,
            },
            "part one\npart two\npart three",
        )
        .await
        .unwrap();

        let sent = mock.sent_messages().await;
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].attachments, images);
        assert!(sent[1].attachments.is_empty());

        let third = store.get_message(last).await.unwrap().unwrap();
        assert_eq!(third.content, "part three");
        assert_eq!(third.chunk_index, Some(2));
        assert_eq!(third.direction, Direction::Outgoing);
        let second = store.get_message(third.parent_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(second.chunk_index, Some(1));
        let first = store.get_message(second.parent_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(first.chunk_index, Some(0));
        assert_eq!(first.parent_id, Some(root));
    }

    #[tokio::test]
    async fn failed_chunk_write_leaves_no_gap() {
        let temp = TempStore::new().await.unwrap();
        let store: Arc<dyn StorageAdapter> = Arc::new(FlakyStore::new(temp.adapter(), vec![2]));
        let mock = Arc::new(MockChannel::new().with_max_message_length(12));
        let channel: Arc<dyn ChannelAdapter> = mock.clone();

        let last = deliver(
            &store,
            &channel,
            Delivery {
                sender: "penny",
                recipient: "+1",
                parent_id: None,
                attachments: &[],
            },
            "part one\npart two\npart three",
        )
        .await
        .unwrap();

        assert_eq!(mock.sent_count().await, 3);
        let third = store.get_message(last).await.unwrap().unwrap();
        assert_eq!(third.content, "part three");
        assert_eq!(third.chunk_index, Some(1));
        let first = store.get_message(third.parent_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(first.content, "part one");
        assert_eq!(first.chunk_index, Some(0));
        assert_eq!(first.parent_id, None);
    }

    #[tokio::test]
    async fn single_reply_has_no_chunk_index() {
        let temp = TempStore::new().await.unwrap();
        let store = temp.adapter();
        let channel: Arc<dyn ChannelAdapter> = Arc::new(MockChannel::new());

        let id = deliver(
            &store,
            &channel,
            Delivery {
                sender: "penny",
                recipient: "+1",
                parent_id: None,
                attachments: &[],
            },
            "hi",
        )
        .await
        .unwrap();
        let record = store.get_message(id).await.unwrap().unwrap();
        assert_eq!(record.chunk_index, None);
        assert_eq!(record.parent_id, None);
    }
}
