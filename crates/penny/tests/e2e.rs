// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the assembled agent.
//!
//! Each test builds a [`Penny`] over a temp SQLite store with mock channel,
//! inference and tools, then drives it through the message agent or the
//! background scheduler.

use std::sync::Arc;

use penny_agent::Penny;
use penny_config::PennyConfig;
use penny_core::types::InboundMessage;
use penny_core::{Direction, StorageAdapter};
use penny_skill::ToolRegistry;
use penny_test_utils::{reply, tool_call, MockChannel, MockInference, MockTool, TempStore};
use tokio_util::sync::CancellationToken;

const USER: &str = "+15550001234";

struct Harness {
    _temp: TempStore,
    store: Arc<dyn StorageAdapter>,
    channel: Arc<MockChannel>,
    foreground: Arc<MockInference>,
    background: Arc<MockInference>,
    penny: Penny,
}

async fn harness(config: PennyConfig, channel: MockChannel, tools: Vec<MockTool>) -> Harness {
    let temp = TempStore::new().await.unwrap();
    let store = temp.adapter();
    let channel = Arc::new(channel);
    let foreground = Arc::new(MockInference::new());
    let background = Arc::new(MockInference::new());

    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(Arc::new(tool));
    }

    let penny = Penny::new(
        config,
        "You are Penny.",
        channel.clone(),
        Arc::clone(&store),
        foreground.clone(),
        background.clone(),
        registry,
    );
    Harness {
        _temp: temp,
        store,
        channel,
        foreground,
        background,
        penny,
    }
}

fn inbound(content: &str, quoted: Option<&str>) -> InboundMessage {
    InboundMessage {
        sender: USER.into(),
        content: content.into(),
        quoted_text: quoted.map(str::to_string),
    }
}

#[tokio::test]
async fn search_answer_gets_source_url() {
    let h = harness(
        PennyConfig::default(),
        MockChannel::new(),
        vec![MockTool::search("Sunny, 21C", &["https://weather.example/today"])],
    )
    .await;
    h.foreground
        .push(tool_call("search", serde_json::json!({"query": "weather today"})))
        .await;
    h.foreground.push(reply("It's sunny and 21C today.")).await;

    h.penny.message_agent().handle(inbound("what's the weather?", None)).await;

    let sent = h.channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, USER);
    assert_eq!(
        sent[0].text,
        "It's sunny and 21C today.\n\nhttps://weather.example/today"
    );

    // The second request carries the search result back to the model.
    let requests = h.foreground.requests().await;
    assert_eq!(requests.len(), 2);
    let last = requests[1].messages.last().unwrap();
    assert!(last.content.contains("Sunny, 21C"));
    assert!(last.content.contains("https://weather.example/today"));
}

#[tokio::test]
async fn long_reply_is_sent_and_stored_in_chunks() {
    let h = harness(
        PennyConfig::default(),
        MockChannel::new().with_max_message_length(40),
        Vec::new(),
    )
    .await;
    h.foreground
        .push(reply(
            "First paragraph of the answer here.\n\
             A second one that also needs room.\n\
             Finally a short third.",
        ))
        .await;

    h.penny.message_agent().handle(inbound("tell me a lot", None)).await;

    let sent = h.channel.sent_messages().await;
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|m| m.text.len() <= 40));

    let records = h.store.recent_between(USER, "penny", 10).await.unwrap();
    let outgoing: Vec<_> = records
        .iter()
        .filter(|r| r.direction == Direction::Outgoing)
        .collect();
    assert_eq!(outgoing.len(), 3);
    let mut indexes: Vec<_> = outgoing.iter().filter_map(|r| r.chunk_index).collect();
    indexes.sort_unstable();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[tokio::test]
async fn quote_reply_continues_the_quoted_thread() {
    let h = harness(PennyConfig::default(), MockChannel::new(), Vec::new()).await;
    h.foreground.push(reply("Pasta is a good pick tonight.")).await;
    h.foreground.push(reply("Rain is expected tomorrow.")).await;
    h.foreground.push(reply("Try carbonara.")).await;

    let agent = h.penny.message_agent();
    agent.handle(inbound("what should I cook?", None)).await;
    agent.handle(inbound("will it rain?", None)).await;
    agent
        .handle(inbound("which pasta?", Some("Pasta is a good pick tonight.")))
        .await;

    // Only the quoted thread is history for the third run, not the rain exchange.
    let requests = h.foreground.requests().await;
    let history: Vec<&str> = requests[2].messages[1..]
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(
        history,
        vec!["what should I cook?", "Pasta is a good pick tonight.", "which pasta?"]
    );

    let quoted = h
        .store
        .find_latest_outgoing_by_content("Pasta is a good pick tonight.")
        .await
        .unwrap()
        .unwrap();
    let records = h.store.recent_between(USER, "penny", 10).await.unwrap();
    let follow_up = records.iter().find(|r| r.content == "which pasta?").unwrap();
    assert_eq!(follow_up.parent_id, Some(quoted.id));
}

#[tokio::test]
async fn idle_tick_summarizes_the_latest_thread() {
    let mut config = PennyConfig::default();
    config.scheduler.summarize_idle_secs = 0.0;
    let h = harness(config, MockChannel::new(), Vec::new()).await;
    h.foreground.push(reply("Paris is the capital of France.")).await;
    h.background
        .push(reply("The user asked about the capital of France."))
        .await;

    h.penny
        .message_agent()
        .handle(inbound("capital of France?", None))
        .await;

    let mut scheduler = h.penny.scheduler();
    let cancel = CancellationToken::new();
    let ran = scheduler.tick(&cancel).await;
    assert_eq!(ran, vec!["summarize".to_string()]);

    let records = h.store.recent_between(USER, "penny", 10).await.unwrap();
    let leaf = records
        .iter()
        .find(|r| r.direction == Direction::Outgoing)
        .unwrap();
    let leaf = h.store.get_message(leaf.id).await.unwrap().unwrap();
    assert_eq!(
        leaf.summary.as_deref(),
        Some("The user asked about the capital of France.")
    );

    // Nothing new happened, so the next tick stays quiet.
    assert!(scheduler.tick(&cancel).await.is_empty());
    assert_eq!(h.channel.sent_count().await, 1);
}

#[tokio::test]
async fn shutdown_closes_all_adapters() {
    let h = harness(
        PennyConfig::default(),
        MockChannel::new().with_connection_url("ws://127.0.0.1:9/receive"),
        Vec::new(),
    )
    .await;
    let (channel, foreground, background) = (
        h.channel.clone(),
        h.foreground.clone(),
        h.background.clone(),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    h.penny.run(cancel).await.unwrap();

    assert!(channel.is_closed().await);
    assert!(foreground.is_closed().await);
    assert!(background.is_closed().await);
}
