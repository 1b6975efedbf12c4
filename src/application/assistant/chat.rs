//! Energy assistant chat panel
//!
//! Keeps the conversation transcript and answers every user message with a
//! canned reply after a short delay. The reply tasks belong to the panel:
//! [`Assistant::close`] (or dropping the panel) cancels any still pending.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::AssistantConfig;
use crate::notifications::{AssistantEvent, Event, SharedEventBus};

pub const GREETING: &str =
    "Hello! I'm your energy assistant powered by Gemini. How can I help you today?";

pub const CANNED_REPLY: &str = "I'm connecting you to Gemini AI for advanced energy management \
     assistance. Please visit: https://gemini.google.com/app";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    #[serde(rename = "sender")]
    pub speaker: Speaker,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            speaker,
            timestamp: Utc::now(),
        }
    }
}

pub struct Assistant {
    dashboard_id: String,
    reply_delay: Duration,
    transcript: Arc<RwLock<Vec<ChatMessage>>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
    event_bus: Option<SharedEventBus>,
}

impl Assistant {
    /// A fresh panel holding only the greeting.
    pub fn new(dashboard_id: impl Into<String>, reply_delay: Duration) -> Self {
        Self {
            dashboard_id: dashboard_id.into(),
            reply_delay,
            transcript: Arc::new(RwLock::new(vec![ChatMessage::new(Speaker::Bot, GREETING)])),
            pending: Mutex::new(Vec::new()),
            event_bus: None,
        }
    }

    pub fn from_config(dashboard_id: impl Into<String>, config: &AssistantConfig) -> Self {
        Self::new(dashboard_id, config.reply_delay())
    }

    pub fn with_event_bus(mut self, event_bus: SharedEventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Append the user's message and schedule the reply.
    ///
    /// Returns `false` without touching the transcript when `text` is blank.
    pub async fn send(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        self.transcript
            .write()
            .await
            .push(ChatMessage::new(Speaker::User, text));
        debug!(dashboard_id = %self.dashboard_id, "Assistant received message");

        let transcript = self.transcript.clone();
        let delay = self.reply_delay;
        let dashboard_id = self.dashboard_id.clone();
        let event_bus = self.event_bus.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let reply = ChatMessage::new(Speaker::Bot, CANNED_REPLY);
            let timestamp = reply.timestamp;
            transcript.write().await.push(reply);

            if let Some(bus) = event_bus {
                bus.publish(Event::AssistantReplied(AssistantEvent {
                    dashboard_id,
                    text: CANNED_REPLY.to_string(),
                    timestamp,
                }));
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(task);
        }
        true
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.clone()
    }

    /// Replies scheduled but not yet appended
    pub fn pending_replies(&self) -> usize {
        self.pending
            .lock()
            .map(|p| p.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    /// Cancel every pending reply.
    pub fn close(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            let cancelled = pending.iter().filter(|h| !h.is_finished()).count();
            for task in pending.drain(..) {
                task.abort();
            }
            if cancelled > 0 {
                info!(dashboard_id = %self.dashboard_id, cancelled, "Assistant closed with pending replies");
            }
        }
    }
}

impl Drop for Assistant {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn starts_with_greeting() {
        let assistant = Assistant::new("dash", Duration::from_secs(1));
        let transcript = assistant.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].speaker, Speaker::Bot);
        assert_eq!(transcript[0].text, GREETING);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_message_is_ignored() {
        let assistant = Assistant::new("dash", Duration::from_secs(1));
        assert!(!assistant.send("   ").await);
        assert!(!assistant.send("").await);
        assert_eq!(assistant.transcript().await.len(), 1);
        assert_eq!(assistant.pending_replies(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_arrives_after_delay() {
        let bus = crate::notifications::create_event_bus();
        let mut sub = bus.subscribe();
        let assistant = Assistant::new("dash", Duration::from_secs(1)).with_event_bus(bus);

        assert!(assistant.send("  how much solar today? ").await);
        let transcript = assistant.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].speaker, Speaker::User);
        assert_eq!(transcript[1].text, "how much solar today?");

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(assistant.transcript().await.len(), 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let transcript = assistant.transcript().await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2].speaker, Speaker::Bot);
        assert_eq!(transcript[2].text, CANNED_REPLY);

        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.event.event_type(), "assistant_replied");
        assert_eq!(msg.event.dashboard_id(), Some("dash"));
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_pending_replies() {
        let assistant = Assistant::new("dash", Duration::from_secs(1));
        assistant.send("one").await;
        assistant.send("two").await;
        assert_eq!(assistant.pending_replies(), 2);

        assistant.close();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let transcript = assistant.transcript().await;
        assert_eq!(transcript.len(), 3);
        assert!(transcript.iter().all(|m| m.text != CANNED_REPLY));
    }

    #[test]
    fn message_serializes_with_sender_field() {
        let msg = ChatMessage::new(Speaker::User, "hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sender"], "user");
        assert_eq!(json["text"], "hi");
    }
}
