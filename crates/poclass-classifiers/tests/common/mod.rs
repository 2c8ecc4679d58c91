//! Shared fixtures for cascade tests
//!
//! Provides a scripted language model client and a small taxonomy.

#![allow(dead_code)]

use async_trait::async_trait;
use poclass_classifiers::LlmClient;
use poclass_core::{ChatMessage, Classification, ClassificationCache, Error, Result, Taxonomy, Triple};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Reply {
    /// Return this text as the model's content
    Text(String),
    /// Fail the call
    Fail,
    /// Sleep, then return the text
    Slow(Duration, String),
}

/// A language model client that replays a script
///
/// Once the script is exhausted every call fails.
pub struct MockLlmClient {
    script: Mutex<VecDeque<Reply>>,
    call_count: AtomicU32,
    last_messages: Mutex<Vec<ChatMessage>>,
    temperatures: Mutex<Vec<f32>>,
}

impl MockLlmClient {
    pub fn new(script: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            call_count: AtomicU32::new(0),
            last_messages: Mutex::new(Vec::new()),
            temperatures: Mutex::new(Vec::new()),
        }
    }

    /// A client that always answers with `text`
    pub fn always(text: impl Into<String>, times: usize) -> Self {
        let text = text.into();
        Self::new(std::iter::repeat(Reply::Text(text)).take(times))
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Messages sent on the most recent call
    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().unwrap().clone()
    }

    /// Temperature passed on each call, in order
    pub fn temperatures(&self) -> Vec<f32> {
        self.temperatures.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        self.temperatures.lock().unwrap().push(temperature);

        let reply = self.script.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Slow(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(Reply::Fail) => Err(Error::llm("HTTP 503: upstream unavailable")),
            None => Err(Error::llm("script exhausted")),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

/// A cache whose reads and writes always fail
#[derive(Default)]
pub struct FailingCache {
    get_calls: AtomicU32,
    set_calls: AtomicU32,
}

impl FailingCache {
    pub fn get_calls(&self) -> u32 {
        self.get_calls.load(Ordering::Relaxed)
    }

    pub fn set_calls(&self) -> u32 {
        self.set_calls.load(Ordering::Relaxed)
    }
}

impl ClassificationCache for FailingCache {
    fn get(&self, _description: &str, _supplier: &str) -> Result<Option<Classification>> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        Err(Error::cache("backing store unavailable"))
    }

    fn set(&self, _description: &str, _supplier: &str, _result: &Classification) -> Result<()> {
        self.set_calls.fetch_add(1, Ordering::Relaxed);
        Err(Error::cache("backing store unavailable"))
    }
}

pub fn taxonomy() -> Arc<Taxonomy> {
    Arc::new(
        Taxonomy::new(
            "2025.1-test",
            vec![
                Triple::new("IT", "Hardware", "Laptop"),
                Triple::new("IT", "Software", "Subscription"),
                Triple::new("T&E", "Air", "Not sure"),
                Triple::new("T&E", "Hotel", "Not sure"),
                Triple::new("Facilities", "Maintenance", "Pest Control"),
                Triple::new("Marketing", "Events", "Sponsorship"),
            ],
        )
        .unwrap(),
    )
}

/// A response that passes validation against [`taxonomy`]
pub fn valid_response(description: &str) -> String {
    serde_json::json!({
        "po_description": description,
        "L1": "Facilities",
        "L2": "Maintenance",
        "L3": "Pest Control",
        "confidence": 0.82,
        "reason": "Recurring pest control service"
    })
    .to_string()
}
