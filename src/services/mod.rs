//! Interfaces to external collaborators.
//!
//! Handlers talk to OAuth providers, payment gateways, caches, task queues,
//! language models and the like through these traits. The dispatcher never
//! touches them: a handler struct holds an `Arc<dyn …>` to the services it
//! needs, handed to it once at registration time.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use easyapi::{Dispatcher, Handler, HandlerResult, Request, Response};
//! use easyapi::services::{Cache, MemoryCache};
//! use http::Method;
//!
//! struct CachedData {
//!     cache: Arc<dyn Cache>,
//! }
//!
//! impl Handler for CachedData {
//!     fn call(&self, _req: &Request) -> HandlerResult {
//!         if let Some(hit) = self.cache.get("my_data")? {
//!             return Ok(Response::text(String::from_utf8(hit)?));
//!         }
//!         let data = "This is some cached data";
//!         self.cache.set("my_data", data.as_bytes().to_vec(), Duration::from_secs(600))?;
//!         Ok(Response::text(data))
//!     }
//! }
//!
//! let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
//! let app = Dispatcher::new().add_route("/cached_data", CachedData { cache }, [Method::GET]);
//! assert_eq!(app.handle(Request::new(Method::GET, "/cached_data")).body(), b"This is some cached data");
//! ```

mod memory;
mod oauth;

use std::time::Duration;

pub use memory::MemoryCache;
pub use oauth::{OAuthEndpoints, Token};

/// OAuth 2 authorization-code flow.
pub trait OAuthProvider: Send + Sync {
    /// URL to send the user to, and the `state` value to check on callback.
    fn authorization_url(&self) -> anyhow::Result<(String, String)>;
    /// Exchanges the callback URL for a token.
    fn fetch_token(&self, authorization_response: &str) -> anyhow::Result<Token>;
    fn refresh_token(&self, refresh_token: &str) -> anyhow::Result<Token>;
}

/// Payment processing. Identifiers are the gateway's own.
pub trait PaymentGateway: Send + Sync {
    /// Returns the payment intent id. `amount` is in the currency's minor unit.
    fn create_payment_intent(&self, amount: u64, currency: &str, customer_id: Option<&str>) -> anyhow::Result<String>;
    /// Returns the subscription id.
    fn create_subscription(&self, customer_id: &str, price_id: &str) -> anyhow::Result<String>;
    /// Returns the customer id.
    fn create_customer(&self, email: &str) -> anyhow::Result<String>;
    /// Verifies and decodes a webhook delivery. `None` when the signature does not check out.
    fn handle_webhook(&self, payload: &[u8], signature: &str) -> anyhow::Result<Option<WebhookEvent>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookEvent {
    /// e.g. `payment_intent.succeeded`
    pub kind: String,
    pub payload: Vec<u8>,
}

/// Key/value cache with per-entry expiry.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;
    fn flush(&self) -> anyhow::Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Started,
    Success,
    Failure,
    Retry,
}

/// Background job queue.
pub trait TaskQueue: Send + Sync {
    /// Enqueues `name` with `args`, returning the task id.
    fn add_task(&self, name: &str, args: &[String]) -> anyhow::Result<String>;
    /// The task's result so far, if any, and its status.
    fn get_result(&self, id: &str) -> anyhow::Result<(Option<String>, TaskStatus)>;
    fn retry_task(&self, id: &str) -> anyhow::Result<()>;
}

pub trait Mailer: Send + Sync {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

pub trait PushNotifier: Send + Sync {
    fn send_notification(&self, device_token: &str, title: &str, body: &str) -> anyhow::Result<()>;
}

pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` as `bucket/object`, returning where it can be fetched.
    fn upload(&self, bucket: &str, object: &str, bytes: &[u8]) -> anyhow::Result<String>;
}

pub trait Database: Send + Sync {
    /// Runs a read query, returning rows of column values.
    fn fetch(&self, query: &str) -> anyhow::Result<Vec<Vec<String>>>;
}

/// Text generation from a hosted language model.
///
/// Implementations own their model choice, temperature and retry policy.
pub trait LlmProvider: Send + Sync {
    /// Completes `user_prompt` under `system_prompt`, producing at most
    /// `max_tokens` tokens. Both prompts must be non-empty.
    fn generate(&self, system_prompt: &str, user_prompt: &str, max_tokens: u32) -> anyhow::Result<String>;
}

/// Rejects empty prompts before a provider spends a request on them.
pub fn check_prompts(system_prompt: &str, user_prompt: &str) -> anyhow::Result<()> {
    anyhow::ensure!(!system_prompt.trim().is_empty(), "system prompt is required");
    anyhow::ensure!(!user_prompt.trim().is_empty(), "user prompt is required");
    Ok(())
}
