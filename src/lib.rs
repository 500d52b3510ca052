//! # kbchat - Streaming Chat Session Client
//!
//! A small, pragmatic Rust library for knowledge-base chat services that
//! answer a single message with a server-pushed, line-delimited event stream.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Two-phase protocol: open a session, then stream one message exchange
//! - Incremental `data:` line parser that survives arbitrary network
//!   fragmentation, including UTF-8 sequences split across chunks
//! - Cooperative cancellation through [`CancellationToken`]
//! - A narrow [`ChatSurface`] seam so UI concerns stay outside the crate
//!
//! ## Architecture
//!
//! The crate is layered bottom-up:
//!
//! 1. **`sse`**: stateful chunk decoding and line parsing, pure and synchronous
//! 2. **`stream`**: drives a raw byte stream through the parser lazily
//! 3. **`provider`**: the HTTP implementation of the [`SessionClient`] trait
//! 4. **`exchange`**: the per-exchange driver wiring everything to a surface
//!
//! ## Example
//! ```no_run
//! use kbchat::{run_exchange, ChatSurface, ExchangeSlot, ExchangeStatus, HttpChatClient};
//! use kbchat::options::{Credentials, TransportOptions};
//!
//! struct Stdout;
//!
//! impl ChatSurface for Stdout {
//!     fn clear(&mut self) {}
//!     fn status(&mut self, status: ExchangeStatus) {
//!         eprintln!("[{status}]");
//!     }
//!     fn output(&mut self, text: &str) {
//!         println!("{text}");
//!     }
//!     fn append_log(&mut self, line: &str) {
//!         eprintln!("{line}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new(
//!         "http://localhost:8000/proxy",
//!         "application-...",
//!         "csrf-...",
//!     );
//!     let client = HttpChatClient::new(credentials, TransportOptions::default());
//!
//!     let mut slot = ExchangeSlot::new();
//!     let token = slot.begin();
//!
//!     let reply = run_exchange(&client, "hello", token, &mut Stdout).await?;
//!     println!("final reply: {reply}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod exchange;
pub mod http;
pub mod model;
pub mod options;
pub mod provider;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use client::{ChatError, SessionClient};
pub use exchange::{run_exchange, ChatSurface, ExchangeSlot, OutputAccumulator};
pub use model::{ContentEvent, ExchangeStatus, MessageRequest, SessionHandle};
pub use provider::HttpChatClient;
pub use stream::EventStream;
pub use tokio_util::sync::CancellationToken;
