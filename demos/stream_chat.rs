//! Streaming chat example against a live deployment.
//!
//! Run with:
//! ```bash
//! export KBCHAT_BASE_URL="http://localhost:8000/proxy"
//! export KBCHAT_API_KEY="application-..."
//! export KBCHAT_CSRF_TOKEN="..."
//! cargo run --example stream_chat -- "hello"
//! ```
//!
//! Press Ctrl-C while the reply is streaming to cancel the exchange.

use std::io::Write;

use kbchat::options::{Credentials, TransportOptions};
use kbchat::{run_exchange, ChatError, ChatSurface, ExchangeSlot, ExchangeStatus, HttpChatClient};

struct Terminal {
    rendered: usize,
}

impl ChatSurface for Terminal {
    fn clear(&mut self) {
        self.rendered = 0;
    }

    fn status(&mut self, status: ExchangeStatus) {
        eprintln!("[{status}]");
    }

    fn output(&mut self, text: &str) {
        // The surface receives the full text each time; print only what is
        // new so the terminal reads like a live stream.
        print!("{}", &text[self.rendered..]);
        let _ = std::io::stdout().flush();
        self.rendered = text.len();
    }

    fn append_log(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("KBCHAT_BASE_URL")
        .expect("KBCHAT_BASE_URL environment variable must be set");
    let api_key =
        std::env::var("KBCHAT_API_KEY").expect("KBCHAT_API_KEY environment variable must be set");
    let csrf_token = std::env::var("KBCHAT_CSRF_TOKEN")
        .expect("KBCHAT_CSRF_TOKEN environment variable must be set");

    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "hello".to_string());

    let client = HttpChatClient::new(
        Credentials::new(base_url, api_key, csrf_token),
        TransportOptions::default(),
    );

    let mut slot = ExchangeSlot::new();
    let token = slot.begin();

    // Ctrl-C cancels cooperatively; the stream stops at its next read.
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let mut surface = Terminal { rendered: 0 };
    match run_exchange(&client, &message, token, &mut surface).await {
        Ok(reply) => {
            println!();
            eprintln!("({} chars)", reply.len());
            Ok(())
        }
        Err(ChatError::Cancelled) => {
            println!();
            Ok(())
        }
        Err(err) => {
            eprintln!("exchange failed: {err}");
            Err(err.into())
        }
    }
}
