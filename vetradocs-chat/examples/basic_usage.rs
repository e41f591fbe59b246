//! Ask a running docs site one question and print the streamed reply.
//!
//! ```bash
//! cargo run -p vetradocs-chat --example basic_usage -- http://localhost:5173 "How do I install it?"
//! ```

use anyhow::Result;
use vetradocs_chat::{ChatSession, HttpTransport, Role, SendOutcome, VetradocsConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let base_url = args
        .next()
        .unwrap_or_else(|| "http://localhost:5173".to_string());
    let question = args
        .next()
        .unwrap_or_else(|| "What does this site document?".to_string());

    let transport = HttpTransport::new(&base_url)?;
    let session = ChatSession::new(VetradocsConfig::default(), transport.clone(), transport);

    if session.load_index().await {
        println!("Sources for {question:?}:");
        for result in session.search_docs(&question, 3).await {
            println!("  {} ({})", result.title, result.url);
        }
    }

    match session.send_message(question).await {
        SendOutcome::Completed => {}
        SendOutcome::Failed(reason) => eprintln!("Exchange failed: {reason}"),
        SendOutcome::Rejected(reason) => eprintln!("Not sent: {reason:?}"),
    }

    for message in session.state().messages {
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        println!("{who}: {}", message.content);
    }
    Ok(())
}
