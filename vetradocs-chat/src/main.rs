use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use vetradocs_chat::{
    ChatBackend, ChatSession, ChatState, FileIndexSource, HttpTransport, IndexSource, Role,
    SendOutcome, VetradocsConfig, load_config,
};

/// Chat with a vetradocs site from the terminal.
#[derive(Parser, Debug)]
#[command(name = "vetradocs-chat", author, version, about, long_about = None)]
struct Args {
    /// Origin serving the index artifact and the chat endpoint
    #[arg(long, default_value = "http://localhost:5173")]
    base_url: String,

    /// TOML file with plugin options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read the index from this directory instead of over HTTP
    #[arg(long)]
    public_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => VetradocsConfig::default(),
    };
    let transport = HttpTransport::new(&args.base_url)?;

    match args.public_dir {
        Some(dir) => repl(ChatSession::new(config, FileIndexSource::new(dir), transport)).await,
        None => repl(ChatSession::new(config, transport.clone(), transport)).await,
    }
}

async fn repl<S: IndexSource, B: ChatBackend>(session: ChatSession<S, B>) -> anyhow::Result<()> {
    if !session.load_index().await {
        eprintln!("Search index unavailable; answers will not cite the docs.");
    }
    println!("{} (type /clear to reset, /quit to exit)", session.config().title);

    let mut updates = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/clear" => {
                session.clear_chat();
                continue;
            }
            _ => {}
        }

        let start = session.state().messages.len();
        updates.borrow_and_update();
        let mut printer = ReplyPrinter::new(start);
        let send = session.send_message(line);
        tokio::pin!(send);
        let outcome = loop {
            tokio::select! {
                outcome = &mut send => break outcome,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break send.await;
                    }
                    printer.print(&updates.borrow_and_update());
                }
            }
        };
        printer.print(&updates.borrow_and_update());
        printer.finish();

        match outcome {
            SendOutcome::Completed => {}
            SendOutcome::Rejected(reason) => eprintln!("(not sent: {reason:?})"),
            SendOutcome::Failed(reason) => eprintln!("({reason})"),
        }
    }
    Ok(())
}

/// Prints assistant text appended after message `start` as it streams in.
struct ReplyPrinter {
    start: usize,
    current: Option<usize>,
    printed: usize,
}

impl ReplyPrinter {
    fn new(start: usize) -> Self {
        Self {
            start,
            current: None,
            printed: 0,
        }
    }

    fn print(&mut self, state: &ChatState) {
        let mut stdout = std::io::stdout();
        for (index, message) in state.messages.iter().enumerate().skip(self.start) {
            if message.role != Role::Assistant || self.current.is_some_and(|c| index < c) {
                continue;
            }
            if self.current != Some(index) {
                if self.current.is_some() {
                    println!();
                }
                self.current = Some(index);
                self.printed = 0;
            }
            if message.content.len() > self.printed {
                print!("{}", &message.content[self.printed..]);
                self.printed = message.content.len();
            }
        }
        let _ = stdout.flush();
    }

    fn finish(self) {
        if self.current.is_some() {
            println!();
        }
    }
}
