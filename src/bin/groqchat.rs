//! Single-shot commands over the conversation log.
//!
//! # Usage
//!
//! ```bash
//! # Ask one question in the current conversation
//! groqchat ask "How do I read a CSV file?"
//!
//! # Show the last 10 messages of the current conversation
//! groqchat history
//!
//! # Show the whole log, newest first
//! groqchat history --all --full --reverse
//!
//! # Search the whole log for your own questions about traits
//! groqchat history --all --role user --search traits
//!
//! # Export the current conversation as PDF
//! groqchat export --format pdf --output notes
//!
//! # Start a new conversation, or delete every message
//! groqchat new
//! groqchat clear
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use groqchat::chat::{ChatArgs, ChatConfig, ChatSession, PlainTextRenderer, Renderer, TurnOutcome};
use groqchat::types::{MessageQuery, Role};
use groqchat::{
    Error, ExportFormat, Exporter, MessageStore, SessionBoundary, SqliteStore, describe_error,
    init_logging,
};

const USAGE: &str = "groqchat [OPTIONS] <ask QUESTION|history|export|new|clear|summary|init-db>";

/// Number of messages `history` shows without `--limit` or `--full`.
const DEFAULT_HISTORY_LINES: usize = 10;

/// Command-line arguments for the groqchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Model to use (default: meta-llama/llama-4-scout-17b-16e-instruct)", "MODEL")]
    model: Option<String>,

    #[arrrg(optional, "System prompt for the conversation (empty to disable)", "PROMPT")]
    system: Option<String>,

    #[arrrg(optional, "Sampling temperature between 0 and 1 (default: 0.3)", "TEMP")]
    temperature: Option<String>,

    #[arrrg(optional, "Max tokens per response (default: 8192)", "TOKENS")]
    max_tokens: Option<u32>,

    #[arrrg(optional, "Conversation log (default: sqlite://groqchat.db)", "URL")]
    database: Option<String>,

    #[arrrg(optional, "Export directory (default: exports)", "DIR")]
    export_dir: Option<String>,

    #[arrrg(optional, "API base URL (default: https://api.groq.com/openai/v1/)", "URL")]
    base_url: Option<String>,

    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    timeout_secs: Option<u64>,

    /// Number of messages for `history` and `export`.
    #[arrrg(optional, "Number of most recent messages (history default: 10)", "N")]
    limit: Option<usize>,

    #[arrrg(flag, "history: show every message")]
    full: bool,

    #[arrrg(flag, "history: newest first")]
    reverse: bool,

    #[arrrg(flag, "history/export: whole log instead of the current conversation")]
    all: bool,

    #[arrrg(optional, "history: only messages containing TEXT (case-insensitive)", "TEXT")]
    search: Option<String>,

    #[arrrg(optional, "history: only user or assistant messages", "ROLE")]
    role: Option<String>,

    #[arrrg(optional, "export: md or pdf (default: md)", "FORMAT")]
    format: Option<String>,

    #[arrrg(optional, "export: file name (default: chat_export_<timestamp>)", "NAME")]
    output: Option<String>,

    #[arrrg(flag, "Disable ANSI colors/styles")]
    no_color: bool,

    #[arrrg(flag, "Do not print token usage after replies")]
    no_usage: bool,

    #[arrrg(flag, "Enable debug logging")]
    verbose: bool,
}

impl Args {
    fn chat_args(&self) -> ChatArgs {
        ChatArgs {
            model: self.model.clone(),
            system: self.system.clone(),
            temperature: self.temperature.clone(),
            max_tokens: self.max_tokens,
            database: self.database.clone(),
            export_dir: self.export_dir.clone(),
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
            no_color: self.no_color,
            no_usage: self.no_usage,
            verbose: self.verbose,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = Args::from_command_line_relaxed(USAGE);
    let Some((command, rest)) = free.split_first() else {
        eprintln!("usage: {USAGE}");
        std::process::exit(2);
    };
    let config = match ChatConfig::resolve(args.chat_args(), |key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", describe_error(&err));
            std::process::exit(2);
        }
    };
    init_logging(config.verbose)?;

    let result = match command.as_str() {
        "ask" => ask(&config, &rest.join(" ")).await,
        "history" => history(&config, &args).await,
        "export" => export(&config, &args).await,
        "new" => new_conversation(&config).await,
        "clear" => clear(&config).await,
        "summary" => summary(&config).await,
        "init-db" => init_db(&config).await,
        other => {
            eprintln!("unknown command '{other}'\nusage: {USAGE}");
            std::process::exit(2);
        }
    };
    if let Err(err) = result {
        eprintln!("{}", describe_error(&err));
        std::process::exit(1);
    }
    Ok(())
}

async fn ask(config: &ChatConfig, question: &str) -> groqchat::Result<()> {
    if question.trim().is_empty() {
        return Err(Error::validation(
            "ask needs a question",
            Some("question".to_string()),
        ));
    }
    let client = config.client()?;
    let store = SqliteStore::connect(&config.database_url).await?;
    let mut session = ChatSession::new(client, store, config);

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .map_err(|err| Error::configuration(format!("cannot install Ctrl+C handler: {err}")))?;
    let mut renderer = PlainTextRenderer::with_color_and_interrupt(config.use_color, interrupted);

    match session.ask(question, &mut renderer).await? {
        TurnOutcome::Completed { usage, elapsed, .. } => {
            if config.show_usage {
                renderer.print_usage(usage, elapsed);
            }
        }
        TurnOutcome::Interrupted { .. } => {}
    }
    Ok(())
}

async fn history(config: &ChatConfig, args: &Args) -> groqchat::Result<()> {
    let store = SqliteStore::connect(&config.database_url).await?;
    let limit = if args.full {
        None
    } else {
        Some(args.limit.unwrap_or(DEFAULT_HISTORY_LINES))
    };
    let mut query = scope(args.all).with_limit(limit);
    if let Some(search) = &args.search {
        query = query.with_search(search.as_str());
    }
    if let Some(role) = &args.role {
        query = query.with_role(role.parse::<Role>()?);
    }
    let page = store.query(&query).await?;

    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    if page.messages.is_empty() {
        renderer.print_info("No messages found.");
        return Ok(());
    }
    let mut messages = page.messages;
    if args.reverse {
        messages.reverse();
    }
    for message in &messages {
        renderer.print_message(message);
    }
    renderer.print_info(&format!("Showing {} of {} messages", messages.len(), page.total));
    Ok(())
}

async fn export(config: &ChatConfig, args: &Args) -> groqchat::Result<()> {
    let format = match &args.format {
        Some(format) => format.parse::<ExportFormat>()?,
        None => ExportFormat::Markdown,
    };
    let store = SqliteStore::connect(&config.database_url).await?;
    let page = store.query(&scope(args.all).with_limit(args.limit)).await?;
    let report = Exporter::with_pandoc(config.export_dir.clone())
        .export(&page.messages, format, args.output.as_deref())
        .await?;
    println!(
        "Exported {} messages ({} bytes) to {}",
        report.messages,
        report.bytes,
        report.path.display()
    );
    Ok(())
}

async fn new_conversation(config: &ChatConfig) -> groqchat::Result<()> {
    let store = SqliteStore::connect(&config.database_url).await?;
    let id = SessionBoundary::new(store).start_new_conversation().await?;
    println!("New conversation started (separator #{id}).");
    Ok(())
}

async fn clear(config: &ChatConfig) -> groqchat::Result<()> {
    let store = SqliteStore::connect(&config.database_url).await?;
    let removed = SessionBoundary::new(store).clear().await?;
    println!("Deleted {removed} messages.");
    Ok(())
}

async fn summary(config: &ChatConfig) -> groqchat::Result<()> {
    let store = SqliteStore::connect(&config.database_url).await?;
    let summary = store.summary().await?;
    println!("Messages:       {}", summary.total_messages);
    println!("  user:         {}", summary.user_messages);
    println!("  assistant:    {}", summary.assistant_messages);
    println!("Conversations:  {}", summary.conversations);
    if let (Some(first), Some(last)) = (summary.first_message, summary.last_message) {
        println!("First message:  {}", groqchat::utils::time::display_utc(first));
        println!("Last message:   {}", groqchat::utils::time::display_utc(last));
    }
    println!("Average length: {:.1} chars", summary.average_length);
    Ok(())
}

async fn init_db(config: &ChatConfig) -> groqchat::Result<()> {
    SqliteStore::connect(&config.database_url).await?;
    println!("Conversation log ready at {}", config.database_url);
    Ok(())
}

fn scope(all: bool) -> MessageQuery {
    if all {
        MessageQuery::everything()
    } else {
        MessageQuery::new()
    }
}
