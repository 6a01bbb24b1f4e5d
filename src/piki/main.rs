use chrono::Utc;
use clap::Parser;
use colored::*;
use piki::api::{CmdMessage, CmdResult, ConfigAction, MessageLevel};
use piki::config::PikiConfig;
use piki::error::Result;
use piki::init::{initialize, PikiContext};
use piki::model::{DocumentView, HistorySummary};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod args;
use args::{Cli, Commands};

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs one command. `Ok(false)` means the command reported an error message.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ctx = initialize()?;

    let result = match cli.command {
        Some(Commands::Get { path, rev }) => handle_get(&ctx, &path, rev)?,
        Some(Commands::Update {
            path,
            content,
            tags,
            user,
        }) => handle_update(&ctx, &path, content, tags, user)?,
        Some(Commands::Rename {
            path,
            new_path,
            user,
        }) => ctx.api.rename_page(&path, &new_path, user.as_deref())?,
        Some(Commands::Delete { paths }) => ctx.api.delete_pages(&paths)?,
        Some(Commands::History { path, diff: None }) => handle_history(&ctx, &path)?,
        Some(Commands::History {
            path,
            diff: Some(version),
        }) => handle_diff(ctx.api.diff(&path, version)?),
        Some(Commands::Search { query }) => handle_paths(ctx.api.search(&query.join(" "))?),
        Some(Commands::List { prefix, depth }) => {
            handle_paths(ctx.api.list_pages(prefix.as_deref().unwrap_or(""), depth)?)
        }
        Some(Commands::Tree { prefix, depth }) => {
            handle_tree(ctx.api.tree(prefix.as_deref().unwrap_or(""), depth)?)
        }
        Some(Commands::Reindex) => ctx.api.reindex()?,
        Some(Commands::Doctor { fix }) => ctx.api.doctor(fix)?,
        Some(Commands::Init) => ctx.api.init()?,
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value)?,
        None => {
            let startpage = ctx.api.facade().startpage().to_string();
            handle_get(&ctx, &startpage, None)?
        }
    };

    print_messages(&result.messages);
    Ok(!result.has_errors())
}

/// Logs go to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "piki=debug" } else { "piki=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_get(ctx: &PikiContext, path: &str, rev: Option<u32>) -> Result<CmdResult> {
    let result = ctx.api.get_page(path, rev)?;
    if let Some(document) = &result.document {
        print_document(document);
    }
    Ok(result)
}

fn handle_update(
    ctx: &PikiContext,
    path: &str,
    content: Option<String>,
    tags: Option<String>,
    user: Option<String>,
) -> Result<CmdResult> {
    let content = match content {
        Some(content) => content,
        None => {
            if io::stdin().is_terminal() {
                eprintln!("{}", "Reading content from stdin, end with Ctrl-D".dimmed());
            }
            io::read_to_string(io::stdin())?
        }
    };
    ctx.api
        .update_page(path, &content, tags.as_deref(), user.as_deref())
}

fn handle_history(ctx: &PikiContext, path: &str) -> Result<CmdResult> {
    let result = ctx.api.history(path)?;
    print_history(&result.history);
    Ok(result)
}

fn handle_diff(result: CmdResult) -> CmdResult {
    if let Some(text) = &result.text {
        for line in text.lines() {
            if line.starts_with("+++") || line.starts_with("---") {
                println!("{}", line.bold());
            } else if line.starts_with("@@") {
                println!("{}", line.cyan());
            } else if line.starts_with('+') {
                println!("{}", line.green());
            } else if line.starts_with('-') {
                println!("{}", line.red());
            } else {
                println!("{}", line);
            }
        }
    }
    result
}

fn handle_paths(result: CmdResult) -> CmdResult {
    for path in &result.paths {
        println!("{}", path);
    }
    result
}

fn handle_tree(result: CmdResult) -> CmdResult {
    if let Some(text) = &result.text {
        print!("{}", text);
    }
    result
}

fn handle_config(ctx: &PikiContext, key: Option<String>, value: Option<String>) -> Result<CmdResult> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);

    let result = ctx.api.config(action)?;
    if show_all {
        if let Some(config) = &result.config {
            print_config(config);
        }
    }
    Ok(result)
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => eprintln!("{}", message.content.red()),
        }
    }
}

fn print_document(document: &DocumentView) {
    let mut header = document.path.bold().to_string();
    if let Some(version) = document.version {
        header.push_str(&format!(" {}", format!("(version {})", version).yellow()));
    }
    println!("{}", header);

    let meta = &document.metadata;
    let mut details = Vec::new();
    if let Some(time) = meta.modified_time {
        details.push(format!("modified {}", format_time_ago(time)));
    }
    if let Some(user) = &meta.modified_user {
        details.push(format!("by {}", user));
    }
    let tags = meta.tags_or_empty();
    if !tags.is_empty() {
        details.push(format!("tags: {}", tags));
    }
    if document.is_available() && !details.is_empty() {
        println!("{}", details.join(", ").dimmed());
    }

    if !document.content.is_empty() {
        println!();
        println!("{}", document.content.trim_end());
    }
}

fn print_history(history: &[HistorySummary]) {
    for entry in history {
        let mut changed = Vec::new();
        if entry.content_changed {
            changed.push("content");
        }
        if entry.tags_changed {
            changed.push("tags");
        }
        let when = entry
            .modified_time
            .map(format_time_ago)
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "{:>5}  {:<16}  {:<12}  {}",
            entry.version.to_string().yellow(),
            when.dimmed(),
            entry.modified_user.as_deref().unwrap_or("-"),
            changed.join(", ")
        );
    }
}

fn print_config(config: &PikiConfig) {
    for key in PikiConfig::KEYS {
        if let Some(value) = config.get(key) {
            println!("{} = {}", key, value);
        }
    }
}

fn format_time_ago(epoch: i64) -> String {
    let elapsed = Utc::now().timestamp().saturating_sub(epoch).max(0);
    timeago::Formatter::new().convert(Duration::from_secs(elapsed as u64))
}
