//! claire - terminal host for the CLAIRE chat widget

mod commands;
mod config;
mod ui;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use claire_api::HttpServiceApi;
use claire_widget::{Error, FileRef, Widget, WidgetEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use commands::Command;

/// claire - chat with the BPI virtual assistant from a terminal
#[derive(Parser, Debug)]
#[command(name = "claire")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base address of the assistant service (default: http://localhost:8000)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Session identifier sent with every question
    #[arg(short, long)]
    session_id: Option<String>,

    /// Seconds between health probes
    #[arg(long)]
    health_interval: Option<u64>,

    /// Seconds before a chat request is abandoned
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Send a single message and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("claire=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Merge config with CLI args (CLI takes precedence)
    let mut cfg = config::Config::load();
    if args.base_url.is_some() {
        cfg.base_url = args.base_url;
    }
    if args.session_id.is_some() {
        cfg.session_id = args.session_id;
    }
    if args.health_interval.is_some() {
        cfg.health_interval_secs = args.health_interval;
    }
    if args.timeout.is_some() {
        cfg.request_timeout_secs = args.timeout;
    }

    let api_config = cfg.api_config();
    let api = HttpServiceApi::new(&api_config)
        .with_context(|| format!("Invalid service address {}", api_config.base_url))?;
    tracing::debug!("Using service at {}", api.base_url());

    let widget = Arc::new(Widget::new(cfg.widget_config(), Arc::new(api)));

    let result = match args.command {
        Some(text) => run_command(&widget, &text).await,
        None => run_interactive(&widget).await,
    };

    widget.shutdown().await;
    result
}

async fn run_command(widget: &Widget, text: &str) -> anyhow::Result<()> {
    if !widget.probe_now().await {
        anyhow::bail!("Assistant service is unreachable");
    }
    widget.open();

    let reply = widget.submit(text)?.run().await?;
    println!("{}", reply.answer);
    if let Some(line) = ui::format_reply_metadata(&reply.metadata()) {
        eprintln!("{}", line);
    }
    Ok(())
}

async fn run_interactive(widget: &Arc<Widget>) -> anyhow::Result<()> {
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("claire (session: {})", widget.session_id());
        eprintln!("Type /open to start chatting, /help for commands.");
        eprintln!();
    }
    run_session(widget, BufReader::new(tokio::io::stdin())).await
}

/// Drive the widget from input lines until EOF or `/quit`.
///
/// Exchanges run in the background so input stays live; all of them are
/// awaited, and their events printed, before this returns.
async fn run_session<R>(widget: &Arc<Widget>, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let stop_printer = CancellationToken::new();
    let printer = tokio::spawn(print_events(widget.subscribe(), stop_printer.clone()));

    // Settle connectivity before the first line can be sent
    if !widget.probe_now().await {
        eprintln!("Assistant service is unreachable; sending is disabled until it responds");
    }
    widget.mount();

    let mut exchanges = JoinSet::new();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        while exchanges.try_join_next().is_some() {}
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Command::Open => report_ignored(widget.open().is_none(), "open"),
            Command::Minimize => report_ignored(widget.minimize().is_none(), "minimize"),
            Command::ToggleMaximize => report_ignored(widget.toggle_maximize().is_none(), "maximize"),
            Command::Close => report_ignored(widget.close().is_none(), "close"),
            Command::Attach { path, kind } => match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    widget.stage_files(vec![FileRef::new(name, meta.len())], kind);
                }
                Ok(_) => eprintln!("Not a file: {}", path.display()),
                Err(e) => eprintln!("Cannot read {}: {}", path.display(), e),
            },
            Command::Detach(n) => match widget.staged().get(n - 1) {
                Some(attachment) => {
                    widget.unstage_file(attachment.id);
                }
                None => eprintln!("No staged attachment #{}", n),
            },
            Command::Status => println!("{}", ui::format_status(&widget.snapshot())),
            Command::Help => println!("{}", commands::help_text()),
            Command::Quit => break,
            Command::Invalid(message) => eprintln!("{}", message),
            Command::Send(text) => match widget.submit(text) {
                Ok(pending) => {
                    exchanges.spawn(async move {
                        if let Err(e) = pending.run().await {
                            tracing::debug!("Exchange failed: {}", e);
                        }
                    });
                }
                Err(Error::Rejected(reason)) => eprintln!("Not sent: {}", reason),
                Err(e) => eprintln!("Not sent: {}", e),
            },
        }
    }

    if !exchanges.is_empty() {
        tracing::debug!("Waiting for {} pending exchange(s)", exchanges.len());
    }
    while let Some(joined) = exchanges.join_next().await {
        if let Err(e) = joined {
            tracing::warn!("Exchange task ended abnormally: {}", e);
        }
    }

    stop_printer.cancel();
    if let Err(e) = printer.await {
        tracing::warn!("Event printer ended abnormally: {}", e);
    }
    Ok(())
}

fn report_ignored(ignored: bool, action: &str) {
    if ignored {
        eprintln!("Cannot {} from the current window state", action);
    }
}

async fn print_events(
    mut events: tokio::sync::broadcast::Receiver<WidgetEvent>,
    stop: CancellationToken,
) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        // Queued events win over the stop signal so nothing is left unprinted
        let received = tokio::select! {
            biased;
            received = events.recv() => received,
            _ = stop.cancelled() => break,
        };
        let event = match received {
            Ok(event) => event,
            Err(RecvError::Lagged(n)) => {
                tracing::warn!("Dropped {} widget events", n);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event {
            WidgetEvent::MessageAppended { message } if !message.is_user() => {
                println!("{}", ui::format_message(&message));
            }
            WidgetEvent::PlaceholderResolved { message } => {
                println!("{}", ui::format_message(&message));
            }
            WidgetEvent::WindowChanged { to, .. } => {
                eprintln!("[window: {:?}]", to);
            }
            WidgetEvent::SessionReset => {
                eprintln!("[conversation cleared]");
            }
            WidgetEvent::ConnectivityChanged { reachable } => {
                if reachable {
                    eprintln!("[assistant online]");
                } else {
                    eprintln!("[assistant offline]");
                }
            }
            WidgetEvent::AttachmentsChanged { count } => {
                eprintln!("[{} attachment(s) staged]", count);
            }
            _ => {}
        }
    }
}
