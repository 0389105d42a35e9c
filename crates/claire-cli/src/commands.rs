//! Slash command parsing for the interactive loop

use std::path::PathBuf;

use claire_widget::AttachmentKind;

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open,
    Minimize,
    ToggleMaximize,
    Close,
    Attach { path: PathBuf, kind: AttachmentKind },
    /// 1-based position in the staged list
    Detach(usize),
    Status,
    Help,
    Quit,
    /// Plain text to send
    Send(String),
    /// Unknown command or bad arguments; carries the message to show
    Invalid(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let Some(rest) = input.strip_prefix('/') else {
            return Command::Send(input.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "open" => Command::Open,
            "min" | "minimize" => Command::Minimize,
            "max" | "maximize" => Command::ToggleMaximize,
            "close" => Command::Close,
            "attach" | "file" => attach(arg, AttachmentKind::File),
            "image" => attach(arg, AttachmentKind::Image),
            "detach" => match arg.parse::<usize>() {
                Ok(n) if n > 0 => Command::Detach(n),
                _ => Command::Invalid("Usage: /detach <number>".to_string()),
            },
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Invalid(format!("Unknown command: /{}", other)),
        }
    }
}

fn attach(arg: &str, kind: AttachmentKind) -> Command {
    if arg.is_empty() {
        let name = match kind {
            AttachmentKind::Image => "image",
            AttachmentKind::File => "attach",
        };
        return Command::Invalid(format!("Usage: /{} <path>", name));
    }
    Command::Attach {
        path: PathBuf::from(arg),
        kind,
    }
}

pub fn help_text() -> &'static str {
    "Commands:
  /open             Open the chat window
  /max              Toggle between expanded and maximized
  /min              Minimize (keeps the conversation)
  /close            Close and clear the conversation
  /attach <path>    Stage a file
  /image <path>     Stage an image
  /detach <n>       Remove the n-th staged attachment
  /status           Show window, service, and staged files
  /help             Show this help
  /quit             Exit

Anything else is sent as a message."
}
