//! Command classification
//!
//! Turns raw chat text into one of a fixed set of commands. Matching is
//! case-insensitive on the command word; arguments keep their case.

/// Commands the bot understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help`
    Help,
    List,
    Count,
    Search(String),
    Get(String),
    /// Delegated semantic search
    Semantic(String),
    /// Anything else; carries the raw text for the echo
    Unknown(String),
}

/// Command descriptions published to the Telegram command menu and used in `/help`
pub const COMMAND_DESCRIPTIONS: &[(&str, &str)] = &[
    ("start", "show this help"),
    ("help", "show this help"),
    ("list", "list all stored files"),
    ("count", "number of files and total size"),
    ("search", "find files by name: /search <keyword>"),
    ("get", "download a file: /get <name>"),
    ("semantic", "search file contents: /semantic <query>"),
];

impl Command {
    /// Classifies a chat message.
    ///
    /// `/cmd@botname` is treated like `/cmd`. Commands that need an argument
    /// fall back to `Unknown` when the argument is empty.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (trimmed, ""),
        };
        let word = head.split('@').next().unwrap_or(head).to_lowercase();

        match (word.as_str(), rest.is_empty()) {
            ("/start" | "/help", true) => Self::Help,
            ("/list", true) => Self::List,
            ("/count", true) => Self::Count,
            ("/search", false) => Self::Search(rest.to_string()),
            ("/get", false) => Self::Get(rest.to_string()),
            ("/semantic", false) => Self::Semantic(rest.to_string()),
            _ => Self::Unknown(text.to_string()),
        }
    }
}

/// Static help text enumerating every command
pub fn help_text(first_name: Option<&str>) -> String {
    let greeting = match first_name {
        Some(name) if !name.trim().is_empty() => format!("👋 Hi, {}!", name.trim()),
        _ => "👋 Hi!".to_string(),
    };

    format!(
        "{}\n\nI keep the files uploaded to this server and send them back on request.\n\n\
         /list - list all stored files\n\
         /count - number of files and total size\n\
         /search <keyword> - find files by name\n\
         /get <name> - download a file\n\
         /semantic <query> - search file contents\n\
         /start, /help - show this help",
        greeting
    )
}
