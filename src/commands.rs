//! Chat commands and their static replies

pub const WELCOME_TEXT: &str =
    "Welcome to the Site Visitor Bot! Use /help to see available commands.";

pub const INFO_TEXT: &str =
    "This bot helps track site visitors. Use /inputvisit to add new visitor data.";

pub const HELP_TEXT: &str = "Available commands:
/start - Start the bot
/info - Get information about the bot
/help - Show this help message
/status - Check the current status
/inputvisit - Input new site visitor data
/cancel - Cancel the visitor data being entered";

pub const DB_UNAVAILABLE_TEXT: &str = "Unable to connect to the database.";
pub const DB_QUERY_FAILED_TEXT: &str = "Error retrieving visitor count.";

/// A recognised bot command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Info,
    Help,
    Status,
    InputVisit,
    Cancel,
    /// Any other `/word`; ignored
    Unknown(String),
}

impl Command {
    /// Parse message text as a command. Returns `None` for plain text.
    ///
    /// Accepts `/name`, `/name@botname` and trailing arguments, which are ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('/')?;
        let word = rest.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();
        let command = match name.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "info" => Command::Info,
            "help" => Command::Help,
            "status" => Command::Status,
            "inputvisit" => Command::InputVisit,
            "cancel" => Command::Cancel,
            _ => Command::Unknown(name.to_string()),
        };
        Some(command)
    }

    /// Reply for commands answered with fixed text
    pub fn static_reply(&self) -> Option<&'static str> {
        match self {
            Command::Start => Some(WELCOME_TEXT),
            Command::Info => Some(INFO_TEXT),
            Command::Help => Some(HELP_TEXT),
            _ => None,
        }
    }
}

/// Reply for `/status` given the visitor count
pub fn status_text(count: u64) -> String {
    format!("Current status: {count} visitors recorded.")
}
