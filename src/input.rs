use crate::filter::ChannelFilter;
use crate::message::Channel;

/// Parsed user input: a command or plain text to send
#[derive(Debug, PartialEq)]
pub enum InputAction {
    /// Send text to the open conversation on its resolved channel
    SendText(String),
    /// Send text on an explicit channel
    SendVia(Channel, String),
    /// Open a conversation by client name or id
    Join(String),
    /// Leave the open conversation
    Part,
    /// Filter the inbox by client name (empty clears)
    Search(String),
    /// Filter the inbox by reply channel
    Filter(ChannelFilter),
    /// Copy the suggested quick reply into the input line
    Template,
    /// Toggle sidebar visibility
    ToggleSidebar,
    /// Show help text
    Help,
    /// Quit the application
    Quit,
    /// Unknown or malformed command
    Unknown(String),
}

/// A slash command for autocomplete and help display.
pub struct CommandInfo {
    pub name: &'static str,
    pub alias: &'static str,
    pub args: &'static str,
    pub description: &'static str,
}

pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo { name: "/join", alias: "/j", args: "<name>", description: "Open a conversation" },
    CommandInfo { name: "/part", alias: "/p", args: "", description: "Leave current conversation" },
    CommandInfo { name: "/search", alias: "/s", args: "[text]", description: "Filter clients by name" },
    CommandInfo { name: "/channel", alias: "/c", args: "<all|channel>", description: "Filter by reply channel" },
    CommandInfo { name: "/via", alias: "/v", args: "<channel> <text>", description: "Send on a specific channel" },
    CommandInfo { name: "/template", alias: "/t", args: "", description: "Insert suggested reply" },
    CommandInfo { name: "/sidebar", alias: "/sb", args: "", description: "Toggle sidebar" },
    CommandInfo { name: "/help", alias: "/h", args: "", description: "Show help" },
    CommandInfo { name: "/quit", alias: "/q", args: "", description: "Exit coach-inbox" },
];

/// Parse a line of input into an action
pub fn parse_input(input: &str) -> InputAction {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return InputAction::SendText(String::new());
    }

    if !trimmed.starts_with('/') {
        return InputAction::SendText(trimmed.to_string());
    }

    let mut parts = trimmed.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("").trim().to_string();

    match cmd {
        "/join" | "/j" => {
            if arg.is_empty() {
                InputAction::Unknown("/join requires a client name".to_string())
            } else {
                InputAction::Join(arg)
            }
        }
        "/part" | "/p" => InputAction::Part,
        "/search" | "/s" => InputAction::Search(arg),
        "/channel" | "/c" => {
            if arg.is_empty() {
                InputAction::Filter(ChannelFilter::All)
            } else {
                match arg.parse() {
                    Ok(filter) => InputAction::Filter(filter),
                    Err(e) => InputAction::Unknown(e.to_string()),
                }
            }
        }
        "/via" | "/v" => {
            let mut via = arg.splitn(2, ' ');
            let channel = via.next().unwrap_or("");
            let text = via.next().unwrap_or("").trim();
            match channel.parse::<Channel>() {
                Ok(_) if text.is_empty() => {
                    InputAction::Unknown("/via requires a message".to_string())
                }
                Ok(channel) => InputAction::SendVia(channel, text.to_string()),
                Err(e) => InputAction::Unknown(e.to_string()),
            }
        }
        "/template" | "/t" => InputAction::Template,
        "/sidebar" | "/sb" => InputAction::ToggleSidebar,
        "/help" | "/h" => InputAction::Help,
        "/quit" | "/q" => InputAction::Quit,
        _ => InputAction::Unknown(format!("Unknown command: {cmd}")),
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  /join <name>          - Open a conversation (client name or id)
  /part                 - Leave current conversation view
  /search [text]        - Filter clients by name, no text clears
  /channel <all|name>   - Filter by reply channel
  /via <channel> <text> - Send on a specific channel
  /template             - Insert the suggested quick reply
  /sidebar              - Toggle sidebar visibility
  /quit                 - Exit coach-inbox
  /help                 - Show this help

Shortcuts:
  Tab / Shift+Tab       - Next / previous conversation
  Ctrl+T                - Insert suggested reply
  Ctrl+Left/Right       - Resize sidebar
  Esc                   - Normal mode (j/k switch, i to type)
  Ctrl+C                - Quit";
