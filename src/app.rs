use chrono::{DateTime, Local, Utc};
use crossterm::event::KeyCode;
use tracing::warn;

use crate::config::Config;
use crate::directory::ClientDirectory;
use crate::gateway::types::GatewayEvent;
use crate::inbox::Inbox;
use crate::input::{self, InputAction, COMMANDS};
use crate::message::{Channel, Message};
use crate::store::MessageStore;
use crate::typing::{Clock, SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Insert,
}

pub fn format_time(timestamp: DateTime<Utc>) -> String {
    let local: DateTime<Local> = timestamp.with_timezone(&Local);
    local.format("%H:%M").to_string()
}

/// Terminal client state wrapped around the inbox engine
pub struct App<C: Clock = SystemClock> {
    pub inbox: Inbox<C>,
    /// Text input buffer
    pub input_buffer: String,
    /// Cursor position in input buffer, counted in chars
    pub input_cursor: usize,
    /// Previously submitted inputs for Up/Down recall
    pub input_history: Vec<String>,
    /// Current position in history (None = not browsing)
    pub history_index: Option<usize>,
    /// Saves in-progress input when browsing history
    pub history_draft: String,
    pub sidebar_visible: bool,
    /// Resizable sidebar width (min 16, max 44)
    pub sidebar_width: u16,
    pub status_message: String,
    pub should_quit: bool,
    pub mode: InputMode,
    /// Name shown next to the coach's own messages
    pub coach_name: String,
    pub show_receipts: bool,
    /// Tint read receipts with the channel accent colour
    pub color_receipts: bool,
    /// Whether the gateway is up
    pub connected: bool,
    /// Persistent error once the gateway went away
    pub connection_error: Option<String>,
    /// Autocomplete popup visible
    pub autocomplete_visible: bool,
    /// Indices into COMMANDS for current matches
    pub autocomplete_candidates: Vec<usize>,
    /// Selected item in autocomplete popup
    pub autocomplete_index: usize,
    /// Help overlay visible
    pub show_help: bool,
}

impl<C: Clock> App<C> {
    pub fn new(
        store: MessageStore,
        directory: ClientDirectory,
        clock: C,
        config: &Config,
    ) -> Self {
        let inbox = Inbox::new(store, directory, clock, config.typing_timings())
            .with_default_channel(config.default_channel);
        Self {
            inbox,
            input_buffer: String::new(),
            input_cursor: 0,
            input_history: Vec::new(),
            history_index: None,
            history_draft: String::new(),
            sidebar_visible: true,
            sidebar_width: config.sidebar_width.clamp(16, 44),
            status_message: "connecting...".to_string(),
            should_quit: false,
            mode: InputMode::Insert,
            coach_name: config.coach_name.clone(),
            show_receipts: config.show_receipts,
            color_receipts: config.color_receipts,
            connected: false,
            connection_error: None,
            autocomplete_visible: false,
            autocomplete_candidates: Vec::new(),
            autocomplete_index: 0,
            show_help: false,
        }
    }

    /// Resize sidebar by delta, clamped between 16..=44
    pub fn resize_sidebar(&mut self, delta: i16) {
        self.sidebar_width = (self.sidebar_width as i16 + delta).clamp(16, 44) as u16;
    }

    /// Handle an event coming back from the gateway
    pub fn handle_gateway_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::MessageReceived(msg) => {
                let result = self.inbox.receive(
                    &msg.client_id,
                    &msg.text,
                    Some(msg.channel),
                    msg.timestamp,
                );
                if let Err(e) = result {
                    warn!(client = %msg.client_id, "dropping inbound message: {e}");
                }
            }
            GatewayEvent::ReceiptReceived { message_id, status } => {
                if let Err(e) = self.inbox.apply_receipt(message_id, status) {
                    warn!(%message_id, %status, "ignoring receipt: {e}");
                }
            }
            GatewayEvent::Error(err) => {
                self.status_message = format!("error: {err}");
            }
        }
    }

    /// Handle a line of user input; returns the stored reply when one
    /// needs to be handed to the gateway
    pub fn handle_input(&mut self) -> Option<Message> {
        let input = std::mem::take(&mut self.input_buffer);
        let trimmed = input.trim();
        if !trimmed.is_empty() {
            self.input_history.push(trimmed.to_string());
        }
        self.history_index = None;
        self.input_cursor = 0;

        match input::parse_input(&input) {
            InputAction::SendText(text) => {
                return self.send(&text, None);
            }
            InputAction::SendVia(channel, text) => {
                return self.send(&text, Some(channel));
            }
            InputAction::Join(target) => {
                self.join_conversation(&target);
            }
            InputAction::Part => {
                self.inbox.close();
                self.update_status();
            }
            InputAction::Search(text) => {
                self.status_message = if text.is_empty() {
                    "search cleared".to_string()
                } else {
                    format!("search: {text}")
                };
                self.inbox.set_search(text);
            }
            InputAction::Filter(filter) => {
                self.inbox.set_channel_filter(filter);
                self.status_message = format!("channel: {filter}");
            }
            InputAction::Template => {
                self.apply_template();
            }
            InputAction::ToggleSidebar => {
                self.sidebar_visible = !self.sidebar_visible;
            }
            InputAction::Help => {
                self.show_help = true;
            }
            InputAction::Quit => {
                self.should_quit = true;
            }
            InputAction::Unknown(msg) => {
                self.status_message = msg;
            }
        }
        None
    }

    fn send(&mut self, text: &str, channel: Option<Channel>) -> Option<Message> {
        match self.inbox.send(text, channel) {
            Ok(msg) => Some(msg),
            Err(e) => {
                self.status_message = match self.inbox.active_client() {
                    Some(_) => e.to_string(),
                    None => "No active conversation. Use /join <name> first.".to_string(),
                };
                None
            }
        }
    }

    /// Replace the input line with the suggested quick reply for the open
    /// conversation, if there is one.
    pub fn apply_template(&mut self) {
        match self.inbox.suggestion() {
            Some(template) => {
                self.input_buffer = template.text.to_string();
                self.input_cursor = self.input_buffer.chars().count();
                self.status_message = format!("template: {}", template.title);
                self.mode = InputMode::Insert;
            }
            None => {
                self.status_message = "no suggestion for this conversation".to_string();
            }
        }
    }

    /// Update autocomplete candidates based on current input_buffer.
    /// Called after every input change in Insert mode.
    pub fn update_autocomplete(&mut self) {
        let buf = &self.input_buffer;
        if !buf.starts_with('/') || buf.contains(' ') {
            self.hide_autocomplete();
            return;
        }

        let prefix = buf.to_lowercase();
        let candidates: Vec<usize> = COMMANDS
            .iter()
            .enumerate()
            .filter(|(_, cmd)| cmd.name.starts_with(&prefix) || cmd.alias.starts_with(&prefix))
            .map(|(i, _)| i)
            .collect();

        if candidates.is_empty() {
            self.hide_autocomplete();
        } else {
            self.autocomplete_visible = true;
            self.autocomplete_candidates = candidates;
            if self.autocomplete_index >= self.autocomplete_candidates.len() {
                self.autocomplete_index = 0;
            }
        }
    }

    fn hide_autocomplete(&mut self) {
        self.autocomplete_visible = false;
        self.autocomplete_candidates.clear();
        self.autocomplete_index = 0;
    }

    /// Handle a key press while the autocomplete popup is visible.
    pub fn handle_autocomplete_key(&mut self, code: KeyCode) -> Option<Message> {
        match code {
            KeyCode::Up => {
                let len = self.autocomplete_candidates.len();
                if len > 0 {
                    self.autocomplete_index = (self.autocomplete_index + len - 1) % len;
                }
            }
            KeyCode::Down => {
                let len = self.autocomplete_candidates.len();
                if len > 0 {
                    self.autocomplete_index = (self.autocomplete_index + 1) % len;
                }
            }
            KeyCode::Tab => self.apply_autocomplete(),
            KeyCode::Esc => self.hide_autocomplete(),
            KeyCode::Enter => {
                self.apply_autocomplete();
                return self.handle_input();
            }
            _ => {
                self.apply_input_edit(code);
                self.update_autocomplete();
            }
        }
        None
    }

    /// Accept the currently selected autocomplete candidate.
    pub fn apply_autocomplete(&mut self) {
        if let Some(&cmd_idx) = self.autocomplete_candidates.get(self.autocomplete_index) {
            let cmd = &COMMANDS[cmd_idx];
            self.input_buffer = if cmd.args.is_empty() {
                cmd.name.to_string()
            } else {
                format!("{} ", cmd.name)
            };
            self.input_cursor = self.input_buffer.chars().count();
            self.hide_autocomplete();
        }
    }

    /// Navigate up through input history (older entries).
    pub fn history_up(&mut self) {
        let idx = match self.history_index {
            None if self.input_history.is_empty() => return,
            None => {
                self.history_draft = self.input_buffer.clone();
                self.input_history.len() - 1
            }
            Some(idx) if idx > 0 => idx - 1,
            Some(_) => return,
        };
        self.history_index = Some(idx);
        self.input_buffer = self.input_history[idx].clone();
        self.input_cursor = self.input_buffer.chars().count();
    }

    /// Navigate down through input history (newer entries).
    pub fn history_down(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };
        if idx + 1 < self.input_history.len() {
            self.history_index = Some(idx + 1);
            self.input_buffer = self.input_history[idx + 1].clone();
        } else {
            self.input_buffer = std::mem::take(&mut self.history_draft);
            self.history_index = None;
        }
        self.input_cursor = self.input_buffer.chars().count();
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.input_buffer
            .char_indices()
            .nth(char_idx)
            .map_or(self.input_buffer.len(), |(i, _)| i)
    }

    /// Handle basic cursor/editing keys. Returns true if the key was handled.
    pub fn apply_input_edit(&mut self, key_code: KeyCode) -> bool {
        let len = self.input_buffer.chars().count();
        match key_code {
            KeyCode::Backspace => {
                if self.input_cursor > 0 {
                    self.input_cursor -= 1;
                    let at = self.byte_offset(self.input_cursor);
                    self.input_buffer.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.input_cursor < len {
                    let at = self.byte_offset(self.input_cursor);
                    self.input_buffer.remove(at);
                }
            }
            KeyCode::Left => self.input_cursor = self.input_cursor.saturating_sub(1),
            KeyCode::Right => self.input_cursor = (self.input_cursor + 1).min(len),
            KeyCode::Home => self.input_cursor = 0,
            KeyCode::End => self.input_cursor = len,
            KeyCode::Up => self.history_up(),
            KeyCode::Down => self.history_down(),
            KeyCode::Char(c) => {
                let at = self.byte_offset(self.input_cursor);
                self.input_buffer.insert(at, c);
                self.input_cursor += 1;
            }
            _ => return false,
        }
        true
    }

    /// Open a conversation by exact client id, or by a case-insensitive
    /// fragment of the client's name.
    fn join_conversation(&mut self, target: &str) {
        let ids: Vec<String> = self
            .inbox
            .conversations()
            .iter()
            .map(|c| c.client_id.clone())
            .collect();

        let needle = target.to_lowercase();
        let found = ids.iter().find(|id| id.as_str() == target).or_else(|| {
            ids.iter()
                .find(|id| self.inbox.display_name(id).to_lowercase().contains(&needle))
        });

        match found {
            Some(id) => {
                let id = id.clone();
                self.inbox.open(&id);
                self.update_status();
            }
            None => self.status_message = format!("Conversation not found: {target}"),
        }
    }

    pub fn next_conversation(&mut self) {
        self.inbox.next_conversation();
        self.update_status();
    }

    pub fn prev_conversation(&mut self) {
        self.inbox.prev_conversation();
        self.update_status();
    }

    pub fn update_status(&mut self) {
        let state = if self.connected { "connected" } else { "offline" };
        let Some(id) = self.inbox.active_client().map(str::to_string) else {
            self.status_message = format!("{state} | no conversation selected");
            return;
        };
        let channel = self.inbox.reply_channel(&id);
        let name = self.inbox.display_name(&id);
        self.status_message = format!("{state} | {name} via {channel}");
    }

    pub fn set_connected(&mut self) {
        self.connected = true;
        self.update_status();
    }

    pub fn set_disconnected(&mut self, reason: impl Into<String>) {
        self.connected = false;
        self.connection_error = Some(reason.into());
    }

    /// Advance the typing indicator; call once per frame.
    pub fn tick(&mut self) {
        self.inbox.tick();
    }

    pub fn total_unread(&mut self) -> usize {
        self.inbox.total_unread()
    }
}
