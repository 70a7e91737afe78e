//! Application state for the Moneta TUI.

use log::debug;
use moneta_config::ChatMode;
use moneta_core::{Message, Role, SurveySession};

/// Single chat entry rendered in the transcript.
#[derive(Debug, Clone)]
pub struct ChatEntry {
    /// Role that produced the message.
    pub role: Role,
    /// Message content, shown verbatim.
    pub content: String,
}

/// State of the post-survey product panel.
#[derive(Debug, Clone, Default)]
pub struct FollowUpPanel {
    /// Buffer for the custom entry field; `Some` while it is active.
    pub free_text: Option<String>,
}

/// Top-level application state for the TUI.
pub struct App {
    /// Chat transcript entries.
    pub entries: Vec<ChatEntry>,
    /// Current input buffer.
    pub input: String,
    /// Chat mode mirrored from the engine for display.
    pub mode: ChatMode,
    /// Status line text.
    pub status: String,
    /// Whether a chat turn is in flight.
    pub busy: bool,
    /// Conversation epoch mirrored from the engine; stale events are
    /// ignored against it.
    pub epoch: u64,
    /// Active survey modal, if any.
    pub survey: Option<SurveySession>,
    /// Active product follow-up panel, if any.
    pub follow_up: Option<FollowUpPanel>,
    /// Current scroll offset for the chat view.
    pub scroll: u16,
    /// Whether to stick to the bottom of the transcript.
    pub auto_scroll: bool,
    /// Maximum scroll offset for the chat view.
    pub chat_max_scroll: u16,
    /// Backend base URL, for the header.
    pub base_url: String,
    /// Data directory, for the header.
    pub data_dir: String,
}

impl App {
    /// Create a new application state with defaults.
    pub fn new(mode: ChatMode, base_url: String, data_dir: String) -> Self {
        Self {
            entries: Vec::new(),
            input: String::new(),
            mode,
            status: "idle".to_string(),
            busy: false,
            epoch: 0,
            survey: None,
            follow_up: None,
            scroll: 0,
            auto_scroll: true,
            chat_max_scroll: 0,
            base_url,
            data_dir,
        }
    }

    /// Replace the transcript with stored history.
    pub fn load_messages(&mut self, messages: Vec<Message>) {
        debug!("loading transcript (count={})", messages.len());
        self.entries = messages
            .into_iter()
            .map(|message| ChatEntry {
                role: message.role,
                content: message.content,
            })
            .collect();
        self.enable_auto_scroll();
    }

    /// Append a user bubble.
    pub fn push_user_message(&mut self, content: impl Into<String>) {
        self.entries.push(ChatEntry {
            role: Role::User,
            content: content.into(),
        });
    }

    /// Append an assistant bubble.
    pub fn push_assistant_message(&mut self, content: impl Into<String>) {
        self.entries.push(ChatEntry {
            role: Role::Assistant,
            content: content.into(),
        });
        self.enable_auto_scroll();
    }

    /// Update the status line.
    pub fn push_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Open the survey modal with a fresh session.
    pub fn start_survey(&mut self) {
        self.survey = Some(SurveySession::new());
    }

    /// Show the product follow-up panel.
    pub fn open_follow_up(&mut self) {
        self.follow_up = Some(FollowUpPanel::default());
    }

    /// Scroll the chat view up, leaving the bottom.
    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Scroll the chat view down, re-engaging auto-scroll at the bottom.
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.chat_max_scroll);
        if self.scroll >= self.chat_max_scroll {
            self.auto_scroll = true;
        }
    }

    /// Jump to the top of the transcript.
    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll = 0;
    }

    /// Stick to the bottom of the transcript.
    pub fn enable_auto_scroll(&mut self) {
        self.auto_scroll = true;
        self.scroll = self.chat_max_scroll;
    }

    /// Clamp the scroll position to the rendered content height.
    pub fn update_scroll_bounds(&mut self, max_scroll: u16) {
        self.chat_max_scroll = max_scroll;
        if self.auto_scroll {
            self.scroll = max_scroll;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }
    }
}
