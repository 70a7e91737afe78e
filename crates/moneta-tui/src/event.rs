//! TUI event types for input and settled background work.

use crossterm::event::KeyEvent;
use moneta_core::{Message, SurveyReport, TurnOutcome};

/// Application event emitted by input handlers or spawned tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// A chat turn settled (reply, failure notice, rejection, or stale).
    TurnSettled { epoch: u64, outcome: TurnOutcome },
    /// The survey report settled; `None` means the report failed and was
    /// logged only.
    SurveySettled {
        epoch: u64,
        report: Option<SurveyReport>,
    },
    /// A product follow-up acknowledgement was recorded.
    ChoiceRecorded { epoch: u64, ack: Option<Message> },
    /// Error from a background action that produced no messages.
    ActionError(String),
    /// Scroll event in the chat view.
    Scroll(i16),
}
