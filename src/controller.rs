use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, RTError, ViewConfig};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &ViewConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, RTError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.handle_key(key, model.raw_keyevents()));
        }
        Ok(None)
    }

    fn handle_key(&self, key: KeyEvent, raw: bool) -> Option<Message> {
        if raw {
            return Some(Message::RawKey(key));
        }
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Left | KeyCode::Char('p') => Some(Message::PreviousPage),
            KeyCode::Right | KeyCode::Char('n') => Some(Message::NextPage),
            KeyCode::Char('[') => Some(Message::PreviousOption),
            KeyCode::Char(']') => Some(Message::NextOption),
            KeyCode::Char('/') => Some(Message::EditFilter),
            KeyCode::Char('c') => Some(Message::ClearFilter),
            KeyCode::Char('r') => Some(Message::Reload),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
