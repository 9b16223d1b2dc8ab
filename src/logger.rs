use crate::channel::Listener;
use crate::error::ListenerError;
use std::fmt::Display;

/// A listener that writes every value it receives to the `log` facade.
pub struct LogListener {
    label: String,
    level: log::Level,
}

impl LogListener {
    pub fn new(label: impl Into<String>) -> Self {
        LogListener {
            label: label.into(),
            level: log::Level::Debug,
        }
    }

    pub fn with_level(mut self, level: log::Level) -> Self {
        self.level = level;
        self
    }
}

impl<T: Display + 'static> Listener<T> for LogListener {
    fn on_event(&mut self, value: &T) -> Result<(), ListenerError> {
        log::log!(self.level, "[{}] {}", self.label, value);
        Ok(())
    }
}
