//! Logging sink port.

/// Single textual sink for decision-trail messages. Adapters are expected
/// to prefix a timestamp; the domain only supplies the message body.
pub trait LogPort {
    fn log(&self, message: &str);
}

/// Sink that drops everything. Useful in tests.
pub struct NullLog;

impl LogPort for NullLog {
    fn log(&self, _message: &str) {}
}
