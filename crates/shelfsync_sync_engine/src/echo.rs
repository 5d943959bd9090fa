//! Local echo guard.

use shelfsync_codec::Record;

/// Recognises the local-store notification caused by the engine's own
/// inbound apply.
///
/// The engine arms the guard with the exact collection it is about to write
/// locally. The next local change is inspected once: if it carries that
/// collection it is the echo and is dropped, otherwise it is a genuine edit.
/// Either way the guard disarms, so a lost notification can never swallow a
/// later user edit.
#[derive(Debug, Default)]
pub struct EchoGuard {
    armed: Option<Vec<Record>>,
}

impl EchoGuard {
    /// Creates a disarmed guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects the next local change to carry `records`.
    pub fn arm(&mut self, records: Vec<Record>) {
        self.armed = Some(records);
    }

    /// Forgets any expected echo.
    pub fn disarm(&mut self) {
        self.armed = None;
    }

    /// Returns true if an echo is expected.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Consumes the guard, returning true if `records` is the expected echo.
    pub fn take_if_echo(&mut self, records: &[Record]) -> bool {
        self.armed
            .take()
            .is_some_and(|expected| expected.as_slice() == records)
    }
}
