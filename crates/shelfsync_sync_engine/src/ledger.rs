//! Echo suppression state.
//!
//! The ledger remembers the fingerprint of the last payload this engine
//! wrote outward and the last payload it applied inward. It is the only
//! thing standing between the two stores and an endless write loop: a
//! payload matching either fingerprint is never propagated again in either
//! direction. Held in memory only; a restart forgets it.

/// Fingerprints of the last outbound write and the last inbound apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLedger {
    last_written: Option<String>,
    last_applied: Option<String>,
}

impl ChangeLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `fingerprint` was just written or applied.
    ///
    /// Data pulled from the remote side is already there, and data we
    /// already pushed need not be pushed again.
    pub fn should_propagate_out(&self, fingerprint: &str) -> bool {
        !self.is_known(fingerprint)
    }

    /// Returns false if `fingerprint` was just written or applied.
    ///
    /// A remote notification for our own write is an echo, and a payload we
    /// already applied has nothing new.
    pub fn should_propagate_in(&self, fingerprint: &str) -> bool {
        !self.is_known(fingerprint)
    }

    /// Records a successful outbound write.
    pub fn record_written(&mut self, fingerprint: impl Into<String>) {
        self.last_written = Some(fingerprint.into());
    }

    /// Records a successful inbound apply.
    pub fn record_applied(&mut self, fingerprint: impl Into<String>) {
        self.last_applied = Some(fingerprint.into());
    }

    /// Fingerprint of the last outbound write.
    pub fn last_written(&self) -> Option<&str> {
        self.last_written.as_deref()
    }

    /// Fingerprint of the last inbound apply.
    pub fn last_applied(&self) -> Option<&str> {
        self.last_applied.as_deref()
    }

    fn is_known(&self, fingerprint: &str) -> bool {
        self.last_written.as_deref() == Some(fingerprint)
            || self.last_applied.as_deref() == Some(fingerprint)
    }
}
