//! Metered actions: text generation and cloud export.
//!
//! Both draw from a per-kind allowance that refills on a fixed cycle. The
//! ledger is a trait so a deployment can back it with a real billing
//! service; [`MemoryLedger`] is the built-in single-user implementation.

use chrono::{DateTime, Duration, Utc};

use crate::error::LienzoError;

/// Which allowance an action draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditKind {
    Generation,
    Export,
}

impl CreditKind {
    pub fn label(self) -> &'static str {
        match self {
            CreditKind::Generation => "generation",
            CreditKind::Export => "export",
        }
    }
}

/// Gate and account for metered actions.
pub trait CreditLedger: Send + Sync {
    /// Credits left for `kind` in the current cycle.
    fn remaining(&mut self, kind: CreditKind) -> u32;

    /// When the allowances refill, if the ledger refills at all.
    fn next_reset(&self) -> Option<DateTime<Utc>>;

    /// Spend one credit of `kind`, or fail without side effects when the
    /// allowance is exhausted.
    fn try_consume(&mut self, kind: CreditKind) -> Result<(), LienzoError>;
}

/// In-memory ledger: a fixed allowance per kind, refilled every 24 hours.
pub struct MemoryLedger {
    allowance: u32,
    generation: u32,
    export: u32,
    last_reset: DateTime<Utc>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(5)
    }
}

impl MemoryLedger {
    pub fn new(allowance: u32) -> Self {
        Self {
            allowance,
            generation: allowance,
            export: allowance,
            last_reset: Utc::now(),
        }
    }

    /// Refill both allowances if a full cycle has passed by `now`.
    ///
    /// Public so tests can drive the clock instead of waiting a day.
    pub fn tick_at(&mut self, now: DateTime<Utc>) {
        if now - self.last_reset >= Duration::hours(24) {
            self.generation = self.allowance;
            self.export = self.allowance;
            self.last_reset = now;
        }
    }

    fn slot(&mut self, kind: CreditKind) -> &mut u32 {
        match kind {
            CreditKind::Generation => &mut self.generation,
            CreditKind::Export => &mut self.export,
        }
    }
}

impl CreditLedger for MemoryLedger {
    fn remaining(&mut self, kind: CreditKind) -> u32 {
        self.tick_at(Utc::now());
        *self.slot(kind)
    }

    fn next_reset(&self) -> Option<DateTime<Utc>> {
        Some(self.last_reset + Duration::hours(24))
    }

    fn try_consume(&mut self, kind: CreditKind) -> Result<(), LienzoError> {
        self.tick_at(Utc::now());
        let slot = self.slot(kind);
        if *slot == 0 {
            return Err(LienzoError::CreditsExhausted(kind.label()));
        }
        *slot -= 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_decrements_only_its_kind() {
        let mut ledger = MemoryLedger::new(5);
        ledger.try_consume(CreditKind::Generation).unwrap();
        ledger.try_consume(CreditKind::Generation).unwrap();
        assert_eq!(ledger.remaining(CreditKind::Generation), 3);
        assert_eq!(ledger.remaining(CreditKind::Export), 5);
    }

    #[test]
    fn test_exhausted_allowance_fails_cleanly() {
        let mut ledger = MemoryLedger::new(1);
        ledger.try_consume(CreditKind::Export).unwrap();
        let err = ledger.try_consume(CreditKind::Export).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No export credits remaining"
        );
        // Still zero, not underflowed.
        assert_eq!(ledger.remaining(CreditKind::Export), 0);
    }

    #[test]
    fn test_cycle_refills_both_allowances() {
        let mut ledger = MemoryLedger::new(2);
        ledger.try_consume(CreditKind::Generation).unwrap();
        ledger.try_consume(CreditKind::Generation).unwrap();
        ledger.try_consume(CreditKind::Export).unwrap();

        ledger.tick_at(Utc::now() + Duration::hours(25));
        assert_eq!(ledger.remaining(CreditKind::Generation), 2);
        assert_eq!(ledger.remaining(CreditKind::Export), 2);
    }

    #[test]
    fn test_partial_cycle_does_not_refill() {
        let mut ledger = MemoryLedger::new(2);
        ledger.try_consume(CreditKind::Generation).unwrap();
        ledger.tick_at(Utc::now() + Duration::hours(23));
        assert_eq!(ledger.remaining(CreditKind::Generation), 1);
    }

    #[test]
    fn test_next_reset_is_a_day_out() {
        let ledger = MemoryLedger::new(5);
        let reset = ledger.next_reset().unwrap();
        assert!(reset > Utc::now());
        assert!(reset <= Utc::now() + Duration::hours(24));
    }
}
