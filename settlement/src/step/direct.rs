use super::Exchange;
use crate::Result;
use ledger_core::{ops, AccountId, Amount, ApplyView, Issue};

/// Moves issued currency from `src` to `dst` across their trust line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectStep {
    /// Sender
    pub src: AccountId,
    /// Receiver
    pub dst: AccountId,
    /// Issue carried
    pub issue: Issue,
}

impl DirectStep {
    /// New direct step
    pub fn new(src: AccountId, dst: AccountId, issue: Issue) -> Self {
        Self { src, dst, issue }
    }

    /// Input equals output, so both directions are the same transfer
    pub(crate) fn execute(&self, view: &mut dyn ApplyView, requested: &Amount) -> Result<Exchange> {
        let capacity = ops::line_capacity(view, &self.src, &self.dst, &self.issue.currency)?;
        let requested = requested.value();
        let value = requested.min(capacity);

        ops::ripple_credit(view, &self.src, &self.dst, &self.issue.currency, value)?;
        tracing::trace!(src = %self.src, dst = %self.dst, %value, %capacity, "Direct step");

        let moved = Amount::iou(value, self.issue);
        Ok(Exchange {
            input: moved,
            output: moved,
            exhausted: capacity <= requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{Currency, MemoryLedger, Sandbox};
    use rust_decimal::Decimal;

    #[test]
    fn test_direct_step_limited_by_capacity() {
        let mut ledger = MemoryLedger::default();
        let gateway = AccountId::from_seed("gateway");
        let bob = AccountId::from_seed("bob");
        let usd = Issue::new(Currency::from_code("USD").unwrap(), gateway);
        ops::create_account(&mut ledger, bob, 50_000_000).unwrap();
        ops::set_trust_line(&mut ledger, bob, gateway, usd.currency, Decimal::from(40)).unwrap();

        let step = DirectStep::new(gateway, bob, usd);
        let mut sandbox = Sandbox::new(&ledger);

        let small = step
            .execute(&mut sandbox, &Amount::iou(Decimal::from(15), usd))
            .unwrap();
        assert_eq!(small.output.value(), Decimal::from(15));
        assert!(!small.exhausted);

        let rest = step
            .execute(&mut sandbox, &Amount::iou(Decimal::from(100), usd))
            .unwrap();
        assert_eq!(rest.output.value(), Decimal::from(25));
        assert!(rest.exhausted);

        let held = ops::account_holds(&sandbox, &bob, &usd).unwrap();
        assert_eq!(held.value(), Decimal::from(40));
    }

    #[test]
    fn test_direct_step_without_line() {
        let ledger = MemoryLedger::default();
        let usd = Issue::new(
            Currency::from_code("USD").unwrap(),
            AccountId::from_seed("gateway"),
        );
        let step = DirectStep::new(usd.account, AccountId::from_seed("carol"), usd);
        let mut sandbox = Sandbox::new(&ledger);
        let err = step
            .execute(&mut sandbox, &Amount::iou(Decimal::ONE, usd))
            .unwrap_err();
        assert_eq!(err.ter(), crate::Ter::NoLine);
    }
}
