use super::Exchange;
use crate::{Error, Result};
use ledger_core::{ops, AccountId, Amount, ApplyView};

/// Which end of the strand an endpoint sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSide {
    /// Spends the account's liquid balance
    Source,
    /// Credits the account
    Destination,
}

/// Native balance at one end of a strand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrpEndpointStep {
    /// Account paying or paid
    pub account: AccountId,
    /// Strand end
    pub side: EndpointSide,
}

impl XrpEndpointStep {
    /// New endpoint step
    pub fn new(account: AccountId, side: EndpointSide) -> Self {
        Self { account, side }
    }

    pub(crate) fn execute(&self, view: &mut dyn ApplyView, requested: &Amount) -> Result<Exchange> {
        let requested = match requested {
            Amount::Xrp(xrp) => xrp.drops(),
            Amount::Iou(_) => {
                return Err(Error::Strand(format!(
                    "native endpoint asked for {}",
                    requested
                )))
            }
        };

        let (drops, exhausted) = match self.side {
            EndpointSide::Source => {
                let liquid = ops::xrp_liquid(view, &self.account)?;
                let drops = requested.min(liquid);
                ops::credit_xrp(view, &self.account, -drops)?;
                (drops, liquid <= requested)
            }
            EndpointSide::Destination => {
                ops::account_root(view, &self.account)?;
                ops::credit_xrp(view, &self.account, requested)?;
                (requested, false)
            }
        };
        tracing::trace!(account = %self.account, side = ?self.side, drops, "Native endpoint");

        Ok(Exchange {
            input: Amount::xrp(drops),
            output: Amount::xrp(drops),
            exhausted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{Fees, MemoryLedger, ReadView, Sandbox};

    fn ledger() -> (MemoryLedger, AccountId) {
        let mut ledger = MemoryLedger::new(Fees {
            reserve_base: 10,
            reserve_increment: 5,
        });
        let alice = AccountId::from_seed("alice");
        ops::create_account(&mut ledger, alice, 100).unwrap();
        (ledger, alice)
    }

    #[test]
    fn test_source_keeps_reserve() {
        let (ledger, alice) = ledger();
        let step = XrpEndpointStep::new(alice, EndpointSide::Source);
        let mut sandbox = Sandbox::new(&ledger);

        let first = step.execute(&mut sandbox, &Amount::xrp(60)).unwrap();
        assert_eq!(first.output, Amount::xrp(60));
        assert!(!first.exhausted);

        let second = step.execute(&mut sandbox, &Amount::xrp(60)).unwrap();
        assert_eq!(second.output, Amount::xrp(30));
        assert!(second.exhausted);
        assert_eq!(ops::account_root(&sandbox, &alice).unwrap().balance, 10);
        assert_eq!(sandbox.fees().reserve(0), 10);
    }

    #[test]
    fn test_destination_requires_account() {
        let (ledger, alice) = ledger();
        let mut sandbox = Sandbox::new(&ledger);

        let paid = XrpEndpointStep::new(alice, EndpointSide::Destination)
            .execute(&mut sandbox, &Amount::xrp(25))
            .unwrap();
        assert_eq!(paid.input, Amount::xrp(25));
        assert_eq!(ops::account_root(&sandbox, &alice).unwrap().balance, 125);

        let err = XrpEndpointStep::new(AccountId::from_seed("nobody"), EndpointSide::Destination)
            .execute(&mut sandbox, &Amount::xrp(1))
            .unwrap_err();
        assert_eq!(err.ter(), crate::Ter::NoAccount);
    }
}
