use super::{Exchange, StepContext};
use crate::{quality::Quality, Result};
use ledger_core::{
    ops, AccountId, Amount, ApplyView, ApplyViewExt, Book, LedgerKey, Offer, ReadView,
    ReadViewExt, Rounding,
};

/// Crosses offers in one order book, best rate first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookStep {
    /// Book crossed
    pub book: Book,
    /// Account the strand starts from; its own offers are never crossed
    pub strand_src: AccountId,
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Output(Amount),
    Input(Amount),
}

impl BookStep {
    /// New book step
    pub fn new(book: Book, strand_src: AccountId) -> Self {
        Self { book, strand_src }
    }

    /// Rate of the offer at the top of the book
    pub(crate) fn quality_upper_bound(&self, view: &dyn ReadView) -> Result<Option<Quality>> {
        let directory = ops::book_directory(view, &self.book)?;
        Ok(directory
            .as_ref()
            .and_then(|directory| directory.best())
            .and_then(|best| Quality::from_rate(best.rate)))
    }

    pub(crate) fn rev(
        &self,
        view: &mut dyn ApplyView,
        output: &Amount,
        ctx: &mut StepContext<'_>,
    ) -> Result<Exchange> {
        self.cross(view, Target::Output(*output), ctx)
    }

    pub(crate) fn fwd(
        &self,
        view: &mut dyn ApplyView,
        input: &Amount,
        ctx: &mut StepContext<'_>,
    ) -> Result<Exchange> {
        self.cross(view, Target::Input(*input), ctx)
    }

    fn cross(
        &self,
        view: &mut dyn ApplyView,
        target: Target,
        ctx: &mut StepContext<'_>,
    ) -> Result<Exchange> {
        let in_issue = self.book.input;
        let out_issue = self.book.output;
        let mut total_in = Amount::zero(in_issue);
        let mut total_out = Amount::zero(out_issue);
        let mut remaining = match target {
            Target::Output(amount) | Target::Input(amount) => amount,
        };

        let directory = match ops::book_directory(view, &self.book)? {
            Some(directory) => directory,
            None => {
                return Ok(Exchange {
                    input: total_in,
                    output: total_out,
                    exhausted: true,
                })
            }
        };

        let mut crossed = 0;
        let mut exhausted = false;
        let mut entries = directory.offers.into_iter();
        while remaining.signum() > 0 && crossed < ctx.max_offers {
            let entry = match entries.next() {
                Some(entry) => entry,
                None => {
                    exhausted = true;
                    break;
                }
            };

            // Directory order is rate order, so nothing past this is better
            if let Some(limit) = ctx.quality_limit {
                let worse = Quality::from_rate(entry.rate)
                    .map_or(true, |quality| quality.worse_than(&limit));
                if worse {
                    exhausted = true;
                    break;
                }
            }

            let offer: Offer = match view.read_entry(&entry.key)? {
                Some(offer) => offer,
                None => continue,
            };
            if offer.owner == self.strand_src {
                continue;
            }

            let funds = ops::offer_funds(view, &offer)?;
            if funds.signum() <= 0 {
                tracing::trace!(offer = %entry.key, owner = %offer.owner, "Unfunded offer");
                ctx.offers.flag_unfunded(entry.key);
                continue;
            }

            // What the offer can trade once scaled down to the owner's funds
            let (avail_in, avail_out) = if funds < offer.taker_gets {
                let scaled_in =
                    funds.mul_ratio(&offer.taker_pays, &offer.taker_gets, in_issue, Rounding::Up)?;
                (scaled_in, funds)
            } else {
                (offer.taker_pays, offer.taker_gets)
            };

            let (take_in, take_out) = match target {
                Target::Output(_) if remaining >= avail_out => (avail_in, avail_out),
                Target::Output(_) => (
                    remaining.mul_ratio(
                        &offer.taker_pays,
                        &offer.taker_gets,
                        in_issue,
                        Rounding::Up,
                    )?,
                    remaining,
                ),
                Target::Input(_) if remaining >= avail_in => (avail_in, avail_out),
                Target::Input(_) => (
                    remaining,
                    remaining
                        .mul_ratio(&offer.taker_gets, &offer.taker_pays, out_issue, Rounding::Down)?
                        .min_of(&avail_out)?,
                ),
            };

            self.consume(view, &entry.key, offer, &take_in, &take_out, ctx)?;
            crossed += 1;
            total_in = total_in.checked_add(&take_in)?;
            total_out = total_out.checked_add(&take_out)?;
            remaining = match target {
                Target::Output(_) => remaining.checked_sub(&take_out)?,
                Target::Input(_) => remaining.checked_sub(&take_in)?,
            };
        }

        tracing::trace!(
            book = %self.book,
            crossed,
            input = %total_in,
            output = %total_out,
            exhausted,
            "Book step"
        );

        Ok(Exchange {
            input: total_in,
            output: total_out,
            exhausted,
        })
    }

    /// Settle one crossing: the owner receives `take_in` from the input
    /// issuer and redeems `take_out` to the output issuer.
    fn consume(
        &self,
        view: &mut dyn ApplyView,
        key: &LedgerKey,
        mut offer: Offer,
        take_in: &Amount,
        take_out: &Amount,
        ctx: &mut StepContext<'_>,
    ) -> Result<()> {
        let owner = offer.owner;
        match take_in {
            Amount::Xrp(xrp) => ops::credit_xrp(view, &owner, xrp.drops())?,
            Amount::Iou(iou) => ops::ripple_credit(
                view,
                &iou.issue.account,
                &owner,
                &iou.issue.currency,
                iou.value,
            )?,
        }
        match take_out {
            Amount::Xrp(xrp) => ops::credit_xrp(view, &owner, -xrp.drops())?,
            Amount::Iou(iou) => ops::ripple_credit(
                view,
                &owner,
                &iou.issue.account,
                &iou.issue.currency,
                iou.value,
            )?,
        }

        offer.taker_pays = offer.taker_pays.checked_sub(take_in)?.clamp_non_negative();
        offer.taker_gets = offer.taker_gets.checked_sub(take_out)?.clamp_non_negative();
        if offer.taker_pays.is_zero() || offer.taker_gets.is_zero() {
            ops::delete_offer(view, key)?;
            ctx.offers.flag_consumed(*key);
        } else {
            view.update_entry(&offer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::OffersToRemove;
    use ledger_core::{Currency, Issue, MemoryLedger, Sandbox};
    use rust_decimal::Decimal;

    struct Fixture {
        ledger: MemoryLedger,
        gateway: AccountId,
        maker: AccountId,
        usd: Issue,
    }

    fn fixture() -> Fixture {
        let mut ledger = MemoryLedger::default();
        let gateway = AccountId::from_seed("gateway");
        let maker = AccountId::from_seed("maker");
        let usd = Issue::new(Currency::from_code("USD").unwrap(), gateway);
        ops::create_account(&mut ledger, gateway, 100_000_000).unwrap();
        ops::create_account(&mut ledger, maker, 100_000_000).unwrap();
        ops::set_trust_line(&mut ledger, maker, gateway, usd.currency, Decimal::from(1000))
            .unwrap();
        Fixture {
            ledger,
            gateway,
            maker,
            usd,
        }
    }

    fn usd(issue: Issue, value: i64) -> Amount {
        Amount::iou(Decimal::from(value), issue)
    }

    fn ctx(offers: &mut OffersToRemove) -> StepContext<'_> {
        StepContext {
            max_offers: 1000,
            quality_limit: None,
            offers,
        }
    }

    #[test]
    fn test_rev_consumes_best_offer_first() {
        let mut f = fixture();
        // gateway sells its own USD: 2 drops per USD, then 1 drop per USD
        let dear =
            ops::create_offer(&mut f.ledger, f.gateway, Amount::xrp(20), usd(f.usd, 10)).unwrap();
        let cheap =
            ops::create_offer(&mut f.ledger, f.gateway, Amount::xrp(10), usd(f.usd, 10)).unwrap();

        let step = BookStep::new(Book::new(Issue::xrp(), f.usd), AccountId::from_seed("taker"));
        assert_eq!(
            step.quality_upper_bound(&f.ledger).unwrap().unwrap().rate(),
            Decimal::ONE
        );

        let mut offers = OffersToRemove::default();
        let mut sandbox = Sandbox::new(&f.ledger);
        let exchange = step
            .rev(&mut sandbox, &usd(f.usd, 15), &mut ctx(&mut offers))
            .unwrap();

        // 10 USD for 10 drops, then 5 USD for 10 drops
        assert_eq!(exchange.output, usd(f.usd, 15));
        assert_eq!(exchange.input, Amount::xrp(20));
        assert!(!exchange.exhausted);
        assert!(sandbox.read(&cheap).is_none());
        let rest: Offer = sandbox.require_entry(&dear).unwrap();
        assert_eq!(rest.taker_gets, usd(f.usd, 5));
        assert_eq!(rest.taker_pays, Amount::xrp(10));
        assert_eq!(offers.into_keys().into_iter().collect::<Vec<_>>(), vec![cheap]);
    }

    #[test]
    fn test_unfunded_offer_is_flagged_and_skipped() {
        let mut f = fixture();
        // maker holds no USD
        let empty =
            ops::create_offer(&mut f.ledger, f.maker, Amount::xrp(1), usd(f.usd, 10)).unwrap();
        ops::create_offer(&mut f.ledger, f.gateway, Amount::xrp(30), usd(f.usd, 10)).unwrap();

        let step = BookStep::new(Book::new(Issue::xrp(), f.usd), AccountId::from_seed("taker"));
        let mut offers = OffersToRemove::default();
        let mut sandbox = Sandbox::new(&f.ledger);
        let exchange = step
            .rev(&mut sandbox, &usd(f.usd, 10), &mut ctx(&mut offers))
            .unwrap();

        assert_eq!(exchange.input, Amount::xrp(30));
        assert!(offers.unfunded().contains(&empty));
    }

    #[test]
    fn test_partially_funded_offer_scales_down() {
        let mut f = fixture();
        ops::ripple_credit(&mut f.ledger, &f.gateway, &f.maker, &f.usd.currency, Decimal::from(4))
            .unwrap();
        ops::create_offer(&mut f.ledger, f.maker, Amount::xrp(20), usd(f.usd, 10)).unwrap();

        let step = BookStep::new(Book::new(Issue::xrp(), f.usd), AccountId::from_seed("taker"));
        let mut offers = OffersToRemove::default();
        let mut sandbox = Sandbox::new(&f.ledger);
        let exchange = step
            .rev(&mut sandbox, &usd(f.usd, 10), &mut ctx(&mut offers))
            .unwrap();

        assert_eq!(exchange.output, usd(f.usd, 4));
        assert_eq!(exchange.input, Amount::xrp(8));
        assert!(exchange.exhausted);
        assert!(ops::account_holds(&sandbox, &f.maker, &f.usd).unwrap().is_zero());
    }

    #[test]
    fn test_fwd_consumes_all_input() {
        let mut f = fixture();
        ops::create_offer(&mut f.ledger, f.gateway, Amount::xrp(3), usd(f.usd, 1)).unwrap();

        let step = BookStep::new(Book::new(Issue::xrp(), f.usd), AccountId::from_seed("taker"));
        let mut offers = OffersToRemove::default();
        let mut sandbox = Sandbox::new(&f.ledger);
        let exchange = step
            .fwd(&mut sandbox, &Amount::xrp(2), &mut ctx(&mut offers))
            .unwrap();

        assert_eq!(exchange.input, Amount::xrp(2));
        assert!(exchange.output.value() <= Decimal::new(2, 0) / Decimal::from(3));
        assert!(exchange.output.value() > Decimal::new(66, 2));
    }

    #[test]
    fn test_quality_limit_and_offer_cap() {
        let mut f = fixture();
        ops::create_offer(&mut f.ledger, f.gateway, Amount::xrp(10), usd(f.usd, 10)).unwrap();
        ops::create_offer(&mut f.ledger, f.gateway, Amount::xrp(30), usd(f.usd, 10)).unwrap();
        let step = BookStep::new(Book::new(Issue::xrp(), f.usd), AccountId::from_seed("taker"));

        let mut offers = OffersToRemove::default();
        let mut limited = StepContext {
            max_offers: 1000,
            quality_limit: Quality::from_rate(Decimal::from(2)),
            offers: &mut offers,
        };
        let mut sandbox = Sandbox::new(&f.ledger);
        let exchange = step.rev(&mut sandbox, &usd(f.usd, 20), &mut limited).unwrap();
        assert_eq!(exchange.output, usd(f.usd, 10));
        assert!(exchange.exhausted);

        let mut offers = OffersToRemove::default();
        let mut capped = StepContext {
            max_offers: 1,
            quality_limit: None,
            offers: &mut offers,
        };
        let mut sandbox = Sandbox::new(&f.ledger);
        let exchange = step.rev(&mut sandbox, &usd(f.usd, 20), &mut capped).unwrap();
        assert_eq!(exchange.output, usd(f.usd, 10));
        assert!(!exchange.exhausted);
    }

    #[test]
    fn test_own_offers_are_skipped() {
        let mut f = fixture();
        ops::create_offer(&mut f.ledger, f.gateway, Amount::xrp(10), usd(f.usd, 10)).unwrap();
        let step = BookStep::new(Book::new(Issue::xrp(), f.usd), f.gateway);

        let mut offers = OffersToRemove::default();
        let mut sandbox = Sandbox::new(&f.ledger);
        let exchange = step
            .rev(&mut sandbox, &usd(f.usd, 10), &mut ctx(&mut offers))
            .unwrap();
        assert!(exchange.output.is_zero());
        assert!(exchange.exhausted);
    }
}
