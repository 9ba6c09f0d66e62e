//! Balance, trust line and offer helpers shared by the engine and its
//! callers

use crate::{
    amount::Amount,
    entries::{AccountRoot, BookDirectory, LedgerEntry, Offer, TrustLine},
    error::{Error, Result},
    keylet::LedgerKey,
    types::{AccountId, Book, Currency, Issue},
    view::{ApplyView, ApplyViewExt, ReadView, ReadViewExt},
};
use rust_decimal::Decimal;

/// Create an account holding `drops`
pub fn create_account<V: ApplyView + ?Sized>(
    view: &mut V,
    account: AccountId,
    drops: i64,
) -> Result<()> {
    view.insert_entry(&AccountRoot::new(account, drops))
}

/// Account root, failing with [`Error::NoAccount`]
pub fn account_root<V: ReadView + ?Sized>(view: &V, account: &AccountId) -> Result<AccountRoot> {
    view.read_entry(&LedgerKey::account(account))?
        .ok_or_else(|| Error::NoAccount(account.to_string()))
}

/// Trust line between two accounts, if any
pub fn trust_line<V: ReadView + ?Sized>(
    view: &V,
    a: &AccountId,
    b: &AccountId,
    currency: &Currency,
) -> Result<Option<TrustLine>> {
    view.read_entry(&LedgerKey::trust_line(a, b, currency))
}

/// Set the limit `account` extends to `peer` for `currency`, creating the
/// line if needed. A new line counts towards `account`'s reserve.
pub fn set_trust_line<V: ApplyView + ?Sized>(
    view: &mut V,
    account: AccountId,
    peer: AccountId,
    currency: Currency,
    limit: Decimal,
) -> Result<()> {
    if account == peer {
        return Err(Error::Other(format!("trust line from {} to itself", account)));
    }
    match trust_line(view, &account, &peer, &currency)? {
        Some(mut line) => {
            line.set_limit(&account, limit);
            view.update_entry(&line)
        }
        None => {
            let mut root = account_root(view, &account)?;
            root.owner_count += 1;
            view.update_entry(&root)?;

            let mut line = TrustLine::new(account, peer, currency);
            line.set_limit(&account, limit);
            view.insert_entry(&line)
        }
    }
}

/// Drops `account` can spend without dipping into its reserve
pub fn xrp_liquid<V: ReadView + ?Sized>(view: &V, account: &AccountId) -> Result<i64> {
    let root = account_root(view, account)?;
    let reserve = view.fees().reserve(root.owner_count);
    Ok(root.balance.saturating_sub(reserve).max(0))
}

/// What `account` holds of `issue`; never negative
pub fn account_holds<V: ReadView + ?Sized>(
    view: &V,
    account: &AccountId,
    issue: &Issue,
) -> Result<Amount> {
    if issue.is_xrp() {
        return Ok(Amount::xrp(xrp_liquid(view, account)?));
    }
    let held = match trust_line(view, account, &issue.account, &issue.currency)? {
        Some(line) => line.balance_for(account).max(Decimal::ZERO),
        None => Decimal::ZERO,
    };
    Ok(Amount::iou(held, *issue))
}

/// How much of `offer.taker_gets` the owner can actually deliver.
///
/// An issuer selling its own currency is limited only by the offer.
pub fn offer_funds<V: ReadView + ?Sized>(view: &V, offer: &Offer) -> Result<Amount> {
    let issue = offer.taker_gets.issue();
    if !issue.is_xrp() && issue.account == offer.owner {
        return Ok(offer.taker_gets);
    }
    account_holds(view, &offer.owner, &issue)
}

/// Most `sender` can move to `receiver` over their line
pub fn line_capacity<V: ReadView + ?Sized>(
    view: &V,
    sender: &AccountId,
    receiver: &AccountId,
    currency: &Currency,
) -> Result<Decimal> {
    trust_line(view, sender, receiver, currency)?
        .map(|line| line.capacity(sender))
        .ok_or_else(|| Error::NoLine(format!("{} -> {} {}", sender, receiver, currency)))
}

/// Move `value` of `currency` from `sender` to `receiver` over their line,
/// creating an empty line when none exists. Limits are not checked here.
pub fn ripple_credit<V: ApplyView + ?Sized>(
    view: &mut V,
    sender: &AccountId,
    receiver: &AccountId,
    currency: &Currency,
    value: Decimal,
) -> Result<()> {
    if sender == receiver || value.is_zero() {
        return Ok(());
    }
    match trust_line(view, sender, receiver, currency)? {
        Some(mut line) => {
            line.transfer(sender, value);
            view.update_entry(&line)
        }
        None => {
            let mut line = TrustLine::new(*sender, *receiver, *currency);
            line.transfer(sender, value);
            view.insert_entry(&line)
        }
    }
}

/// Adjust `account`'s native balance by `delta` drops. The native-asset
/// pseudo-account has no root and absorbs any delta.
pub fn credit_xrp<V: ApplyView + ?Sized>(
    view: &mut V,
    account: &AccountId,
    delta: i64,
) -> Result<()> {
    if account.is_xrp() || delta == 0 {
        return Ok(());
    }
    let mut root = account_root(view, account)?;
    let balance = root
        .balance
        .checked_add(delta)
        .ok_or_else(|| Error::Overflow(format!("{} + {} drops", root.balance, delta)))?;
    if balance < 0 {
        return Err(Error::InsufficientFunds(format!(
            "{} holds {} drops, needs {}",
            account, root.balance, -delta
        )));
    }
    root.balance = balance;
    view.update_entry(&root)
}

/// Place an offer and index it in its book. Returns the offer key.
pub fn create_offer<V: ApplyView + ?Sized>(
    view: &mut V,
    owner: AccountId,
    taker_pays: Amount,
    taker_gets: Amount,
) -> Result<LedgerKey> {
    if taker_pays.signum() <= 0 || taker_gets.signum() <= 0 {
        return Err(Error::Other(format!(
            "offer must be positive: pays {}, gets {}",
            taker_pays, taker_gets
        )));
    }
    let mut root = account_root(view, &owner)?;
    let offer = Offer {
        owner,
        sequence: root.sequence,
        taker_pays,
        taker_gets,
    };
    let rate = offer
        .rate()
        .ok_or_else(|| Error::Overflow(format!("rate of {} / {}", taker_pays, taker_gets)))?;
    let key = offer.key();

    root.sequence += 1;
    root.owner_count += 1;
    view.update_entry(&root)?;
    view.insert_entry(&offer)?;

    let book = offer.book();
    let mut directory = book_directory(view, &book)?.unwrap_or_else(|| BookDirectory::new(book));
    directory.insert(rate, key);
    view.put_entry(&directory)?;

    tracing::debug!(
        owner = %owner,
        sequence = offer.sequence,
        book = %book,
        "Offer placed"
    );

    Ok(key)
}

/// Remove an offer from the ledger and from its book
pub fn delete_offer<V: ApplyView + ?Sized>(view: &mut V, key: &LedgerKey) -> Result<()> {
    let offer: Offer = view.require_entry(key)?;
    let book = offer.book();

    if let Some(mut directory) = book_directory(view, &book)? {
        directory.remove(key);
        if directory.is_empty() {
            view.erase(&directory.key())?;
        } else {
            view.update_entry(&directory)?;
        }
    }
    view.erase(key)?;

    let mut root = account_root(view, &offer.owner)?;
    root.owner_count = root.owner_count.saturating_sub(1);
    view.update_entry(&root)?;

    tracing::debug!(owner = %offer.owner, sequence = offer.sequence, "Offer removed");
    Ok(())
}

/// Delete every offer in `keys` that still exists. Returns how many were
/// deleted.
pub fn remove_offers<'k, V: ApplyView + ?Sized>(
    view: &mut V,
    keys: impl IntoIterator<Item = &'k LedgerKey>,
) -> Result<usize> {
    let mut removed = 0;
    for key in keys {
        if view.exists(key) {
            delete_offer(view, key)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Directory for `book`, if it holds any offers
pub fn book_directory<V: ReadView + ?Sized>(
    view: &V,
    book: &Book,
) -> Result<Option<BookDirectory>> {
    view.read_entry(&LedgerKey::book(book))
}
