//! Path compilation
//!
//! A path is the list of hops a payment may take between source and
//! destination. Account elements ripple through trust lines; issue elements
//! convert through the order book into that issue. The compiler normalizes
//! each path into a [`Strand`]:
//!
//! - native value enters and leaves through endpoint steps
//! - issued value is redeemed to its issuer before entering a book
//! - a final book converts into the delivered issue when the path stops short
//! - the delivered issue flows from its issuer to the destination

use crate::{
    ripple_calc::PaymentRequest,
    step::{BookStep, DirectStep, EndpointSide, Step, XrpEndpointStep},
    strand::Strand,
    types::Ter,
    Error, Result,
};
use ledger_core::{ops, AccountId, Book, Issue, ReadView};
use serde::{Deserialize, Serialize};

/// One hop of a payment path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathElement {
    /// Ripple through this account
    Account(AccountId),
    /// Convert into this issue through its order book
    Issue(Issue),
}

/// Ordered hops between source and destination
pub type Path = Vec<PathElement>;

/// Turns a payment request into executable strands
pub trait StrandBuilder {
    /// Strands for `request`, deduplicated, in declaration order. An empty
    /// list comes with the code explaining why.
    fn to_strands(&self, view: &dyn ReadView, request: &PaymentRequest) -> (Vec<Strand>, Ter);
}

/// Default [`StrandBuilder`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PathCompiler;

/// Walk state while compiling a path
struct Cursor {
    steps: Vec<Step>,
    /// Issue currently carried
    issue: Issue,
    /// Account currently holding it
    holder: AccountId,
    /// Strand source; its own offers are never crossed
    src: AccountId,
}

impl Cursor {
    fn new(src: AccountId, issue: Issue) -> Self {
        let mut steps = Vec::new();
        if issue.is_xrp() {
            steps.push(XrpEndpointStep::new(src, EndpointSide::Source).into());
        }
        Self {
            steps,
            issue,
            holder: src,
            src,
        }
    }

    fn ripple_to(&mut self, account: AccountId) -> Result<()> {
        if self.issue.is_xrp() {
            return Err(Error::Strand(format!(
                "native value cannot ripple through {}",
                account
            )));
        }
        if account != self.holder {
            self.steps
                .push(DirectStep::new(self.holder, account, self.issue).into());
            self.holder = account;
        }
        Ok(())
    }

    fn convert_to(&mut self, issue: Issue) -> Result<()> {
        if issue == self.issue {
            return Ok(());
        }
        if !self.issue.is_xrp() {
            self.ripple_to(self.issue.account)?;
        }
        self.steps
            .push(BookStep::new(Book::new(self.issue, issue), self.src).into());
        self.issue = issue;
        self.holder = issue.account;
        Ok(())
    }

    fn deliver(mut self, dst: AccountId, issue: Issue) -> Result<Strand> {
        self.convert_to(issue)?;
        if issue.is_xrp() {
            self.steps
                .push(XrpEndpointStep::new(dst, EndpointSide::Destination).into());
        } else {
            if self.holder != dst {
                self.ripple_to(issue.account)?;
            }
            self.ripple_to(dst)?;
        }
        Strand::new(self.steps)
    }
}

impl PathCompiler {
    /// Compile one path from `src` paying in `send_issue` to `dst`
    /// receiving `deliver`
    pub fn compile(
        &self,
        src: AccountId,
        dst: AccountId,
        send_issue: Issue,
        deliver: Issue,
        path: &[PathElement],
    ) -> Result<Strand> {
        let mut cursor = Cursor::new(src, send_issue);
        for element in path {
            match element {
                PathElement::Account(account) => cursor.ripple_to(*account)?,
                PathElement::Issue(issue) => cursor.convert_to(*issue)?,
            }
        }
        cursor.deliver(dst, deliver)
    }

    /// Strand an offer crossing runs on: `taker` pays `gets` through the
    /// `gets -> pays` book and receives `pays`
    pub fn crossing_strand(&self, taker: AccountId, gets: Issue, pays: Issue) -> Result<Strand> {
        if gets == pays {
            return Err(Error::Strand(format!("offer trades {} for itself", gets)));
        }
        self.compile(taker, taker, gets, pays, &[])
    }
}

impl StrandBuilder for PathCompiler {
    fn to_strands(&self, view: &dyn ReadView, request: &PaymentRequest) -> (Vec<Strand>, Ter) {
        if let Err(e) = ops::account_root(view, &request.src) {
            tracing::debug!(src = %request.src, error = %e, "Payment source missing");
            return (Vec::new(), Ter::NoAccount);
        }

        let send_issue = request
            .src_amount_max
            .map_or_else(|| request.dst_amount.issue(), |max| max.issue());
        let deliver = request.dst_amount.issue();

        let default_path: &[PathElement] = &[];
        let mut candidates: Vec<&[PathElement]> = Vec::with_capacity(request.paths.len() + 1);
        if request.add_default_path || request.paths.is_empty() {
            candidates.push(default_path);
        }
        candidates.extend(request.paths.iter().map(Vec::as_slice));

        let mut strands: Vec<Strand> = Vec::with_capacity(candidates.len());
        let mut failure = Ter::PathDry;
        for (index, path) in candidates.into_iter().enumerate() {
            match self.compile(request.src, request.dst, send_issue, deliver, path) {
                Ok(strand) if strands.contains(&strand) => {
                    tracing::trace!(path = index, "Duplicate strand dropped");
                }
                Ok(strand) => strands.push(strand),
                Err(e) => {
                    tracing::debug!(path = index, error = %e, "Path skipped");
                    failure = match e {
                        Error::Strand(_) => Ter::PathDry,
                        other => other.ter(),
                    };
                }
            }
        }

        if strands.is_empty() {
            (strands, failure)
        } else {
            (strands, Ter::Success)
        }
    }
}
