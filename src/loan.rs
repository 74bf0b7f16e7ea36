use crate::error::LoanError;
use chrono::{Months, NaiveDate};
use log::{debug, trace};
use std::fmt;

/// Longest term accepted by `LoanTerms::new`, in years.
pub const MAX_TERM_YEARS: u32 = 100;

const MONTHS_PER_YEAR: u32 = 12;

// headroom for the balance, its interest and the summary totals
const MAX_BALANCE: f64 = (i64::MAX / 4) as f64;

/// Validated inputs shared by both repayment methods.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LoanTerms {
    principal: i64,
    term_years: u32,
    annual_rate: f64,
}

impl LoanTerms {
    /// `annual_rate` is a fraction, i.e. 0.00525 for 0.525%.
    pub fn new(principal: i64, term_years: i64, annual_rate: f64) -> Result<Self, LoanError> {
        if principal <= 0 {
            return Err(LoanError::InvalidPrincipal(principal));
        }
        let term_years = u32::try_from(term_years)
            .ok()
            .filter(|years| (1..=MAX_TERM_YEARS).contains(years))
            .ok_or(LoanError::InvalidTerm(term_years))?;
        if !annual_rate.is_finite() || annual_rate < 0. {
            return Err(LoanError::InvalidRate(annual_rate));
        }

        let terms = Self {
            principal,
            term_years,
            annual_rate,
        };
        // truncation drift compounds with the balance, so bound both by the
        // compound factor before any month is simulated
        let r = terms.monthly_rate();
        let n = terms.pmt_count();
        let worst_balance =
            (principal as f64 + 2. * f64::from(n)) * compound_factor(r, n) * (1. + r);
        if !(worst_balance < MAX_BALANCE) {
            return Err(LoanError::OutOfRange {
                principal,
                term_years,
                annual_rate,
            });
        }

        Ok(terms)
    }

    /// Same as `new`, with the rate given as a percentage (0.525 for 0.525%).
    pub fn from_percent(
        principal: i64,
        term_years: i64,
        rate_percent: f64,
    ) -> Result<Self, LoanError> {
        Self::new(principal, term_years, rate_percent / 100.)
    }

    pub fn principal(&self) -> i64 {
        self.principal
    }

    pub fn term_years(&self) -> u32 {
        self.term_years
    }

    pub fn annual_rate(&self) -> f64 {
        self.annual_rate
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / f64::from(MONTHS_PER_YEAR)
    }

    pub fn pmt_count(&self) -> u32 {
        self.term_years * MONTHS_PER_YEAR
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Method {
    /// Constant total payment; the interest share shrinks over time.
    EqualPayment,
    /// Constant principal portion; the total payment shrinks over time.
    EqualPrincipal,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::EqualPayment => write!(f, "equal payment"),
            Method::EqualPrincipal => write!(f, "equal principal"),
        }
    }
}

/// How the last month treats the balance left over by integer truncation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Settlement {
    /// Every month uses the truncated level amount; leftovers are dropped.
    #[default]
    Truncate,
    /// The final month pays off whatever balance remains.
    FinalPayment,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ScheduleOptions {
    pub settlement: Settlement,
    pub first_pmt_date: Option<NaiveDate>,
}

impl ScheduleOptions {
    fn due_date(&self, month: u32) -> Result<Option<NaiveDate>, LoanError> {
        self.first_pmt_date
            .map(|first| get_pmt_date(&first, month))
            .transpose()
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScheduleEntry {
    pub month: u32,
    pub principal: i64,
    pub interest: i64,
    pub payment: i64,
    pub end_balance: i64,
    pub due_date: Option<NaiveDate>,
}

impl ScheduleEntry {
    /// 1-based loan year this payment falls in.
    pub fn year(&self) -> u32 {
        self.month.saturating_sub(1) / MONTHS_PER_YEAR + 1
    }

    /// 1-based month within `year()`.
    pub fn month_of_year(&self) -> u32 {
        self.month.saturating_sub(1) % MONTHS_PER_YEAR + 1
    }
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pmt number {}, principal {}, interest {}, payment {}, ending balance {}",
            self.month, self.principal, self.interest, self.payment, self.end_balance
        )?;
        if let Some(date) = self.due_date {
            write!(f, ", due {}", date)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScheduleSummary {
    pub total_paid: i64,
    pub total_interest: i64,
}

impl ScheduleSummary {
    fn from_entries(entries: &[ScheduleEntry]) -> Self {
        Self {
            total_paid: entries.iter().map(|e| e.payment).sum(),
            total_interest: entries.iter().map(|e| e.interest).sum(),
        }
    }

    /// Interest as a percentage of everything paid.
    pub fn interest_ratio(&self) -> f64 {
        if self.total_paid == 0 {
            0.
        } else {
            100. * self.total_interest as f64 / self.total_paid as f64
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Schedule {
    pub method: Method,
    pub terms: LoanTerms,
    pmt_amount: i64,
    entries: Vec<ScheduleEntry>,
    summary: ScheduleSummary,
}

impl Schedule {
    pub fn new(
        method: Method,
        terms: &LoanTerms,
        options: &ScheduleOptions,
    ) -> Result<Self, LoanError> {
        match method {
            Method::EqualPayment => equal_payment_schedule(terms, options),
            Method::EqualPrincipal => equal_principal_schedule(terms, options),
        }
    }

    /// The level monthly amount: the total payment for `EqualPayment`,
    /// the principal portion for `EqualPrincipal`.
    pub fn get_pmt_amount(&self) -> i64 {
        self.pmt_amount
    }

    pub fn get_pmt_count(&self) -> usize {
        self.entries.len()
    }

    pub fn get_pmt_detail(&self, month: u32) -> Option<&ScheduleEntry> {
        let idx = usize::try_from(month).ok()?.checked_sub(1)?;
        self.entries.get(idx)
    }

    pub fn get_pmt_info(&self, month: u32) -> String {
        match self.get_pmt_detail(month) {
            Some(entry) => entry.to_string(),
            None => "No payment information.".to_string(),
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn summary(&self) -> &ScheduleSummary {
        &self.summary
    }

    /// Balance left after the last payment.
    pub fn final_balance(&self) -> i64 {
        self.entries
            .last()
            .map_or(self.terms.principal, |e| e.end_balance)
    }
}

/// Float to currency units, truncating toward zero.
pub fn truncate(amt: f64) -> i64 {
    amt.trunc() as i64
}

/// (1 + rate)^periods by repeated multiplication. Kept iterative so the
/// rounding matches the reference schedules exactly.
pub fn compound_factor(rate: f64, periods: u32) -> f64 {
    let mut factor = 1.;
    for _ in 0..periods {
        factor *= 1. + rate;
    }
    factor
}

/// Level payment that retires the principal after `pmt_count` months.
/// A zero (or vanishingly small) rate falls back to principal / months.
pub fn monthly_payment(terms: &LoanTerms) -> Result<i64, LoanError> {
    let r = terms.monthly_rate();
    let n = terms.pmt_count();
    let factor = compound_factor(r, n);

    if factor <= 1. {
        return Ok(terms.principal / i64::from(n));
    }
    let payment = terms.principal as f64 * r * factor / (factor - 1.);
    if !payment.is_finite() {
        return Err(LoanError::NonFinitePayment(payment));
    }
    Ok(truncate(payment))
}

pub fn equal_payment_schedule(
    terms: &LoanTerms,
    options: &ScheduleOptions,
) -> Result<Schedule, LoanError> {
    let r = terms.monthly_rate();
    let n = terms.pmt_count();
    let pmt_amount = monthly_payment(terms)?;
    // without interest the last month also takes principal % months
    let settle_last =
        compound_factor(r, n) <= 1. || options.settlement == Settlement::FinalPayment;
    debug!(
        "equal payment: {} months at monthly rate {}, payment {}",
        n, r, pmt_amount
    );

    let mut entries = Vec::with_capacity(n as usize);
    let mut balance = terms.principal;
    for month in 1..=n {
        let interest = truncate(balance as f64 * r);
        let payment = if month == n && settle_last {
            balance + interest
        } else {
            pmt_amount
        };
        let principal = payment - interest;
        balance -= principal;
        trace!(
            "pmt # {}, principal {}, interest {}, end bal {}",
            month,
            principal,
            interest,
            balance
        );

        entries.push(ScheduleEntry {
            month,
            principal,
            interest,
            payment,
            end_balance: balance,
            due_date: options.due_date(month)?,
        });
    }

    let summary = if settle_last {
        ScheduleSummary::from_entries(&entries)
    } else {
        let total_paid = pmt_amount * i64::from(n);
        ScheduleSummary {
            total_paid,
            total_interest: total_paid - terms.principal,
        }
    };

    Ok(Schedule {
        method: Method::EqualPayment,
        terms: *terms,
        pmt_amount,
        entries,
        summary,
    })
}

pub fn equal_principal_schedule(
    terms: &LoanTerms,
    options: &ScheduleOptions,
) -> Result<Schedule, LoanError> {
    let r = terms.monthly_rate();
    let n = terms.pmt_count();
    let pmt_amount = terms.principal / i64::from(n);
    debug!(
        "equal principal: {} months at monthly rate {}, principal {} (remainder {})",
        n,
        r,
        pmt_amount,
        terms.principal % i64::from(n)
    );

    let mut entries = Vec::with_capacity(n as usize);
    let mut balance = terms.principal;
    let mut interest_sum = 0;
    for month in 1..=n {
        let interest = truncate(balance as f64 * r);
        let principal = if month == n && options.settlement == Settlement::FinalPayment {
            balance
        } else {
            pmt_amount
        };
        interest_sum += interest;
        balance -= principal;
        trace!(
            "pmt # {}, principal {}, interest {}, end bal {}",
            month,
            principal,
            interest,
            balance
        );

        entries.push(ScheduleEntry {
            month,
            principal,
            interest,
            payment: principal + interest,
            end_balance: balance,
            due_date: options.due_date(month)?,
        });
    }

    let summary = match options.settlement {
        Settlement::Truncate => ScheduleSummary {
            total_paid: terms.principal + interest_sum,
            total_interest: interest_sum,
        },
        Settlement::FinalPayment => ScheduleSummary::from_entries(&entries),
    };

    Ok(Schedule {
        method: Method::EqualPrincipal,
        terms: *terms,
        pmt_amount,
        entries,
        summary,
    })
}

// months are counted from the first payment so a 31st stays on the 31st
// whenever the month allows it
fn get_pmt_date(&first_pmt_date: &NaiveDate, month: u32) -> Result<NaiveDate, LoanError> {
    first_pmt_date
        .checked_add_months(Months::new(month.saturating_sub(1)))
        .ok_or(LoanError::DateOverflow(first_pmt_date))
}
