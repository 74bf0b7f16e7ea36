//! Text rendering of schedules. Only a sample of months is printed: by
//! default the first month of every fifth year.

use crate::error::LoanError;
use crate::loan::{LoanTerms, Method, Schedule, ScheduleEntry, ScheduleSummary};

pub const DEFAULT_REPORT_INTERVAL: u32 = 60;

pub fn header(terms: &LoanTerms) -> String {
    format!(
        "principal: {}, term: {} years, rate: {:.3}%",
        terms.principal(),
        terms.term_years(),
        100. * terms.annual_rate()
    )
}

pub fn banner(method: Method) -> String {
    format!(">>>>>>>>>> {} <<<<<<<<<<", method)
}

pub fn check_interval(interval: u32) -> Result<u32, LoanError> {
    if interval == 0 {
        Err(LoanError::InvalidReportInterval(interval))
    } else {
        Ok(interval)
    }
}

/// Month 1, then every `interval` months after it.
pub fn is_reported(month: u32, interval: u32) -> bool {
    interval == 1 || month % interval == 1
}

pub fn entry_line(entry: &ScheduleEntry) -> String {
    let mut line = format!(
        "year {:2} month {:2}, principal: {:6}, interest: {:5}, payment: {:6}",
        entry.year(),
        entry.month_of_year(),
        entry.principal,
        entry.interest,
        entry.payment
    );
    if let Some(date) = entry.due_date {
        line.push_str(&format!(", due: {}", date));
    }
    line
}

pub fn summary_lines(summary: &ScheduleSummary) -> [String; 3] {
    [
        format!("total paid:     {}", summary.total_paid),
        format!("total interest: {}", summary.total_interest),
        format!("interest ratio: {:.2}%", summary.interest_ratio()),
    ]
}

pub fn render(schedule: &Schedule, interval: u32) -> Vec<String> {
    let mut lines = vec![banner(schedule.method)];
    lines.extend(
        schedule
            .entries()
            .iter()
            .filter(|e| is_reported(e.month, interval))
            .map(entry_line),
    );
    lines.extend(summary_lines(schedule.summary()));
    lines
}
