use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::info;

use crate::error::ValidationError;
use crate::store::LedgerStore;

pub const STORED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRecord {
    pub id: i64,
    pub date: NaiveDateTime,
    pub amount: f64,
}

/// A validated transfer that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    pub date: NaiveDateTime,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total_paid: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub transfers: Vec<TransferRecord>,
    pub total_paid: f64,
    pub remaining: f64,
}

impl LedgerSnapshot {
    pub fn new(transfers: Vec<TransferRecord>, total_due: f64) -> Self {
        let Summary {
            total_paid,
            remaining,
        } = summarize(&transfers, total_due);
        Self {
            transfers,
            total_paid,
            remaining,
        }
    }
}

/// Pins a `YYYY-MM-DD` date to midday so no timezone conversion can move it
/// to the neighbouring day.
pub fn normalize_date(date_input: &str) -> Result<NaiveDateTime, ValidationError> {
    let date = NaiveDate::parse_from_str(date_input.trim(), INPUT_DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate)?;
    let noon = NaiveTime::from_hms_opt(12, 0, 0).ok_or(ValidationError::InvalidDate)?;
    Ok(date.and_time(noon))
}

pub fn parse_amount(amount_input: &str) -> Result<f64, ValidationError> {
    amount_input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or(ValidationError::InvalidAmount)
}

pub fn validate_transfer(
    date_input: &str,
    amount_input: &str,
) -> Result<NewTransfer, ValidationError> {
    if date_input.trim().is_empty() || amount_input.trim().is_empty() {
        return Err(ValidationError::MissingField);
    }
    let amount = parse_amount(amount_input)?;
    let date = normalize_date(date_input)?;
    Ok(NewTransfer { date, amount })
}

/// Validates the raw form input and appends it to the store.
///
/// Role is not checked here: only the presentation layer decides who sees the
/// entry form.
pub fn add_transfer(
    store: &dyn LedgerStore,
    date_input: &str,
    amount_input: &str,
) -> Result<TransferRecord, ValidationError> {
    let transfer = validate_transfer(date_input, amount_input)?;
    let record = store.append(transfer)?;
    info!(id = record.id, date = %record.date, amount = record.amount, "transfer recorded");
    Ok(record)
}

/// Newest first. Equal dates fall back to the most recently inserted id.
pub fn sort_transfers(transfers: &mut [TransferRecord]) {
    transfers.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
}

pub fn summarize(transfers: &[TransferRecord], total_due: f64) -> Summary {
    let total_paid: f64 = transfers.iter().map(|transfer| transfer.amount).sum();
    Summary {
        total_paid,
        remaining: total_due - total_paid,
    }
}
