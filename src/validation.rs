//! Row validation and date normalization for spreadsheet cells.
//!
//! Both stages are pure: the normalizer maps ambiguous date
//! representations to canonical ISO strings, and the validator turns the
//! five positional cells of one row into a [`ReservationDraft`] or a set
//! of field-level violations.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{ReservationDraft, ReservationStatus, RESERVATION_STATUS_LABELS};

/// Serial day number of the Unix epoch (1970-01-01) in the spreadsheet
/// serial-date convention (epoch 1899-12-30).
const SERIAL_UNIX_EPOCH_DAYS: i64 = 25_569;

const SECONDS_PER_DAY: i64 = 86_400;

/// ISO calendar date format accepted after normalization.
const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Verbose locale date-time format produced by spreadsheet tooling,
/// e.g. `Wed May 01 2024 02:00:00 GMT+0200`.
const VERBOSE_GMT_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";

/// Normalize an ambiguous date cell to an ISO `YYYY-MM-DD` string.
///
/// Recognized forms:
/// - a purely-digit string is treated as a spreadsheet serial day count
///   and converted via `epoch + (serial - 25569) * 86400` seconds,
///   truncated to the UTC date component;
/// - a string containing `"GMT"` is parsed as a verbose locale date-time
///   and truncated to its UTC date component.
///
/// Anything else passes through untouched for downstream validation to
/// reject. Known limitation: a numeric-looking identifier placed in a
/// date cell is always interpreted as a serial day count.
#[must_use]
pub fn normalize_date_cell(value: &str) -> String {
    if value.is_empty() {
        return value.to_string();
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        if let Some(date) = serial_to_date(value) {
            return date.format(ISO_DATE_FORMAT).to_string();
        }
        return value.to_string();
    }

    if value.contains("GMT") {
        if let Some(date) = parse_verbose_gmt(value) {
            return date.format(ISO_DATE_FORMAT).to_string();
        }
    }

    value.to_string()
}

fn serial_to_date(value: &str) -> Option<NaiveDate> {
    let serial: i64 = value.parse().ok()?;
    let seconds = serial.checked_sub(SERIAL_UNIX_EPOCH_DAYS)?.checked_mul(SECONDS_PER_DAY)?;
    DateTime::<Utc>::from_timestamp(seconds, 0).map(|dt| dt.date_naive())
}

fn parse_verbose_gmt(value: &str) -> Option<NaiveDate> {
    // Drop a trailing timezone name like " (Central European Summer Time)".
    let core = match value.find(" (") {
        Some(idx) => &value[..idx],
        None => value,
    };
    DateTime::parse_from_str(core.trim(), VERBOSE_GMT_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

// ---------------------------------------------------------------------------
// Row validation
// ---------------------------------------------------------------------------

/// The closed set of spreadsheet fields, in sheet column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationField {
    ReservationId,
    GuestName,
    Status,
    CheckInDate,
    CheckOutDate,
}

impl ReservationField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationField::ReservationId => "reservation_id",
            ReservationField::GuestName => "guest_name",
            ReservationField::Status => "status",
            ReservationField::CheckInDate => "check_in_date",
            ReservationField::CheckOutDate => "check_out_date",
        }
    }

    /// Static corrective hint for a violated field.
    #[must_use]
    pub fn suggestion(self) -> &'static str {
        match self {
            ReservationField::ReservationId => {
                "Provide a valid reservation ID (non-empty string)"
            }
            ReservationField::GuestName => "Provide a valid guest name (non-empty string)",
            ReservationField::Status => {
                "Status must be one of: PENDING, CANCELLED, COMPLETED"
            }
            ReservationField::CheckInDate | ReservationField::CheckOutDate => {
                "Use YYYY-MM-DD date format or a valid spreadsheet serial date"
            }
        }
    }
}

/// One violated field with its failed constraints.
#[derive(Debug, Clone)]
pub struct FieldViolation {
    pub field: ReservationField,
    pub constraints: Vec<String>,
}

impl FieldViolation {
    fn new(field: ReservationField, constraint: impl Into<String>) -> Self {
        Self {
            field,
            constraints: vec![constraint.into()],
        }
    }
}

/// Raw cell values for one spreadsheet row, in sheet column order.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    /// 1-based sheet row number (header = 1, first data row = 2).
    pub line_number: u32,
    pub reservation_id: String,
    pub guest_name: String,
    pub status: String,
    pub check_in_date: String,
    pub check_out_date: String,
}

impl RawRow {
    /// A row is empty when all five cells are absent or blank. Empty rows
    /// are silently skipped before validation runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reservation_id.trim().is_empty()
            && self.guest_name.trim().is_empty()
            && self.status.trim().is_empty()
            && self.check_in_date.trim().is_empty()
            && self.check_out_date.trim().is_empty()
    }
}

/// Validate one row after date normalization.
///
/// All five fields are checked independently, so a single row can report
/// multiple violations.
pub fn validate_row(row: &RawRow) -> Result<ReservationDraft, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    if row.reservation_id.is_empty() {
        violations.push(FieldViolation::new(
            ReservationField::ReservationId,
            "must be a non-empty string",
        ));
    }

    if row.guest_name.is_empty() {
        violations.push(FieldViolation::new(
            ReservationField::GuestName,
            "must be a non-empty string",
        ));
    }

    let status = match row.status.parse::<ReservationStatus>() {
        Ok(status) => Some(status),
        Err(_) => {
            violations.push(FieldViolation::new(
                ReservationField::Status,
                format!(
                    "must be one of: {}",
                    RESERVATION_STATUS_LABELS.join(", ")
                ),
            ));
            None
        }
    };

    let check_in = validate_date_field(
        &row.check_in_date,
        ReservationField::CheckInDate,
        &mut violations,
    );
    let check_out = validate_date_field(
        &row.check_out_date,
        ReservationField::CheckOutDate,
        &mut violations,
    );

    match (status, check_in, check_out) {
        (Some(status), Some(check_in), Some(check_out)) if violations.is_empty() => {
            Ok(ReservationDraft {
                reservation_id: row.reservation_id.clone(),
                guest_name: row.guest_name.clone(),
                status,
                check_in_date: check_in,
                check_out_date: check_out,
            })
        }
        _ => Err(violations),
    }
}

fn validate_date_field(
    raw: &str,
    field: ReservationField,
    violations: &mut Vec<FieldViolation>,
) -> Option<NaiveDate> {
    let normalized = normalize_date_cell(raw);
    match NaiveDate::parse_from_str(&normalized, ISO_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            violations.push(FieldViolation::new(
                field,
                "must be a valid ISO 8601 calendar date",
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_row() -> RawRow {
        RawRow {
            line_number: 2,
            reservation_id: "RES123".to_string(),
            guest_name: "Jan Nowak".to_string(),
            status: "PENDING".to_string(),
            check_in_date: "2024-05-01".to_string(),
            check_out_date: "2024-05-07".to_string(),
        }
    }

    #[test]
    fn test_normalize_serial_date() {
        assert_eq!(normalize_date_cell("45413"), "2024-05-01");
        assert_eq!(normalize_date_cell("45419"), "2024-05-07");
    }

    #[test]
    fn test_normalize_verbose_gmt_date() {
        assert_eq!(
            normalize_date_cell(
                "Wed May 01 2024 02:00:00 GMT+0200 (Central European Summer Time)"
            ),
            "2024-05-01"
        );
        assert_eq!(
            normalize_date_cell("Tue May 07 2024 02:00:00 GMT+0200"),
            "2024-05-07"
        );
    }

    #[test]
    fn test_normalize_iso_passthrough() {
        assert_eq!(normalize_date_cell("2024-05-01"), "2024-05-01");
    }

    #[test]
    fn test_normalize_garbage_passthrough() {
        assert_eq!(normalize_date_cell("not-a-date"), "not-a-date");
        assert_eq!(normalize_date_cell(""), "");
        // Unparseable GMT strings fall through to validation.
        assert_eq!(normalize_date_cell("GMT nonsense"), "GMT nonsense");
    }

    #[test]
    fn test_normalize_numeric_identifier_limitation() {
        // A purely-digit value in a date cell is always treated as a
        // serial day count, even when it was meant as an identifier.
        assert_ne!(normalize_date_cell("12345"), "12345");
    }

    #[test]
    fn test_validate_valid_row() {
        let draft = validate_row(&valid_row()).unwrap();
        assert_eq!(draft.reservation_id, "RES123");
        assert_eq!(draft.status, ReservationStatus::Pending);
        assert_eq!(
            draft.check_in_date,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
    }

    #[test]
    fn test_validate_row_with_serial_dates() {
        let mut row = valid_row();
        row.check_in_date = "45413".to_string();
        row.check_out_date = "45419".to_string();
        let draft = validate_row(&row).unwrap();
        assert_eq!(
            draft.check_in_date,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert_eq!(
            draft.check_out_date,
            NaiveDate::from_ymd_opt(2024, 5, 7).unwrap()
        );
    }

    #[test]
    fn test_validate_collects_all_violations() {
        let row = RawRow {
            line_number: 2,
            reservation_id: String::new(),
            guest_name: String::new(),
            status: "INVALID_STATUS".to_string(),
            check_in_date: "invalid-date".to_string(),
            check_out_date: "invalid-date".to_string(),
        };
        let violations = validate_row(&row).unwrap_err();
        assert_eq!(violations.len(), 5);
    }

    #[test]
    fn test_validate_single_violation() {
        let mut row = valid_row();
        row.guest_name = String::new();
        let violations = validate_row(&row).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, ReservationField::GuestName);
    }

    #[test]
    fn test_empty_row_detection() {
        let row = RawRow {
            line_number: 4,
            reservation_id: "  ".to_string(),
            ..RawRow::default()
        };
        assert!(row.is_empty());
        assert!(!valid_row().is_empty());
    }

    #[test]
    fn test_suggestions_are_field_specific() {
        assert!(ReservationField::Status.suggestion().contains("PENDING"));
        assert!(ReservationField::CheckInDate
            .suggestion()
            .contains("YYYY-MM-DD"));
    }
}
