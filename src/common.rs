//! Small shared helpers.

use chrono::Local;

use crate::errors::ServiceError;

/// Today's date in the `YYYYMMDD` integer form the tables use.
pub fn today_yyyymmdd() -> u32 {
    Local::now()
        .format("%Y%m%d")
        .to_string()
        .parse()
        .expect("formatted date is numeric")
}

/// Wall-clock timestamp in the format order rows carry.
pub fn now_time_string() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Validate a `YYYYMMDD` date integer.
pub fn validate_date(date: u32) -> Result<(), ServiceError> {
    let s = date.to_string();
    if s.len() != 8 {
        return Err(ServiceError::ValidationError(format!(
            "Invalid date format. Must be YYYYMMDD format. (Input: {})",
            date
        )));
    }
    let month = (date / 100) % 100;
    let day = date % 100;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(ServiceError::ValidationError(format!(
            "Invalid date format. Must be YYYYMMDD format. (Input: {})",
            date
        )));
    }
    Ok(())
}

/// `20250115` -> `2025년 01월 15일`, the display form the dashboard uses.
pub fn display_date(date: u32) -> String {
    format!(
        "{:04}년 {:02}월 {:02}일",
        date / 10000,
        (date / 100) % 100,
        date % 100
    )
}

/// `20250115` -> `2025.01.15`.
pub fn dotted_date(date: u32) -> String {
    format!(
        "{:04}.{:02}.{:02}",
        date / 10000,
        (date / 100) % 100,
        date % 100
    )
}

/// `20250115` -> `01.15`, used on receipt line rows.
pub fn short_dotted_date(date: u32) -> String {
    format!("{:02}.{:02}", (date / 100) % 100, date % 100)
}
