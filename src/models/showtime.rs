use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::SeatError;
use crate::models::{LocalBookingRecord, TicketRecord};

/// Ключ сеанса: фильм, дата, время, кинотеатр и зал.
/// Две брони с одинаковым ключом относятся к одному показу.
/// Пустые поля допускаются при разборе и отклоняются в `ensure_complete`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct ShowtimeKey {
    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub movie_id: String,
    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub date: String,
    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub time: String,
    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub theater_name: String,
    #[serde(default)]
    pub screen: Option<String>,
}

// Порядок полей в сообщении об ошибке
const REQUIRED_FIELDS: [&str; 4] = ["movie_id", "date", "time", "theater_name"];

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("missing"));
    }
    Ok(())
}

impl ShowtimeKey {
    /// Проверяет, что ключ полный. Выполняется до любого сетевого запроса.
    pub fn ensure_complete(&self) -> Result<(), SeatError> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };

        let field_errors = errors.field_errors();
        let missing = REQUIRED_FIELDS
            .iter()
            .filter(|field| field_errors.contains_key(**field))
            .map(|field| field.to_string())
            .collect();

        Err(SeatError::IncompleteShowtimeKey { missing })
    }

    /// Совпадение с записью внешнего API: фильм, кинотеатр и зал.
    pub fn matches_ticket(&self, ticket: &TicketRecord) -> bool {
        ticket.movie_id == self.movie_id
            && ticket.theater_name == self.theater_name
            && ticket.screen == self.screen
    }

    /// Совпадение с записью локального журнала. Дата и время сравниваются
    /// после нормализации с обеих сторон.
    pub fn matches_local(&self, record: &LocalBookingRecord, reference_year: i32) -> bool {
        record.movie_id == self.movie_id
            && record.theater_name == self.theater_name
            && record.theater_screen == self.screen
            && normalize_date(&record.date, reference_year) == normalize_date(&self.date, reference_year)
            && normalize_time(&record.time) == normalize_time(&self.time)
    }
}

/// Приводит дату к виду `YYYY-MM-DD`.
///
/// Понимает ISO-дату, RFC 3339, `"7 Oct 2026"` и короткую форму `"7 Oct"`,
/// для которой берётся `reference_year`. Остальное возвращается как есть.
pub fn normalize_date(raw: &str, reference_year: i32) -> String {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return datetime.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%d %b %Y") {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw} {reference_year}"), "%d %b %Y") {
        return date.format("%Y-%m-%d").to_string();
    }

    raw.to_string()
}

/// Приводит время к 24-часовому виду `HH:MM` (`"7:30 PM"` -> `"19:30"`).
pub fn normalize_time(raw: &str) -> String {
    let raw = raw.trim();

    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return time.format("%H:%M").to_string();
    }
    if let Ok(time) = NaiveTime::parse_from_str(&raw.to_ascii_uppercase(), "%I:%M %p") {
        return time.format("%H:%M").to_string();
    }

    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ShowtimeKey {
        ShowtimeKey {
            movie_id: "m-42".to_string(),
            date: "16 Oct".to_string(),
            time: "7:30 PM".to_string(),
            theater_name: "PVR Forum".to_string(),
            screen: Some("Screen 2".to_string()),
        }
    }

    #[test]
    fn complete_key_passes() {
        assert!(key().ensure_complete().is_ok());
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let mut incomplete = key();
        incomplete.theater_name = String::new();
        incomplete.movie_id = "  ".to_string();

        let err = incomplete.ensure_complete().unwrap_err();
        assert_eq!(
            err,
            SeatError::IncompleteShowtimeKey {
                missing: vec!["movie_id".to_string(), "theater_name".to_string()],
            }
        );
    }

    #[test]
    fn screen_is_optional() {
        let mut no_screen = key();
        no_screen.screen = None;
        assert!(no_screen.ensure_complete().is_ok());
    }

    #[test]
    fn dates_normalize_to_iso() {
        assert_eq!(normalize_date("16 Oct", 2026), "2026-10-16");
        assert_eq!(normalize_date("7 Oct", 2026), "2026-10-07");
        assert_eq!(normalize_date("07 Oct 2025", 2026), "2025-10-07");
        assert_eq!(normalize_date("2026-10-16", 1999), "2026-10-16");
        assert_eq!(normalize_date("2026-10-16T00:00:00Z", 1999), "2026-10-16");
        assert_eq!(normalize_date(" tomorrow ", 2026), "tomorrow");
    }

    #[test]
    fn times_normalize_to_24h() {
        assert_eq!(normalize_time("7:30 PM"), "19:30");
        assert_eq!(normalize_time("12:15 AM"), "00:15");
        assert_eq!(normalize_time("12:15 PM"), "12:15");
        assert_eq!(normalize_time("9:05 am"), "09:05");
        assert_eq!(normalize_time("19:30"), "19:30");
        assert_eq!(normalize_time("9:30"), "09:30");
        assert_eq!(normalize_time("late show"), "late show");
    }

    #[test]
    fn local_match_uses_normalized_date_and_time() {
        let record = LocalBookingRecord {
            movie_id: "m-42".to_string(),
            movie_title: None,
            theater_name: "PVR Forum".to_string(),
            theater_screen: Some("Screen 2".to_string()),
            date: "2026-10-16".to_string(),
            time: "19:30".to_string(),
            selected_seats: vec![],
            booking_time: None,
        };
        assert!(key().matches_local(&record, 2026));
        assert!(!key().matches_local(&record, 2025));

        let mut other_screen = record.clone();
        other_screen.theater_screen = Some("Screen 1".to_string());
        assert!(!key().matches_local(&other_screen, 2026));
    }

    #[test]
    fn ticket_match_ignores_date_and_time() {
        let ticket = TicketRecord {
            movie_id: "m-42".to_string(),
            theater_name: "PVR Forum".to_string(),
            screen: Some("Screen 2".to_string()),
            seats: vec![],
            date: Some("2001-01-01".to_string()),
            time: None,
        };
        assert!(key().matches_ticket(&ticket));

        let mut elsewhere = ticket.clone();
        elsewhere.theater_name = "INOX".to_string();
        assert!(!key().matches_ticket(&elsewhere));
    }
}
