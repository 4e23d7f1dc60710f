use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор места: буква ряда + номер, например `C7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SeatId(String);

impl SeatId {
    pub fn new(row: char, number: u8) -> Self {
        SeatId(format!("{}{}", row.to_ascii_uppercase(), number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SeatId {
    fn from(raw: String) -> Self {
        SeatId(raw.trim().to_ascii_uppercase())
    }
}

impl From<&str> for SeatId {
    fn from(raw: &str) -> Self {
        SeatId(raw.trim().to_ascii_uppercase())
    }
}

impl From<SeatId> for String {
    fn from(id: SeatId) -> Self {
        id.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Selected,
    /// Место уже выкуплено. Пользователь не может его выбрать.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    pub row: char,
    pub number: u8,
    pub status: SeatStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_id_is_normalized() {
        assert_eq!(SeatId::from(" c7 "), SeatId::new('C', 7));
        assert_eq!(SeatId::new('h', 12).as_str(), "H12");
    }

    #[test]
    fn seat_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&vec![SeatId::from("A1"), SeatId::from("b2")]).unwrap();
        assert_eq!(json, r#"["A1","B2"]"#);

        let status = serde_json::to_string(&SeatStatus::Unavailable).unwrap();
        assert_eq!(status, r#""unavailable""#);
    }
}
