//! Схема зала и построение сетки мест.
//!
//! Сетка - чистая функция от двух множеств: занятые места и выбор пользователя.
//! Она строится заново при каждом клике и после каждого опроса доступности.

use std::collections::HashSet;

use crate::models::{Seat, SeatId, SeatStatus};

/// Физическая схема зала: ряды, места в ряду и проходы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatLayout {
    pub rows: Vec<char>,
    pub seats_per_row: u8,
    /// Позиции проходов - в этих местах кресел нет.
    pub aisles: Vec<u8>,
}

impl Default for SeatLayout {
    fn default() -> Self {
        Self {
            rows: ('A'..='H').collect(),
            seats_per_row: 12,
            aisles: vec![4, 9],
        }
    }
}

impl SeatLayout {
    pub fn capacity(&self) -> usize {
        self.rows.len() * self.numbers().count()
    }

    fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=self.seats_per_row).filter(|n| !self.aisles.contains(n))
    }

    /// Все места зала в порядке "ряд за рядом".
    pub fn seat_ids(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.rows
            .iter()
            .flat_map(move |&row| self.numbers().map(move |n| SeatId::new(row, n)))
    }
}

/// Строит сетку: занятое место - `unavailable`, выбранное - `selected`,
/// остальные - `available`. Занятость важнее выбора.
pub fn build_grid<'a>(
    layout: &SeatLayout,
    booked: &HashSet<SeatId>,
    selected: impl IntoIterator<Item = &'a SeatId>,
) -> Vec<Seat> {
    let selected: HashSet<&SeatId> = selected.into_iter().collect();

    layout
        .rows
        .iter()
        .flat_map(|&row| layout.numbers().map(move |number| (row, number)))
        .map(|(row, number)| {
            let id = SeatId::new(row, number);
            let status = if booked.contains(&id) {
                SeatStatus::Unavailable
            } else if selected.contains(&id) {
                SeatStatus::Selected
            } else {
                SeatStatus::Available
            };
            Seat { id, row, number, status }
        })
        .collect()
}
