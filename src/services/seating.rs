//! Seat allocation checks: grid bounds here, seat uniqueness in the store.

use crate::error::BookingError;
use crate::models::reservation::{Ticket, TicketExtent};
use crate::models::{DbId, Dome};

/// Dimension of the dome grid a ticket coordinate is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Seat,
}

impl Axis {
    pub fn field(self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Seat => "seat",
        }
    }

    pub fn limit_name(self) -> &'static str {
        match self {
            Axis::Row => "rows",
            Axis::Seat => "seats_in_row",
        }
    }

    pub fn limit(self, dome: &Dome) -> i32 {
        match self {
            Axis::Row => dome.rows,
            Axis::Seat => dome.seats_in_row,
        }
    }
}

/// Fails with [`BookingError::Range`] unless `1 <= value <= limit`.
pub fn check_bounds(axis: Axis, value: i32, limit: i32) -> Result<(), BookingError> {
    if (1..=limit).contains(&value) {
        Ok(())
    } else {
        Err(BookingError::Range {
            field: axis.field(),
            value,
            limit_name: axis.limit_name(),
            max: limit,
        })
    }
}

/// Checks the row first, then the seat.
pub fn validate_seat(row: i32, seat: i32, dome: &Dome) -> Result<(), BookingError> {
    check_bounds(Axis::Row, row, Axis::Row.limit(dome))?;
    check_bounds(Axis::Seat, seat, Axis::Seat.limit(dome))
}

/// Maps a failed ticket insert to a seat conflict when the seat constraint fired.
pub fn seat_conflict(err: sqlx::Error, session_id: DbId, row: i32, seat: i32) -> BookingError {
    BookingError::on_unique(err, Ticket::SEAT_CONSTRAINT, || {
        format!("Seat {seat} in row {row} is already taken for show session {session_id}")
    })
}

/// Fails with a conflict when `dome` cannot hold the tickets already issued
/// for `session_id`.
pub fn ensure_dome_fits(session_id: DbId, extent: &TicketExtent, dome: &Dome) -> Result<(), BookingError> {
    let fits = extent.max_row.unwrap_or(0) <= dome.rows
        && extent.max_seat.unwrap_or(0) <= dome.seats_in_row
        && extent.issued <= dome.capacity();
    if fits {
        Ok(())
    } else {
        Err(BookingError::Conflict(format!(
            "Show session {session_id} has {} tickets that do not fit in dome {} ({} rows, {} seats per row)",
            extent.issued, dome.name, dome.rows, dome.seats_in_row
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dome(rows: i32, seats_in_row: i32) -> Dome {
        Dome {
            id: 1,
            name: "Test_dome".into(),
            rows,
            seats_in_row,
        }
    }

    #[test]
    fn sold_seats_must_fit_the_new_dome() {
        let sold = TicketExtent {
            issued: 5,
            max_row: Some(10),
            max_seat: Some(5),
        };
        assert!(ensure_dome_fits(1, &sold, &dome(10, 10)).is_ok());
        assert!(ensure_dome_fits(1, &sold, &dome(10, 5)).is_ok());
        assert!(matches!(
            ensure_dome_fits(1, &sold, &dome(2, 2)),
            Err(BookingError::Conflict(_))
        ));
        assert!(ensure_dome_fits(1, &sold, &dome(9, 10)).is_err());
        assert!(ensure_dome_fits(1, &TicketExtent::default(), &dome(1, 1)).is_ok());
    }

    #[test]
    fn corners_of_the_grid_are_valid() {
        let dome = dome(10, 12);
        assert!(validate_seat(1, 1, &dome).is_ok());
        assert!(validate_seat(10, 12, &dome).is_ok());
    }

    #[test]
    fn row_is_reported_before_seat() {
        let err = validate_seat(0, 99, &dome(10, 10)).unwrap_err();
        match err {
            BookingError::Range { field, value, limit_name, max } => {
                assert_eq!((field, value, limit_name, max), ("row", 0, "rows", 10));
            }
            other => panic!("expected range error, got {other:?}"),
        }
    }

    #[test]
    fn seat_error_names_seats_in_row() {
        let err = validate_seat(3, 11, &dome(10, 10)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "seat number must be in available range: (1, seats_in_row): (1, 10)"
        );
    }

    #[test]
    fn non_database_errors_are_not_seat_conflicts() {
        let err = seat_conflict(sqlx::Error::RowNotFound, 1, 1, 1);
        assert!(matches!(err, BookingError::Database(_)));
    }

    proptest! {
        #[test]
        fn bounds_accept_exactly_the_grid(value in -50i32..50, limit in 1i32..40) {
            let accepted = check_bounds(Axis::Seat, value, limit).is_ok();
            prop_assert_eq!(accepted, value >= 1 && value <= limit);
        }
    }
}
