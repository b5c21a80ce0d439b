//! Reservation transaction: one reservation and all of its tickets, or nothing.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};

use super::seating;
use crate::error::{BookingError, BookingResult};
use crate::models::reservation::ReservationHeadline;
use crate::models::speaker::SpeakerSummary;
use crate::models::{DbId, Dome, Reservation, Speaker, Ticket};
use crate::pagination::{Page, Paginated};

/// One requested seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TicketRequest {
    pub show_session: DbId,
    pub row: i32,
    pub seat: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationRequest {
    pub tickets: Vec<TicketRequest>,
}

/// A committed reservation with the tickets it owns.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationReceipt {
    pub id: DbId,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TakenPlace {
    pub row: i32,
    pub seat: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationListItem {
    pub id: DbId,
    pub astronomy_show_title: Option<String>,
    pub taken_places: Vec<TakenPlace>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationDetail {
    pub id: DbId,
    pub astronomy_show_title: Option<String>,
    pub show_session_date: Option<NaiveDate>,
    pub show_session_time_start: Option<NaiveTime>,
    pub taken_places: Vec<TakenPlace>,
    pub show_session_speakers: Vec<SpeakerSummary>,
    pub created_at: DateTime<Utc>,
}

/// Creates a reservation owning every requested ticket.
///
/// Every ticket is bounds-checked against its session's dome before anything
/// is written; the sessions stay share-locked until commit. The seat constraint then rejects seats taken by anyone, this
/// request included. The first failure drops the transaction, so no
/// reservation or ticket from this call survives it.
pub async fn create(
    pool: &PgPool,
    user_id: Option<DbId>,
    tickets: &[TicketRequest],
) -> BookingResult<ReservationReceipt> {
    if tickets.is_empty() {
        return Err(BookingError::Validation(
            "A reservation must contain at least one ticket".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let mut domes: HashMap<DbId, Dome> = HashMap::new();
    for request in tickets {
        let dome = match domes.entry(request.show_session) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let dome = Dome::lock_for_session(&mut tx, request.show_session)
                    .await?
                    .ok_or(BookingError::NotFound {
                        entity: "Show session",
                        id: request.show_session,
                    })?;
                entry.insert(dome)
            }
        };
        seating::validate_seat(request.row, request.seat, dome)?;
    }

    let reservation = Reservation::insert(&mut *tx, user_id).await?;
    let mut issued = Vec::with_capacity(tickets.len());
    for request in tickets {
        let ticket = Ticket::insert(
            &mut *tx,
            reservation.id,
            request.show_session,
            request.row,
            request.seat,
        )
        .await
        .map_err(|err| {
            let err = seating::seat_conflict(err, request.show_session, request.row, request.seat);
            if let BookingError::Conflict(reason) = &err {
                warn!(session_id = request.show_session, row = request.row, seat = request.seat, %reason, "seat conflict, rolling back reservation");
            }
            err
        })?;
        issued.push(ticket);
    }

    tx.commit().await?;
    info!(
        reservation_id = reservation.id,
        user_id,
        tickets = issued.len(),
        "reservation created"
    );

    Ok(ReservationReceipt {
        id: reservation.id,
        created_at: reservation.created_at,
        tickets: issued,
    })
}

pub async fn list_for_user(
    pool: &PgPool,
    user_id: DbId,
    show_title: Option<&str>,
    page: Page,
) -> BookingResult<Paginated<ReservationListItem>> {
    let mut conn = pool.acquire().await?;
    let (headlines, count) = Reservation::list_for_user(&mut conn, user_id, show_title, page).await?;

    let ids: Vec<DbId> = headlines.iter().map(|headline| headline.id).collect();
    let mut places = taken_places(Ticket::for_reservations(&mut *conn, &ids).await?);

    let results = headlines
        .into_iter()
        .map(|headline| ReservationListItem {
            id: headline.id,
            taken_places: places.remove(&headline.id).unwrap_or_default(),
            astronomy_show_title: headline.astronomy_show_title,
        })
        .collect();

    Ok(Paginated::new(page, count, results))
}

pub async fn detail_for_user(
    pool: &PgPool,
    id: DbId,
    user_id: DbId,
) -> BookingResult<ReservationDetail> {
    let ReservationHeadline {
        id,
        created_at,
        show_session_id,
        astronomy_show_title,
        show_day,
        time_start,
    } = Reservation::find_headline(pool, id, user_id)
        .await?
        .ok_or(BookingError::NotFound {
            entity: "Reservation",
            id,
        })?;

    let mut places = taken_places(Ticket::for_reservations(pool, &[id]).await?);
    let speakers = match show_session_id {
        Some(session_id) => Speaker::for_sessions(pool, &[session_id])
            .await?
            .iter()
            .map(|(_, speaker)| speaker.summary())
            .collect(),
        None => Vec::new(),
    };

    Ok(ReservationDetail {
        id,
        astronomy_show_title,
        show_session_date: show_day,
        show_session_time_start: time_start,
        taken_places: places.remove(&id).unwrap_or_default(),
        show_session_speakers: speakers,
        created_at,
    })
}

fn taken_places(tickets: Vec<Ticket>) -> HashMap<DbId, Vec<TakenPlace>> {
    let mut places: HashMap<DbId, Vec<TakenPlace>> = HashMap::new();
    for ticket in tickets {
        places.entry(ticket.reservation_id).or_default().push(TakenPlace {
            row: ticket.row,
            seat: ticket.seat,
        });
    }
    places
}
