//! Show session scheduling and session views with live availability.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use super::{availability, seating};
use super::scheduling::{self, OverlapPolicy, Proposal, TimeWindow};
use crate::error::{BookingError, BookingResult};
use crate::models::session::{Session, SessionFilter, SessionListing, SessionRecord};
use crate::models::{AstronomyShow, DbId, Dome, Speaker, Ticket};
use crate::pagination::{Page, Paginated};

/// Session as submitted for creation or replacement.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInput {
    pub astronomy_show: DbId,
    pub planetarium_dome: DbId,
    #[serde(default)]
    pub show_speakers: Vec<DbId>,
    pub show_day: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
}

/// Session detail view.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: DbId,
    pub astronomy_show: String,
    pub astronomy_show_id: DbId,
    pub planetarium_dome: String,
    pub planetarium_dome_id: DbId,
    pub show_speakers: Vec<Speaker>,
    pub show_day: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub tickets_available: i64,
}

/// Validates and persists show sessions under one overlap policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    policy: OverlapPolicy,
}

impl Scheduler {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Creates a session after every check has passed, in one transaction.
    pub async fn create(&self, pool: &PgPool, input: &SessionInput) -> BookingResult<SessionView> {
        let window = TimeWindow::new(input.time_start, input.time_end)?;
        let mut tx = pool.begin().await?;

        ensure_references(&mut tx, input).await?;
        scheduling::ensure_speakers_available(
            &mut tx,
            self.policy,
            &Proposal {
                speaker_ids: &input.show_speakers,
                day: input.show_day,
                window,
                exclude: None,
            },
        )
        .await?;

        let session = Session::insert(&mut *tx, &record(input)).await?;
        Session::set_speakers(&mut tx, session.id, &dedup(&input.show_speakers)).await?;
        tx.commit().await?;

        info!(session_id = session.id, day = %session.show_day, window = %window, "show session scheduled");
        detail(pool, session.id).await
    }

    /// Replaces a session, ignoring its own current slot in the overlap check.
    ///
    /// Moving to another dome is refused while sold tickets would fall outside it.
    pub async fn update(
        &self,
        pool: &PgPool,
        id: DbId,
        input: &SessionInput,
    ) -> BookingResult<SessionView> {
        let window = TimeWindow::new(input.time_start, input.time_end)?;
        let mut tx = pool.begin().await?;

        let current = Session::lock(&mut tx, id)
            .await?
            .ok_or(BookingError::NotFound {
                entity: "Show session",
                id,
            })?;
        let dome = ensure_references(&mut tx, input).await?;
        if dome.id != current.planetarium_dome_id {
            let extent = Ticket::extent_for_session(&mut *tx, id).await?;
            seating::ensure_dome_fits(id, &extent, &dome)?;
        }
        scheduling::ensure_speakers_available(
            &mut tx,
            self.policy,
            &Proposal {
                speaker_ids: &input.show_speakers,
                day: input.show_day,
                window,
                exclude: Some(id),
            },
        )
        .await?;

        Session::update(&mut *tx, id, &record(input))
            .await?
            .ok_or(BookingError::NotFound {
                entity: "Show session",
                id,
            })?;
        Session::set_speakers(&mut tx, id, &dedup(&input.show_speakers)).await?;
        tx.commit().await?;

        info!(session_id = id, day = %input.show_day, window = %window, "show session rescheduled");
        detail(pool, id).await
    }
}

pub async fn detail(pool: &PgPool, id: DbId) -> BookingResult<SessionView> {
    let listing = Session::find_listing(pool, id)
        .await?
        .ok_or(BookingError::NotFound {
            entity: "Show session",
            id,
        })?;
    let speakers = Speaker::for_sessions(pool, &[id])
        .await?
        .into_iter()
        .map(|(_, speaker)| speaker)
        .collect();

    Ok(into_view(listing, speakers))
}

pub async fn list(
    pool: &PgPool,
    filter: &SessionFilter,
    page: Page,
) -> BookingResult<Paginated<SessionView>> {
    let mut conn = pool.acquire().await?;
    let (listings, count) = Session::list(&mut conn, filter, page).await?;

    let ids: Vec<DbId> = listings.iter().map(|listing| listing.id).collect();
    let mut speakers: HashMap<DbId, Vec<Speaker>> = HashMap::new();
    for (session_id, speaker) in Speaker::for_sessions(&mut *conn, &ids).await? {
        speakers.entry(session_id).or_default().push(speaker);
    }

    let results = listings
        .into_iter()
        .map(|listing| {
            let session_speakers = speakers.remove(&listing.id).unwrap_or_default();
            into_view(listing, session_speakers)
        })
        .collect();

    Ok(Paginated::new(page, count, results))
}

fn into_view(listing: SessionListing, show_speakers: Vec<Speaker>) -> SessionView {
    let tickets_available =
        availability::tickets_available(listing.id, listing.capacity, listing.tickets_issued);
    SessionView {
        id: listing.id,
        astronomy_show: listing.astronomy_show,
        astronomy_show_id: listing.astronomy_show_id,
        planetarium_dome: listing.planetarium_dome,
        planetarium_dome_id: listing.planetarium_dome_id,
        show_speakers,
        show_day: listing.show_day,
        time_start: listing.time_start,
        time_end: listing.time_end,
        tickets_available,
    }
}

async fn ensure_references(
    conn: &mut sqlx::PgConnection,
    input: &SessionInput,
) -> BookingResult<Dome> {
    if !AstronomyShow::exists(&mut *conn, input.astronomy_show).await? {
        return Err(BookingError::NotFound {
            entity: "Astronomy show",
            id: input.astronomy_show,
        });
    }
    Dome::find_by_id(&mut *conn, input.planetarium_dome)
        .await?
        .ok_or(BookingError::NotFound {
            entity: "Planetarium dome",
            id: input.planetarium_dome,
        })
}

fn record(input: &SessionInput) -> SessionRecord {
    SessionRecord {
        astronomy_show_id: input.astronomy_show,
        planetarium_dome_id: input.planetarium_dome,
        show_day: input.show_day,
        time_start: input.time_start,
        time_end: input.time_end,
    }
}

fn dedup(ids: &[DbId]) -> Vec<DbId> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
