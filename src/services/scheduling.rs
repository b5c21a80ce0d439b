//! Speaker overlap validation.
//!
//! A speaker may not host two sessions whose time windows overlap on the same
//! day. Boundaries are inclusive: a session ending at 15:00 collides with one
//! starting at 15:00.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use sqlx::PgConnection;
use tracing::{debug, info};

use crate::error::{BookingError, BookingResult};
use crate::models::{session::Session, DbId, Speaker};

/// Closed time interval `[start, end]` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Builds a window for a new or edited session; `end` must be after `start`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> BookingResult<Self> {
        if end <= start {
            return Err(BookingError::Validation(
                "time_end must be later than time_start".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// How a candidate window is compared with an existing one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Closed-interval intersection. Also catches a candidate lying strictly
    /// inside an existing session.
    #[default]
    Interval,
    /// Only checks whether an endpoint of the existing session falls inside
    /// the candidate window. Misses the containment case above; kept for
    /// parity with the legacy scheduler.
    EndpointParity,
}

impl OverlapPolicy {
    pub fn overlaps(self, candidate: &TimeWindow, existing: &TimeWindow) -> bool {
        match self {
            OverlapPolicy::Interval => {
                candidate.start <= existing.end && existing.start <= candidate.end
            }
            OverlapPolicy::EndpointParity => {
                candidate.contains(existing.start) || candidate.contains(existing.end)
            }
        }
    }
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "interval" => Ok(OverlapPolicy::Interval),
            "endpoint_parity" => Ok(OverlapPolicy::EndpointParity),
            other => Err(format!("unknown overlap policy: {other}")),
        }
    }
}

/// A session scheduling proposal for the overlap check.
#[derive(Debug, Clone, Copy)]
pub struct Proposal<'a> {
    pub speaker_ids: &'a [DbId],
    pub day: NaiveDate,
    pub window: TimeWindow,
    /// Session being edited; its own slot is not a conflict.
    pub exclude: Option<DbId>,
}

/// Fails with a conflict naming the first speaker already booked in an
/// overlapping session on the same day, or `NotFound` for an unknown speaker.
///
/// The candidate speakers stay locked until the surrounding transaction ends,
/// so two proposals for the same speaker cannot pass this check concurrently.
pub async fn ensure_speakers_available(
    conn: &mut PgConnection,
    policy: OverlapPolicy,
    proposal: &Proposal<'_>,
) -> BookingResult<()> {
    let mut ids = proposal.speaker_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }

    let speakers = Speaker::lock_many(&mut *conn, &ids).await?;
    if let Some(missing) = ids
        .iter()
        .find(|id| !speakers.iter().any(|speaker| speaker.id == **id))
    {
        return Err(BookingError::NotFound {
            entity: "Speaker",
            id: *missing,
        });
    }

    let bookings =
        Session::speaker_bookings(&mut *conn, &ids, proposal.day, proposal.exclude).await?;
    debug!(
        speakers = ids.len(),
        bookings = bookings.len(),
        day = %proposal.day,
        "checking speaker availability"
    );

    let clash = bookings.iter().find(|booking| {
        let existing = TimeWindow {
            start: booking.time_start,
            end: booking.time_end,
        };
        policy.overlaps(&proposal.window, &existing)
    });

    match clash {
        None => Ok(()),
        Some(booking) => {
            let speaker = speakers
                .iter()
                .find(|speaker| speaker.id == booking.speaker_id)
                .map(Speaker::full_name)
                .unwrap_or_else(|| format!("#{}", booking.speaker_id));
            info!(
                speaker_id = booking.speaker_id,
                session_id = booking.session_id,
                day = %proposal.day,
                window = %proposal.window,
                "speaker already booked"
            );
            Err(BookingError::Conflict(format!(
                "Speaker {speaker} has another show scheduled on the same day and time."
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn window(start: (u32, u32), end: (u32, u32)) -> TimeWindow {
        TimeWindow::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
    }

    #[test]
    fn end_must_follow_start() {
        assert!(TimeWindow::new(at(15, 0), at(14, 0)).is_err());
        assert!(TimeWindow::new(at(15, 0), at(15, 0)).is_err());
        assert!(TimeWindow::new(at(14, 0), at(15, 0)).is_ok());
    }

    #[test]
    fn afternoon_scenario_under_both_policies() {
        let booked = window((14, 0), (15, 0));
        for policy in [OverlapPolicy::Interval, OverlapPolicy::EndpointParity] {
            assert!(policy.overlaps(&window((14, 30), (15, 30)), &booked));
            // Touching boundaries count as an overlap.
            assert!(policy.overlaps(&window((15, 0), (16, 0)), &booked));
            assert!(!policy.overlaps(&window((15, 1), (16, 0)), &booked));
        }
    }

    #[test]
    fn containment_is_only_caught_by_interval_policy() {
        let booked = window((13, 0), (17, 0));
        let inside = window((14, 0), (15, 0));
        assert!(OverlapPolicy::Interval.overlaps(&inside, &booked));
        assert!(!OverlapPolicy::EndpointParity.overlaps(&inside, &booked));

        // The reverse containment is caught by both.
        assert!(OverlapPolicy::EndpointParity.overlaps(&booked, &inside));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("interval".parse::<OverlapPolicy>(), Ok(OverlapPolicy::Interval));
        assert_eq!("endpoint_parity".parse::<OverlapPolicy>(), Ok(OverlapPolicy::EndpointParity));
        assert!("loose".parse::<OverlapPolicy>().is_err());
    }

    fn arb_window() -> impl Strategy<Value = TimeWindow> {
        (0u32..1438, 1u32..120).prop_map(|(start, length)| {
            let end = (start + length).min(1439);
            TimeWindow {
                start: at(start / 60, start % 60),
                end: at(end / 60, end % 60),
            }
        })
    }

    proptest! {
        #[test]
        fn interval_overlap_is_symmetric(a in arb_window(), b in arb_window()) {
            prop_assert_eq!(
                OverlapPolicy::Interval.overlaps(&a, &b),
                OverlapPolicy::Interval.overlaps(&b, &a)
            );
        }

        #[test]
        fn parity_never_flags_what_interval_allows(a in arb_window(), b in arb_window()) {
            if OverlapPolicy::EndpointParity.overlaps(&a, &b) {
                prop_assert!(OverlapPolicy::Interval.overlaps(&a, &b));
            }
        }

        #[test]
        fn a_window_overlaps_itself(a in arb_window()) {
            prop_assert!(OverlapPolicy::Interval.overlaps(&a, &a));
            prop_assert!(OverlapPolicy::EndpointParity.overlaps(&a, &a));
        }
    }
}
