#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use fake::faker::company::en::Profession;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use sqlx::PgPool;

use planetarium::models::dome::CreateDome;
use planetarium::models::show::CreateShow;
use planetarium::models::speaker::CreateSpeaker;
use planetarium::models::{AstronomyShow, DbId, Dome, Speaker};
use planetarium::services::scheduling::OverlapPolicy;
use planetarium::services::sessions::{Scheduler, SessionInput, SessionView};

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

pub fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub async fn dome(pool: &PgPool, rows: i32, seats_in_row: i32) -> Dome {
    Dome::create(
        pool,
        &CreateDome {
            name: format!("Dome {rows}x{seats_in_row}"),
            rows,
            seats_in_row,
        },
    )
    .await
    .unwrap()
}

pub async fn show(pool: &PgPool, title: &str) -> AstronomyShow {
    let mut conn = pool.acquire().await.unwrap();
    AstronomyShow::create(
        &mut conn,
        &CreateShow {
            title: title.to_string(),
            description: "A tour of the night sky".to_string(),
            poster: None,
            show_themes: Vec::new(),
        },
        &[],
    )
    .await
    .unwrap()
}

pub async fn speaker(pool: &PgPool) -> Speaker {
    let profession: String = Profession().fake();
    Speaker::create(
        pool,
        &CreateSpeaker {
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            profession: profession.chars().take(30).collect(),
        },
    )
    .await
    .unwrap()
}

pub fn input(
    show: &AstronomyShow,
    dome: &Dome,
    speakers: &[DbId],
    start: NaiveTime,
    end: NaiveTime,
) -> SessionInput {
    SessionInput {
        astronomy_show: show.id,
        planetarium_dome: dome.id,
        show_speakers: speakers.to_vec(),
        show_day: day(),
        time_start: start,
        time_end: end,
    }
}

/// A session on [`day`] in a fresh 10x10 dome, scheduled under the default policy.
pub async fn session(pool: &PgPool, speakers: &[DbId], start: NaiveTime, end: NaiveTime) -> SessionView {
    let show = show(pool, "Stars Tonight").await;
    let dome = dome(pool, 10, 10).await;
    Scheduler::new(OverlapPolicy::Interval)
        .create(pool, &input(&show, &dome, speakers, start, end))
        .await
        .unwrap()
}
