mod common;

use futures::future::join_all;
use sqlx::PgPool;

use common::at;
use planetarium::error::BookingError;
use planetarium::models::{Reservation, Ticket};
use planetarium::services::availability;
use planetarium::services::reservations::{self, TicketRequest};

fn ticket(show_session: i64, row: i32, seat: i32) -> TicketRequest {
    TicketRequest {
        show_session,
        row,
        seat,
    }
}

#[sqlx::test(migrations = "./src/migrations")]
async fn availability_drops_by_one_per_ticket(pool: PgPool) {
    let session = common::session(&pool, &[], at(14, 0), at(15, 0)).await;
    assert_eq!(session.tickets_available, 100);

    reservations::create(&pool, None, &[ticket(session.id, 1, 1)])
        .await
        .unwrap();
    let after = availability::for_session(&pool, session.id).await.unwrap();
    assert_eq!(after.capacity, 100);
    assert_eq!(after.tickets_available, 99);

    let err = reservations::create(&pool, None, &[ticket(session.id, 1, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Conflict(_)));

    let after = availability::for_session(&pool, session.id).await.unwrap();
    assert_eq!(after.tickets_available, 99);
    assert_eq!(Reservation::count(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn out_of_range_seat_creates_nothing(pool: PgPool) {
    let session = common::session(&pool, &[], at(14, 0), at(15, 0)).await;

    let err = reservations::create(&pool, None, &[ticket(session.id, 11, 1)])
        .await
        .unwrap_err();
    match err {
        BookingError::Range { field, max, .. } => {
            assert_eq!(field, "row");
            assert_eq!(max, 10);
        }
        other => panic!("expected a range error, got {other:?}"),
    }

    let err = reservations::create(&pool, None, &[ticket(session.id, 1, 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Range { field: "seat", .. }));

    assert_eq!(Reservation::count(&pool).await.unwrap(), 0);
    assert_eq!(Ticket::count(&pool).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn failing_ticket_rolls_back_the_whole_reservation(pool: PgPool) {
    let session = common::session(&pool, &[], at(14, 0), at(15, 0)).await;

    let err = reservations::create(
        &pool,
        None,
        &[
            ticket(session.id, 1, 1),
            ticket(session.id, 1, 2),
            ticket(session.id, 1, 1),
        ],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::Conflict(_)));

    assert_eq!(Reservation::count(&pool).await.unwrap(), 0);
    assert_eq!(Ticket::count(&pool).await.unwrap(), 0);

    // The same seats are still free afterwards.
    let receipt = reservations::create(
        &pool,
        None,
        &[ticket(session.id, 1, 1), ticket(session.id, 1, 2)],
    )
    .await
    .unwrap();
    assert_eq!(receipt.tickets.len(), 2);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn tickets_may_span_sessions(pool: PgPool) {
    let first = common::session(&pool, &[], at(10, 0), at(11, 0)).await;
    let dome = common::dome(&pool, 2, 2).await;
    let show = common::show(&pool, "Moon Walk").await;
    let second = planetarium::services::sessions::Scheduler::default()
        .create(&pool, &common::input(&show, &dome, &[], at(12, 0), at(13, 0)))
        .await
        .unwrap();

    let receipt = reservations::create(
        &pool,
        None,
        &[ticket(first.id, 5, 5), ticket(second.id, 2, 2)],
    )
    .await
    .unwrap();
    assert_eq!(receipt.tickets.len(), 2);

    // Row 5 exists in the 10x10 dome but not in the 2x2 one.
    let err = reservations::create(&pool, None, &[ticket(second.id, 5, 5)])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Range { field: "row", max: 2, .. }));
}

#[sqlx::test(migrations = "./src/migrations")]
async fn empty_or_unknown_requests_are_rejected(pool: PgPool) {
    let err = reservations::create(&pool, None, &[]).await.unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    let err = reservations::create(&pool, None, &[ticket(4242, 1, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound { id: 4242, .. }));

    assert_eq!(Reservation::count(&pool).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn concurrent_requests_for_one_seat_yield_one_winner(pool: PgPool) {
    let session = common::session(&pool, &[], at(14, 0), at(15, 0)).await;

    let attempts = (0..5).map(|_| {
        let pool = pool.clone();
        let request = [ticket(session.id, 3, 7)];
        async move { reservations::create(&pool, None, &request).await }
    });
    let results = join_all(attempts).await;

    let winners = results.iter().filter(|result| result.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|result| matches!(result, Err(BookingError::Conflict(_))))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 4);

    let after = availability::for_session(&pool, session.id).await.unwrap();
    assert_eq!(after.tickets_available, 99);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn reservations_are_listed_for_their_owner_only(pool: PgPool) {
    use planetarium::models::User;
    use planetarium::pagination::PageParams;

    let session = common::session(&pool, &[], at(14, 0), at(15, 0)).await;
    let owner = User::create(&pool, "owner@example.com", None, "hash", false)
        .await
        .unwrap();
    let other = User::create(&pool, "other@example.com", None, "hash", false)
        .await
        .unwrap();

    let receipt = reservations::create(
        &pool,
        Some(owner.id),
        &[ticket(session.id, 2, 3), ticket(session.id, 2, 4)],
    )
    .await
    .unwrap();

    let page = PageParams::default().resolve(10, 30);
    let listed = reservations::list_for_user(&pool, owner.id, None, page)
        .await
        .unwrap();
    assert_eq!(listed.count, 1);
    assert_eq!(listed.results[0].astronomy_show_title.as_deref(), Some("Stars Tonight"));
    assert_eq!(listed.results[0].taken_places.len(), 2);

    let filtered = reservations::list_for_user(&pool, owner.id, Some("moon"), page)
        .await
        .unwrap();
    assert_eq!(filtered.count, 0);

    let detail = reservations::detail_for_user(&pool, receipt.id, owner.id)
        .await
        .unwrap();
    assert_eq!(detail.show_session_date, Some(common::day()));
    assert_eq!(detail.show_session_time_start, Some(at(14, 0)));

    let err = reservations::detail_for_user(&pool, receipt.id, other.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound { .. }));
}
