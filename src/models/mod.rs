pub mod dome;
pub mod reservation;
pub mod session;
pub mod show;
pub mod speaker;
pub mod theme;
pub mod user;

pub use dome::Dome;
pub use reservation::{Reservation, Ticket};
pub use session::Session;
pub use show::AstronomyShow;
pub use speaker::Speaker;
pub use theme::Theme;
pub use user::User;

/// Primary key type of every table.
pub type DbId = i64;
