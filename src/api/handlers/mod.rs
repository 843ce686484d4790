pub mod admin;
pub mod auth;
pub mod bookings;
pub mod packages;
pub mod payments;
pub mod root;
pub mod transfers;
pub mod uploads;
