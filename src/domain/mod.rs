pub mod booking;
pub mod package;
pub mod payment;
pub mod transfer;
pub mod user;

pub use booking::*;
pub use package::*;
pub use payment::*;
pub use transfer::*;
pub use user::*;
