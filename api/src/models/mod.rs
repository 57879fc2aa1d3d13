pub mod ask;
pub mod user;
