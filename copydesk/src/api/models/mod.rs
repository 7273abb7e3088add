pub mod articles;
pub mod auth;
pub mod commentaries;
pub mod pagination;
pub mod users;
