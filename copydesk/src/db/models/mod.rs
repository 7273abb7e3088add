pub mod articles;
pub mod commentaries;
pub mod users;
