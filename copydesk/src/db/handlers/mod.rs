pub mod articles;
pub mod commentaries;
pub mod repository;
pub mod users;

pub use articles::Articles;
pub use commentaries::Commentaries;
pub use repository::Repository;
pub use users::Users;
