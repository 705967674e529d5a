pub mod prelude;

pub mod tokens;
pub mod user_files;
pub mod users;
