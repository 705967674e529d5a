pub use super::tokens::Entity as Tokens;
pub use super::user_files::Entity as UserFiles;
pub use super::users::Entity as Users;
