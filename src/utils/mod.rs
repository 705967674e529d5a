pub mod hash;
pub mod keyed_mutex;
pub mod password;
pub mod validation;
