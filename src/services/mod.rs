pub mod file_service;
pub mod session_service;
pub mod storage;
pub mod token_store;
pub mod user_service;
pub mod worker;
