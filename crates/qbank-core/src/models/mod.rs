pub mod bank;
pub mod reminder;
pub mod response;
pub mod status;
