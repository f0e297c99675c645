pub mod auth;
pub mod export;
pub mod messaging;
pub mod notify;
pub mod qr;
pub mod receipt;
pub mod reminder;
