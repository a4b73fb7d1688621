pub mod chat;
pub mod images;
pub mod models;
