pub mod app;
pub mod draw;
pub mod list;
pub mod search;
