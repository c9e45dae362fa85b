pub mod coordinator;
pub mod history;
pub mod selection;
pub mod session;
pub mod theme;
