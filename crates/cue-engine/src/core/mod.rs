pub mod state;
pub mod table;
pub mod time;
