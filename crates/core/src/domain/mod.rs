pub mod cost;
pub mod inventory;
pub mod result;
