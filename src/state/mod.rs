pub mod history;
pub mod shared;
