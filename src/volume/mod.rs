pub mod controller;
pub mod limits;
pub mod strategy;
