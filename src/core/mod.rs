pub mod command;
pub mod generator;
pub mod resolve;
pub mod strategy;
pub mod validate;
