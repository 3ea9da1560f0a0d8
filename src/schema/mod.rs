pub mod figure;
pub mod links;
pub mod statement;
