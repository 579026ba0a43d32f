pub mod aggregator;
pub mod detector;
pub mod filesystem;
pub mod folders;
pub mod parser;
pub mod pipeline;
pub mod syntax;
pub mod visitors;
