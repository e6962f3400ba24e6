pub mod file;
pub mod fixture;
pub mod stdin;
