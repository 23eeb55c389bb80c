pub mod paths;
pub mod stdin;
