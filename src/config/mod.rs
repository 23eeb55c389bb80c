pub mod resolver;
pub mod roles;
