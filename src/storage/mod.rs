pub mod db;
mod files;
pub mod models;
mod ratings;
mod tables;
mod users;

pub use db::{Database, DatabaseError, ErrorKind};
pub use tables::*;
