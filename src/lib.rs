pub mod comment;
pub mod db;
pub mod error;
pub mod media;
pub mod orm;
pub mod post;
pub mod schema;
pub mod user;

pub use error::{Error, Result};
