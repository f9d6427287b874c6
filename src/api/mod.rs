pub mod handlers;
pub mod render;
pub mod response;
mod routes;

pub use routes::create_router;
