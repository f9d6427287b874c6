mod auth;
mod categories;
mod files;
mod health;

pub use auth::{login, login_form, logout, register, register_form, WRONG_CREDENTIALS};
pub use categories::{categories_index, category_listing};
pub use files::{download_page, home, raw_file, submit_rating, upload, upload_form};
pub use health::health;
