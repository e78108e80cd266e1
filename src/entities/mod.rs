pub mod admin_user;
pub mod appearance;
pub mod restaurant;
pub mod source;
