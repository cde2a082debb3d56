mod message;
mod user;

pub use message::*;
pub use user::*;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
}
