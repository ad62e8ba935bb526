use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload issued on register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid, // public user id
    pub email: String,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}
