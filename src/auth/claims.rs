use serde::{Deserialize, Serialize};

/// JWT payload issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // opaque user id
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}
