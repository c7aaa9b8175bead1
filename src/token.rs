//! HS256 JSON Web Token authenticator.

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::{AuthContext, Authenticator, TokenError};

/// [`Authenticator`] backed by HMAC-SHA256 signed JWTs.
///
/// ```rust
/// use std::time::Duration;
/// use tollgate::{AuthContext, Authenticator, token::JwtAuthenticator};
///
/// let jwt = JwtAuthenticator::new(b"an example secret of decent length");
/// let token = jwt.generate(AuthContext::new(42, "ADMIN"), Duration::from_secs(3600)).unwrap();
/// let claims = jwt.verify(&token).unwrap();
/// assert_eq!(claims.user_id, 42);
/// ```
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl Authenticator for JwtAuthenticator {
    fn generate(&self, mut claims: AuthContext, ttl: Duration) -> Result<String, TokenError> {
        claims.expire_in(ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Generate(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<AuthContext, TokenError> {
        let data = jsonwebtoken::decode::<AuthContext>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?;

        // jsonwebtoken treats `exp == now` as still valid.
        if data.claims.is_expired() {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}
