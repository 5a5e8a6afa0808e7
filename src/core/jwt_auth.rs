use actix_web::{dev::Payload, Error as ActixWebError};
use actix_web::{error::ErrorUnauthorized, http, FromRequest, HttpMessage, HttpRequest};
use core::fmt;
use jsonwebtoken::{decode, DecodingKey, Validation};
use std::future::{ready, Ready};
use serde::{Deserialize, Serialize};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;
use crate::core::AppError;

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(&self).unwrap())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

/// Claims minted by the external identity provider. `role` carries the
/// provider's role assignment (admin, moderator or student).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String, // user ID
    pub email: String,
    pub role: String,
    pub exp: usize, // expiration time
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn is_moderator(&self) -> bool {
        self.role == "admin" || self.role == "moderator"
    }
}

#[derive(Debug)]
pub struct JwtMiddleware {
    pub user_id: Uuid,
    pub claims: JwtClaims,
}

impl FromRequest for JwtMiddleware {
    type Error = ActixWebError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.len() > 7)
            .map(|value| value.split_at(7).1.to_string());

        if token.is_none() {
            let error = ErrorResponse {
                message: "Invalid login credentials".to_string(),
                success: false,
            };

            return ready(Err(ErrorUnauthorized(error)));
        }

        let claims = match decode::<JwtClaims>(
            &token.unwrap(),
            &DecodingKey::from_secret(JWT_SECRET.as_ref()),
            &Validation::default(),
        ) {
            Ok(c) => c.claims,
            Err(_ea) => {
                let error = ErrorResponse {
                    message: "Invalid token".to_string(),
                    success: false,
                };
                return ready(Err(ErrorUnauthorized(error)));
            }
        };

        let user_id: Uuid = match claims.sub.parse() {
            Ok(id) => id,
            Err(_) => {
                let error = ErrorResponse {
                    message: "Invalid user ID in token".to_string(),
                    success: false,
                };
                return ready(Err(ErrorUnauthorized(error)));
            }
        };

        req.extensions_mut().insert(claims.clone());

        ready(Ok(JwtMiddleware { user_id, claims }))
    }
}

const JWT_SECRET: &str = "JKASWEMPAQLDFNBCXIUEWMNZALQPWIEURT";

pub fn generate_jwt_token(claims: &JwtClaims) -> Result<String, AppError> {
    let header = Header::default();
    let encoding_key = EncodingKey::from_secret(JWT_SECRET.as_ref());

    encode(&header, claims, &encoding_key)
        .map_err(|_| AppError::internal_error("Failed to generate JWT token"))
}

impl FromRequest for JwtClaims {
    type Error = ActixWebError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<JwtClaims>() {
            ready(Ok(claims.clone()))
        } else {
            let error = ErrorResponse {
                message: "No authentication token found".to_string(),
                success: false,
            };
            ready(Err(ErrorUnauthorized(error)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::assert_ok;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    fn sample_claims() -> JwtClaims {
        JwtClaims {
            sub: Uuid::new_v4().to_string(),
            email: SafeEmail().fake(),
            role: "student".to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        }
    }

    #[test]
    fn generated_token_decodes_back_to_the_same_claims() {
        let claims = sample_claims();
        let token = assert_ok!(generate_jwt_token(&claims));

        let decoded = decode::<JwtClaims>(
            &token,
            &DecodingKey::from_secret(JWT_SECRET.as_ref()),
            &Validation::default(),
        )
        .expect("token should decode")
        .claims;

        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.email, claims.email);
        assert_eq!(decoded.role, claims.role);
    }

    #[test]
    fn moderator_and_admin_roles_are_recognised() {
        let mut claims = sample_claims();
        assert!(!claims.is_moderator());
        claims.role = "moderator".to_string();
        assert!(claims.is_moderator());
        claims.role = "admin".to_string();
        assert!(claims.is_moderator());
    }

    #[test]
    fn malformed_subject_is_rejected() {
        let mut claims = sample_claims();
        claims.sub = "not-a-uuid".to_string();
        assert!(claims.user_id().is_err());
    }
}
