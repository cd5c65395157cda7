//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! JWT signing and verification
//!
//! This layer only proves that a token was signed by us for our audience.
//! Expiry is judged against the injected clock by the token service, and
//! revocation lives in the token store.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::config::JwtConfig;
use crate::{AuthError, AuthResult};

use super::claims::JwtClaims;

/// JWT manager
pub struct JwtManager {
    /// JWT configuration
    config: JwtConfig,

    /// Encoding key
    encoding_key: EncodingKey,

    /// Decoding key
    decoding_key: DecodingKey,

    validation: Validation,
}

impl JwtManager {
    /// Create new JWT manager
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        if config.secret.is_empty() {
            return Err(AuthError::configuration("JWT secret cannot be empty"));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm.as_jsonwebtoken());
        validation.set_audience(&[&config.audience]);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = false;

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Sign claims into a compact JWT
    pub fn encode(&self, claims: &JwtClaims) -> AuthResult<String> {
        let header = Header::new(self.config.algorithm.as_jsonwebtoken());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("Token signing failed: {}", e)))
    }

    /// Verify signature, issuer and audience and return the claims
    ///
    /// Expiry is not checked here.
    pub fn decode(&self, token: &str) -> AuthResult<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("JWT rejected: {}", e);
                AuthError::invalid_token(e.to_string())
            })
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("config", &"<sensitive>")
            .field("encoding_key", &"<sensitive>")
            .field("decoding_key", &"<sensitive>")
            .field("algorithm", &self.config.algorithm)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtAlgorithm;
    use crate::jwt::TokenType;
    use chrono::Utc;
    use uuid::Uuid;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "unit-test-secret".to_string(),
            ..JwtConfig::default()
        }
    }

    fn claims(config: &JwtConfig, token_type: TokenType) -> JwtClaims {
        JwtClaims::new(Uuid::new_v4(), "jwt@example.com", token_type, config, Utc::now()).unwrap()
    }

    #[test]
    fn test_jwt_manager_debug() {
        let jwt_manager = JwtManager::new(config()).unwrap();
        let debug_output = format!("{:?}", jwt_manager);
        assert!(debug_output.contains("JwtManager"));
        assert!(debug_output.contains("<sensitive>"));
        assert!(!debug_output.contains("unit-test-secret"));
    }

    #[test]
    fn test_encode_decode() {
        for algorithm in [JwtAlgorithm::HS256, JwtAlgorithm::HS384, JwtAlgorithm::HS512] {
            let config = JwtConfig {
                algorithm,
                ..config()
            };
            let jwt_manager = JwtManager::new(config.clone()).unwrap();
            let claims = claims(&config, TokenType::Refresh);

            let token = jwt_manager.encode(&claims).unwrap();
            let decoded = jwt_manager.decode(&token).unwrap();
            assert_eq!(decoded, claims);
        }
    }

    #[test]
    fn test_expired_claims_still_decode() {
        let config = config();
        let jwt_manager = JwtManager::new(config.clone()).unwrap();
        let mut claims = claims(&config, TokenType::Access);
        claims.iat -= 7200;
        claims.exp -= 7200;

        let token = jwt_manager.encode(&claims).unwrap();
        assert!(jwt_manager.decode(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = config();
        let signer = JwtManager::new(JwtConfig {
            secret: "someone-elses-secret".to_string(),
            ..config.clone()
        })
        .unwrap();
        let verifier = JwtManager::new(config.clone()).unwrap();

        let token = signer.encode(&claims(&config, TokenType::Access)).unwrap();
        assert!(matches!(
            verifier.decode(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_audience_and_issuer_rejected() {
        let config = config();
        let verifier = JwtManager::new(config.clone()).unwrap();

        let other_audience = JwtConfig {
            audience: "other-app".to_string(),
            ..config.clone()
        };
        let token = JwtManager::new(other_audience.clone())
            .unwrap()
            .encode(&claims(&other_audience, TokenType::Access))
            .unwrap();
        assert!(matches!(
            verifier.decode(&token),
            Err(AuthError::InvalidToken(_))
        ));

        let other_issuer = JwtConfig {
            issuer: "other-issuer".to_string(),
            ..config.clone()
        };
        let token = JwtManager::new(other_issuer.clone())
            .unwrap()
            .encode(&claims(&other_issuer, TokenType::Access))
            .unwrap();
        assert!(matches!(
            verifier.decode(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let jwt_manager = JwtManager::new(config()).unwrap();

        for token in ["", "invalid.token.format", "not.a.valid.jwt.token"] {
            assert!(matches!(
                jwt_manager.decode(token),
                Err(AuthError::InvalidToken(_))
            ));
        }
    }
}
