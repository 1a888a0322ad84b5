// Copyright (c) 2025 - Cowboy AI, Inc.
//! AWS session credentials handed to the deployment engine
//!
//! The core never discovers credentials itself. A [`CredentialProvider`]
//! supplies them; [`AwsCredential::from_sts_json`] parses the document that
//! `aws sts get-session-token` prints, so a provider can shell out or read a
//! cached file as it sees fit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

use crate::errors::ProvisioningResult;

/// Temporary AWS session credentials
///
/// `Debug` never prints the secret key or session token.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsCredential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SessionTokenResponse {
    credentials: AwsCredential,
}

impl AwsCredential {
    /// Parse the output of `aws sts get-session-token`
    pub fn from_sts_json(json: &str) -> ProvisioningResult<Self> {
        let response: SessionTokenResponse = serde_json::from_str(json)?;
        Ok(response.credentials)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for AwsCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"****")
            .field("session_token", &"****")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Source of credentials for cloud API calls
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials(&self) -> ProvisioningResult<AwsCredential>;
}

/// Provider that always returns the same credentials
#[derive(Debug, Clone)]
pub struct StaticCredentials(AwsCredential);

impl StaticCredentials {
    pub fn new(credential: AwsCredential) -> Self {
        Self(credential)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credentials(&self) -> ProvisioningResult<AwsCredential> {
        Ok(self.0.clone())
    }
}
