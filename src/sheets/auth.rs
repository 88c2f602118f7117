use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::ServiceAccountAuthenticator;

use super::SheetsError;

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/drive.file",
];

/// Supplies OAuth2 bearer tokens for the Sheets API.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, SheetsError>;
}

/// Service-account credentials loaded from a Google JSON key file.
pub struct ServiceAccountTokenSource {
    authenticator: DefaultAuthenticator,
}

impl ServiceAccountTokenSource {
    pub async fn from_key_file(path: &Path) -> Result<Self, SheetsError> {
        debug!(path = %path.display(), "reading service account key");
        let key = yup_oauth2::read_service_account_key(path)
            .await
            .map_err(|e| SheetsError::Credentials(format!("{}: {e}", path.display())))?;
        let authenticator = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| SheetsError::Credentials(e.to_string()))?;
        Ok(Self { authenticator })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, SheetsError> {
        let token = self
            .authenticator
            .token(SCOPES)
            .await
            .map_err(|e| SheetsError::Credentials(e.to_string()))?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| SheetsError::Credentials("token response had no access token".to_string()))
    }
}

/// A fixed token, for tests.
#[cfg(test)]
pub struct StaticToken(pub String);

#[cfg(test)]
#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, SheetsError> {
        Ok(self.0.clone())
    }
}
