//! Service-level errors

use axiom_core::{RemoteError, ValidationError};
use cache::CacheError;
use remote::RetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("User is already a collaborator")]
    AlreadyContributor,

    #[error("User not found")]
    UserNotFound,

    #[error("not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The profile row created by signup never became visible
    #[error("User profile creation failed or took too long.")]
    ProfileNotReady { attempts: u32 },

    /// Switched off by the site operators
    #[error("{0} is currently disabled")]
    FeatureDisabled(&'static str),
}

impl AppError {
    /// The remote store refused the operation for lack of permission
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_permission_denied())
    }
}

impl From<RetryError> for AppError {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Exhausted { attempts } => Self::ProfileNotReady { attempts },
            RetryError::Remote(e) => Self::Remote(e),
        }
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
