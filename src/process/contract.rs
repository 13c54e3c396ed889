use serde::{Deserialize, Serialize};

use super::error::ProcessError;
use crate::models::DEFAULT_PAGE;

/// Name the analytics contract is published under
pub const ANALYTICS_CONTRACT: &str = "analytics";

/// Handler bundle evaluated inside a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub name: String,
    /// Page the monthly counters are seeded against
    #[serde(default = "Contract::default_page")]
    pub default_page: String,
}

impl Contract {
    fn default_page() -> String {
        DEFAULT_PAGE.to_string()
    }

    pub fn analytics() -> Self {
        Self {
            name: ANALYTICS_CONTRACT.to_string(),
            default_page: Self::default_page(),
        }
    }

    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.name != ANALYTICS_CONTRACT {
            return Err(ProcessError::UnknownContract(self.name.clone()));
        }
        Ok(())
    }
}

impl Default for Contract {
    fn default() -> Self {
        Self::analytics()
    }
}
