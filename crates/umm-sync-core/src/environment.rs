use std::fmt;
use std::str::FromStr;

use crate::error::SyncError;

/// Deployment environments of the CMR catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmrEnvironment {
    /// Operations, also known as production.
    Ops,
    /// User acceptance testing.
    Uat,
}

impl CmrEnvironment {
    /// Fixed base URL for this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Ops => "https://cmr.earthdata.nasa.gov",
            Self::Uat => "https://cmr.uat.earthdata.nasa.gov",
        }
    }
}

impl FromStr for CmrEnvironment {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ops" => Ok(Self::Ops),
            "uat" => Ok(Self::Uat),
            _ => Err(SyncError::UnrecognizedEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for CmrEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ops => write!(f, "ops"),
            Self::Uat => write!(f, "uat"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("ops".parse::<CmrEnvironment>().unwrap(), CmrEnvironment::Ops);
        assert_eq!("OPS".parse::<CmrEnvironment>().unwrap(), CmrEnvironment::Ops);
        assert_eq!("uat".parse::<CmrEnvironment>().unwrap(), CmrEnvironment::Uat);
        assert_eq!("Uat".parse::<CmrEnvironment>().unwrap(), CmrEnvironment::Uat);
    }

    #[test]
    fn test_unknown_environment_is_fatal() {
        let err = "prod".parse::<CmrEnvironment>().unwrap_err();
        assert!(matches!(err, SyncError::UnrecognizedEnvironment(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_base_urls() {
        assert_eq!(
            CmrEnvironment::Ops.base_url(),
            "https://cmr.earthdata.nasa.gov"
        );
        assert_eq!(
            CmrEnvironment::Uat.base_url(),
            "https://cmr.uat.earthdata.nasa.gov"
        );
    }
}
