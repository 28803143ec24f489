use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;

/// Version of the product under test.
///
/// `Dev` is the development branch and orders after every release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProductVersion {
    Release { major: u32, minor: u32, patch: u32 },
    Dev,
}

pub const DEV_BRANCH: ProductVersion = ProductVersion::Dev;

const DEV_BRANCH_NAME: &str = "dev";

impl ProductVersion {
    pub const fn release(
        major: u32,
        minor: u32,
        patch: u32,
    ) -> Self {
        ProductVersion::Release {
            major,
            minor,
            patch,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, ProductVersion::Dev)
    }
}

impl Default for ProductVersion {
    fn default() -> Self {
        DEV_BRANCH
    }
}

impl fmt::Display for ProductVersion {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ProductVersion::Dev => f.write_str(DEV_BRANCH_NAME),
            ProductVersion::Release {
                major,
                minor,
                patch,
            } => write!(f, "{major}.{minor}.{patch}"),
        }
    }
}

impl FromStr for ProductVersion {
    type Err = Error;

    /// Accepts `dev` or a dotted release with two or three components
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(DEV_BRANCH_NAME) {
            return Ok(DEV_BRANCH);
        }

        let parts = s
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidConfig(format!("invalid product version '{s}': {e}")))?;

        match parts.as_slice() {
            [major, minor] => Ok(ProductVersion::release(*major, *minor, 0)),
            [major, minor, patch] => Ok(ProductVersion::release(*major, *minor, *patch)),
            _ => Err(Error::InvalidConfig(format!(
                "invalid product version '{s}': expected major.minor[.patch]"
            ))),
        }
    }
}

impl TryFrom<String> for ProductVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProductVersion> for String {
    fn from(version: ProductVersion) -> Self {
        version.to_string()
    }
}
