//! Read-optimized shapes produced by the denormalizing read pipeline.
//! None of these are ever written back.

use serde::{Deserialize, Serialize};

use super::{CTest, EManualTest, Location, Provider, User};

/// A location with its provider joined in. `provider` is `None` when the
/// referenced provider no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWithProvider {
    #[serde(flatten)]
    pub location: Location,
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualTestWithUser {
    #[serde(flatten)]
    pub manual_test: EManualTest,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CTestWithUser {
    #[serde(flatten)]
    pub ctest: CTest,
    pub user: User,
}

/// A user with one of their lab results; one row per result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWithCTest {
    #[serde(flatten)]
    pub user: User,
    pub ctest: CTest,
}
