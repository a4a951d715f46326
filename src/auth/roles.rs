// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Administrator privilege ranks.

use serde::{Deserialize, Serialize};

/// Privilege rank of an administrator account.
///
/// ## Rank Ordering
///
/// A **lower** numeric value denotes **higher** privilege:
///
/// - `SuperAdmin` (1) - passes every rank requirement
/// - `Admin` (2) - passes requirements of rank 2 and 3
/// - `Operator` (3) - passes requirements of rank 3 only
///
/// Ranks travel inside tokens and the account store as their integer value,
/// and every conversion back goes through [`AdminRank::try_from`], so an
/// unknown integer never becomes a rank.
///
/// The default is the least privileged rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum AdminRank {
    /// Full administrative access
    SuperAdmin = 1,
    /// Regular administrator
    Admin = 2,
    /// Operator (least privileged admin)
    #[default]
    Operator = 3,
}

/// An integer that does not name a known rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown admin rank {0}")]
pub struct InvalidRank(pub i64);

impl AdminRank {
    /// Every rank, highest privilege first.
    pub const ALL: [AdminRank; 3] = [AdminRank::SuperAdmin, AdminRank::Admin, AdminRank::Operator];

    /// Numeric rank value (1 = highest privilege).
    pub fn value(self) -> i64 {
        self as i64
    }

    /// Human readable label used by the roles listing.
    pub fn label(self) -> &'static str {
        match self {
            AdminRank::SuperAdmin => "super administrator",
            AdminRank::Admin => "administrator",
            AdminRank::Operator => "operator",
        }
    }

    /// Check whether this rank is at least as privileged as `required`.
    pub fn satisfies(self, required: AdminRank) -> bool {
        // Super admin passes regardless of the threshold.
        if self == AdminRank::SuperAdmin {
            return true;
        }
        self.value() <= required.value()
    }
}

impl TryFrom<i64> for AdminRank {
    type Error = InvalidRank;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AdminRank::SuperAdmin),
            2 => Ok(AdminRank::Admin),
            3 => Ok(AdminRank::Operator),
            other => Err(InvalidRank(other)),
        }
    }
}

impl From<AdminRank> for i64 {
    fn from(rank: AdminRank) -> Self {
        rank.value()
    }
}

impl std::fmt::Display for AdminRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label(), self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_admin_satisfies_everything() {
        for required in AdminRank::ALL {
            assert!(AdminRank::SuperAdmin.satisfies(required));
        }
    }

    #[test]
    fn lower_value_is_more_privileged() {
        assert!(AdminRank::Admin.satisfies(AdminRank::Admin));
        assert!(AdminRank::Admin.satisfies(AdminRank::Operator));
        assert!(!AdminRank::Admin.satisfies(AdminRank::SuperAdmin));
        assert!(!AdminRank::Operator.satisfies(AdminRank::Admin));
        assert!(AdminRank::Operator.satisfies(AdminRank::Operator));
    }

    #[test]
    fn try_from_rejects_unknown_values() {
        assert_eq!(AdminRank::try_from(1), Ok(AdminRank::SuperAdmin));
        assert_eq!(AdminRank::try_from(3), Ok(AdminRank::Operator));
        assert_eq!(AdminRank::try_from(0), Err(InvalidRank(0)));
        assert_eq!(AdminRank::try_from(4), Err(InvalidRank(4)));
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&AdminRank::Admin).unwrap(), "2");
        let rank: AdminRank = serde_json::from_str("3").unwrap();
        assert_eq!(rank, AdminRank::Operator);
        assert!(serde_json::from_str::<AdminRank>("9").is_err());
    }

    #[test]
    fn default_rank_is_operator() {
        assert_eq!(AdminRank::default(), AdminRank::Operator);
    }
}
