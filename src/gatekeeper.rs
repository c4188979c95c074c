//! Admin allow-list check.

use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("user {caller} is not an admin")]
pub struct AccessDenied {
    pub caller: i64,
}

/// Static set of operator ids allowed to issue commands.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    admins: HashSet<i64>,
}

impl Gatekeeper {
    pub fn new(admins: impl IntoIterator<Item = i64>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn check(&self, caller: i64) -> Result<(), AccessDenied> {
        if self.admins.contains(&caller) {
            Ok(())
        } else {
            Err(AccessDenied { caller })
        }
    }
}
