use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three fixed participant categories. Closed enum: an
/// unrecognized role string is rejected at the boundary, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    Buyer,
    Seller,
}

impl Role {
    /// All roles, in the fixed wire order.
    pub const ALL: [Role; 3] = [Role::Agent, Role::Buyer, Role::Seller];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Agent => "agent",
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a role string outside the closed set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0} (expected agent, buyer, or seller)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(Role::Agent),
            "buyer" => Ok(Role::Buyer),
            "seller" => Ok(Role::Seller),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A value per role, with all three roles always present.
///
/// This is the "responses always has exactly the three role keys"
/// invariant moved into the type system: there is no way to construct a
/// `RoleMap` with a missing or extra key. Serializes as
/// `{"agent": .., "buyer": .., "seller": ..}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleMap<T> {
    pub agent: T,
    pub buyer: T,
    pub seller: T,
}

impl<T> RoleMap<T> {
    /// Build a map by invoking `f` once per role, in wire order.
    pub fn from_fn(mut f: impl FnMut(Role) -> T) -> Self {
        RoleMap {
            agent: f(Role::Agent),
            buyer: f(Role::Buyer),
            seller: f(Role::Seller),
        }
    }

    pub fn get(&self, role: Role) -> &T {
        match role {
            Role::Agent => &self.agent,
            Role::Buyer => &self.buyer,
            Role::Seller => &self.seller,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut T {
        match role {
            Role::Agent => &mut self.agent,
            Role::Buyer => &mut self.buyer,
            Role::Seller => &mut self.seller,
        }
    }

    /// Iterate entries in the fixed wire order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &T)> {
        Role::ALL.into_iter().map(move |role| (role, self.get(role)))
    }
}
