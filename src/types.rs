//! Core ids and order value types for the cache (charter data models).
//!
//! All identifiers are opaque string newtypes. [`Order`] is the immutable
//! descriptor accepted by the cache; [`MatchFill`] is one recorded buy/sell
//! pairing.

use std::fmt;

/// Unique order identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OrderId(pub String);

/// Identifier of a traded security.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SecurityId(pub String);

/// Identifier of the user who owns an order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct UserId(pub String);

/// Identifier of the company a user trades for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CompanyId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(OrderId);
string_id!(SecurityId);
string_id!(UserId);
string_id!(CompanyId);

/// Order side.
///
/// The wire contract recognizes exactly one Sell spelling: the literal
/// `"Sell"`. Every other side string means Buy (see [`Side::from_wire`]).
/// The typed API only ever deals in the two enum values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Maps a wire side string to a side: `"Sell"` is Sell, anything else
    /// (including `"sell"` and `"SELL"`) is Buy.
    pub fn from_wire(s: &str) -> Self {
        if s == "Sell" {
            Side::Sell
        } else {
            Side::Buy
        }
    }

    /// The side a counterparty must be on.
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Side {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Side {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(d)?;
        Ok(Side::from_wire(&s))
    }
}

/// Order descriptor (charter).
///
/// Immutable once accepted; the cache tracks the working (un-filled)
/// remainder separately. `qty` is the total lot count.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub security_id: SecurityId,
    pub side: Side,
    pub qty: u64,
    pub user_id: UserId,
    pub company_id: CompanyId,
}

impl Order {
    /// Builds an order in the canonical attribute order
    /// (id, security, side, qty, user, company).
    pub fn new(
        order_id: impl Into<OrderId>,
        security_id: impl Into<SecurityId>,
        side: Side,
        qty: u64,
        user_id: impl Into<UserId>,
        company_id: impl Into<CompanyId>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            security_id: security_id.into(),
            side,
            qty,
            user_id: user_id.into(),
            company_id: company_id.into(),
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self.side, Side::Buy)
    }
}

/// One recorded pairing of a buy and a sell order.
///
/// Always in canonical orientation: the buy order's id first, whichever leg
/// triggered the match. Carries its security so per-security queries keep
/// working after either leg is cancelled.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchFill {
    pub security_id: SecurityId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub qty: u64,
}
