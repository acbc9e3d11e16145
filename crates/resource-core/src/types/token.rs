use alloy_primitives::{Address, U256};
use std::fmt;

/// Position token side ids as packed into the high bits of a token id.
pub const SIDE_ID_LONG: u32 = 0x10;
pub const SIDE_ID_SHORT: u32 = 0x20;
pub const SIDE_ID_LP: u32 = 0x30;

/// One of the three sides a pool issues positions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
    Lp,
}

impl Side {
    pub const ALL: [Side; 3] = [Side::Long, Side::Short, Side::Lp];

    pub fn id(self) -> u32 {
        match self {
            Side::Long => SIDE_ID_LONG,
            Side::Short => SIDE_ID_SHORT,
            Side::Lp => SIDE_ID_LP,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            SIDE_ID_LONG => Some(Side::Long),
            SIDE_ID_SHORT => Some(Side::Short),
            SIDE_ID_LP => Some(Side::Lp),
            _ => None,
        }
    }

    /// Long and short carry leverage; the liquidity side does not.
    pub fn is_directional(self) -> bool {
        !matches!(self, Side::Lp)
    }
}

impl Default for Side {
    fn default() -> Self {
        Side::Lp
    }
}

/// Key for anything an account can hold: a plain ERC-20, or one side of a
/// pool held through the shared ERC-1155 position token. The side id is kept
/// raw so ids outside the three known sides still reduce correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKey {
    Erc20(Address),
    Position(Address, u32),
}

impl TokenKey {
    pub fn side(pool: Address, side: Side) -> Self {
        TokenKey::Position(pool, side.id())
    }

    pub fn pool(&self) -> Option<Address> {
        match self {
            TokenKey::Erc20(_) => None,
            TokenKey::Position(pool, _) => Some(*pool),
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKey::Erc20(addr) => write!(f, "{addr}"),
            TokenKey::Position(pool, side) => write!(f, "{pool}-{side}"),
        }
    }
}

/// Resolved token metadata, for ERC-20s and synthetic per-side entries alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub key: TokenKey,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub total_supply: U256,
}
