//! Core ledger types: tokens, piece types, colors, addresses, identifiers.
//!
//! Token ids are plain `u64`; the piece type of a token is a pure function
//! of its id and never changes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BISHOP_ID_END, KING_ID_END, KNIGHT_ID_END, MAX_IDENTIFIER_LEN, PIECE_TYPE_COUNT,
    QUEEN_ID_END, ROOK_ID_END, SHARE_WEIGHTS,
};
use crate::error::LedgerError;

/// Token identifier.
pub type TokenId = u64;

/// Epoch counter value.
pub type Epoch = u64;

/// One of the six token classes, in accumulator row order.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Knight,
    Bishop,
    Pawn,
}

impl PieceType {
    /// All piece types in row order.
    pub const ALL: [PieceType; PIECE_TYPE_COUNT] = [
        PieceType::King,
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Pawn,
    ];

    /// Classify a token id by the fixed id ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use nrc_core::types::PieceType;
    /// assert_eq!(PieceType::from_token_id(1), PieceType::King);
    /// assert_eq!(PieceType::from_token_id(12), PieceType::Rook);
    /// assert_eq!(PieceType::from_token_id(362), PieceType::Pawn);
    /// ```
    pub fn from_token_id(token: TokenId) -> Self {
        match token {
            t if t < KING_ID_END => Self::King,
            t if t < QUEEN_ID_END => Self::Queen,
            t if t < ROOK_ID_END => Self::Rook,
            t if t < KNIGHT_ID_END => Self::Knight,
            t if t < BISHOP_ID_END => Self::Bishop,
            _ => Self::Pawn,
        }
    }

    /// Row index in the share accumulator.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Piece type for a row index, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Share weight a staked token of this type earns.
    pub fn share_weight(self) -> u64 {
        SHARE_WEIGHTS[self.index()]
    }

    /// Half-open id range `[start, end)` of this type. Pawns end at `u64::MAX`.
    pub fn id_range(self) -> (TokenId, TokenId) {
        match self {
            Self::King => (0, KING_ID_END),
            Self::Queen => (KING_ID_END, QUEEN_ID_END),
            Self::Rook => (QUEEN_ID_END, ROOK_ID_END),
            Self::Knight => (ROOK_ID_END, KNIGHT_ID_END),
            Self::Bishop => (KNIGHT_ID_END, BISHOP_ID_END),
            Self::Pawn => (BISHOP_ID_END, u64::MAX),
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::King => "King",
            Self::Queen => "Queen",
            Self::Rook => "Rook",
            Self::Knight => "Knight",
            Self::Bishop => "Bishop",
            Self::Pawn => "Pawn",
        };
        f.write_str(name)
    }
}

/// Side a player mints for. Each color has exactly one king.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Token id of this color's king.
    pub fn king_id(self) -> TokenId {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }

    /// Parse the numeric color choice used by callers (0 = white, 1 = black).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::White),
            1 => Some(Self::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
        }
    }
}

/// A 20-byte account address.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// A 32-byte hash value (identifier namehashes, reveal request ids).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A named staking target: the precomputed namehash plus raw name bytes.
///
/// Hashing the name is the caller's concern; the ledger only checks that
/// both parts are present and the name is within length bounds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub hash: Hash256,
    pub name: Vec<u8>,
}

impl Identifier {
    /// Build a validated identifier.
    pub fn new(hash: Hash256, name: impl Into<Vec<u8>>) -> Result<Self, LedgerError> {
        let name = name.into();
        if hash.is_zero() {
            return Err(LedgerError::InvalidIdentifier("zero hash".into()));
        }
        if name.is_empty() {
            return Err(LedgerError::InvalidIdentifier("empty name".into()));
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(LedgerError::InvalidIdentifier(format!(
                "name length {} > {MAX_IDENTIFIER_LEN}",
                name.len()
            )));
        }
        Ok(Self { hash, name })
    }

    /// Name as text, with invalid UTF-8 replaced.
    pub fn display_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

/// Identifier of a pending king-hand reveal.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub Hash256);

impl RequestId {
    /// Derive a request id from the token and a per-ledger nonce.
    pub fn derive(token: TokenId, nonce: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"NRC_REVEAL_REQUEST_V1");
        hasher.update(&token.to_le_bytes());
        hasher.update(&nonce.to_le_bytes());
        Self(Hash256(*hasher.finalize().as_bytes()))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piece_type_boundaries() {
        assert_eq!(PieceType::from_token_id(0), PieceType::King);
        assert_eq!(PieceType::from_token_id(1), PieceType::King);
        assert_eq!(PieceType::from_token_id(2), PieceType::Queen);
        assert_eq!(PieceType::from_token_id(11), PieceType::Queen);
        assert_eq!(PieceType::from_token_id(12), PieceType::Rook);
        assert_eq!(PieceType::from_token_id(61), PieceType::Rook);
        assert_eq!(PieceType::from_token_id(62), PieceType::Knight);
        assert_eq!(PieceType::from_token_id(161), PieceType::Knight);
        assert_eq!(PieceType::from_token_id(162), PieceType::Bishop);
        assert_eq!(PieceType::from_token_id(361), PieceType::Bishop);
        assert_eq!(PieceType::from_token_id(362), PieceType::Pawn);
        assert_eq!(PieceType::from_token_id(u64::MAX), PieceType::Pawn);
    }

    #[test]
    fn piece_type_index_roundtrip() {
        for (i, piece) in PieceType::ALL.iter().enumerate() {
            assert_eq!(piece.index(), i);
            assert_eq!(PieceType::from_index(i), Some(*piece));
        }
        assert_eq!(PieceType::from_index(6), None);
    }

    #[test]
    fn id_ranges_agree_with_classifier() {
        for piece in PieceType::ALL {
            let (start, end) = piece.id_range();
            assert_eq!(PieceType::from_token_id(start), piece);
            assert_eq!(PieceType::from_token_id(end - 1), piece);
        }
    }

    #[test]
    fn rook_weight_is_five() {
        assert_eq!(PieceType::Rook.share_weight(), 5);
    }

    #[test]
    fn king_ids_by_color() {
        assert_eq!(Color::White.king_id(), 0);
        assert_eq!(Color::Black.king_id(), 1);
        assert_eq!(Color::from_index(1), Some(Color::Black));
        assert_eq!(Color::from_index(2), None);
    }

    #[test]
    fn address_hex_roundtrip() {
        let addr: Address = "0xc13fe2beb055360321feb150e75cdcb473bec65b".parse().unwrap();
        assert_eq!(addr.to_string(), "0xc13fe2beb055360321feb150e75cdcb473bec65b");
        let bare: Address = "c13fe2beb055360321feb150e75cdcb473bec65b".parse().unwrap();
        assert_eq!(addr, bare);
    }

    #[test]
    fn address_rejects_bad_length() {
        assert!("0x1234".parse::<Address>().is_err());
    }

    #[test]
    fn identifier_validation() {
        let hash = Hash256([7; 32]);
        assert!(Identifier::new(hash, b"121.eth".to_vec()).is_ok());
        assert!(matches!(
            Identifier::new(hash, Vec::new()),
            Err(LedgerError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            Identifier::new(Hash256::ZERO, b"121.eth".to_vec()),
            Err(LedgerError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            Identifier::new(hash, vec![b'a'; MAX_IDENTIFIER_LEN + 1]),
            Err(LedgerError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn identifier_display_name() {
        let id = Identifier::new(Hash256([1; 32]), "17921.eth").unwrap();
        assert_eq!(id.display_name(), "17921.eth");
    }

    #[test]
    fn request_ids_are_distinct() {
        let a = RequestId::derive(400, 0);
        let b = RequestId::derive(400, 1);
        let c = RequestId::derive(401, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, RequestId::derive(400, 0));
    }
}
