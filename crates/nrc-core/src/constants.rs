//! Protocol constants. All monetary values in wei (1 ETH = 10^18 wei).

/// One ether in wei.
pub const ETHER: u128 = 1_000_000_000_000_000_000;

/// Number of piece types (rows of the share accumulator).
pub const PIECE_TYPE_COUNT: usize = 6;

/// First token id after the king range `[0, 2)`.
pub const KING_ID_END: u64 = 2;
/// First token id after the queen range `[2, 12)`.
pub const QUEEN_ID_END: u64 = 12;
/// First token id after the rook range `[12, 62)`.
pub const ROOK_ID_END: u64 = 62;
/// First token id after the knight range `[62, 162)`.
pub const KNIGHT_ID_END: u64 = 162;
/// First token id after the bishop range `[162, 362)`. Pawns run from here upward.
pub const BISHOP_ID_END: u64 = 362;

/// Share weight earned while staked, indexed by piece type (King..Pawn).
///
/// Follows conventional chess piece values; the king, which has no
/// material value on the board, is given the largest weight since only
/// two exist.
pub const SHARE_WEIGHTS: [u64; PIECE_TYPE_COUNT] = [15, 9, 5, 3, 3, 1];

/// Basis-point denominator (10_000 bps = 100%).
pub const BPS_PRECISION: u64 = 10_000;

/// Seconds in one day. The auction curve period defaults to one day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Maximum length in bytes of a staking identifier name.
pub const MAX_IDENTIFIER_LEN: usize = 255;

// --- Ledger configuration defaults ---

/// Price of a single minted token (5 tokens = 0.00002 ETH).
pub const DEFAULT_MINT_PRICE: u64 = 4_000_000_000_000;

/// Price paid per token killed.
pub const DEFAULT_KILL_PRICE: u64 = 40_000_000_000_000;

/// Price of a king-hand reveal request.
pub const DEFAULT_REVEAL_PRICE: u64 = 10_000_000_000_000;

/// Maximum number of tokens in circulation history (kings included).
pub const DEFAULT_MAX_SUPPLY: u64 = 10_000;

/// Maximum tokens minted in a single call.
pub const DEFAULT_MAX_MINT_PER_CALL: u64 = 5;

/// Share of every payment routed to stakers, in bps.
pub const DEFAULT_STAKER_SHARE_BPS: u64 = 5_000;

/// King auction opening price: 10 ETH.
pub const DEFAULT_KING_BASE_PRICE: u64 = 10_000_000_000_000_000_000;

/// King auction floor price: 0.5 ETH.
pub const DEFAULT_KING_FLOOR_PRICE: u64 = 500_000_000_000_000_000;

/// Fraction of the price above the floor retained per period, in bps.
pub const DEFAULT_KING_DECAY_BPS: u64 = 9_000;

/// One in `DEFAULT_KING_HAND_ODDS` reveals is a king hand.
pub const DEFAULT_KING_HAND_ODDS: u64 = 10;

/// Maximum payout of a single king-hand claim: 0.001 ETH.
pub const DEFAULT_KING_HAND_PRIZE: u64 = 1_000_000_000_000_000;
