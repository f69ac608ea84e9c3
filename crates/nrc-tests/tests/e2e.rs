//! End-to-end player flows through the `Ledger` façade.

use nrc_core::constants::{ETHER, SECONDS_PER_DAY};
use nrc_core::error::LedgerError;
use nrc_core::events::LedgerEvent;
use nrc_core::traits::RewardPool;
use nrc_core::types::{Color, PieceType};
use nrc_ledger::LedgerConfig;
use nrc_tests::helpers::*;

// ---------------------------------------------------------------------------
// Staking rewards
// ---------------------------------------------------------------------------

/// Two rooks staked at different epochs share only the inflow that arrives
/// while both are staked.
#[test]
fn e2e_late_rook_earns_only_after_stake() {
    let alice = addr(1);
    let bob = addr(2);
    let config = LedgerConfig {
        mint_price: 0,
        kill_price: 80,
        ..test_config()
    };
    let (ledger, pool) = test_ledger(config);

    mint_through(&ledger, alice, 51);
    let victims = ledger.mint(bob, 5, Color::Black, 0).unwrap();

    ledger.stake(alice, ident(20), 20).unwrap();
    // Overpaying a kill routes the whole payment to stakers.
    ledger.multi_kill(alice, &[victims[0]], 100).unwrap();
    assert_eq!(ledger.advance_epoch().unwrap(), 1);
    assert_eq!(ledger.share_type_accumulator(PieceType::Rook, 1).unwrap(), 100);
    ledger.advance_epoch().unwrap();
    ledger.advance_epoch().unwrap();

    ledger.stake(alice, ident(50), 50).unwrap();
    assert_eq!(ledger.unclaimed_rewards(50).unwrap(), 0);
    ledger.multi_kill(alice, &[victims[1]], 80).unwrap();
    while ledger.epoch() < 7 {
        ledger.advance_epoch().unwrap();
    }

    assert_eq!(ledger.share_type_accumulator_size(), (6, 8));
    assert_eq!(ledger.unclaimed_rewards(50).unwrap(), 40);
    assert_eq!(ledger.unclaimed_rewards(20).unwrap(), 140);

    assert_eq!(ledger.get_reward(alice, 50).unwrap(), 40);
    assert_eq!(ledger.unclaimed_rewards(50).unwrap(), 0);
    assert_eq!(pool.paid_to(&alice), 40);
    assert_eq!(pool.balance(), owed_by_pool(&ledger));
}

#[test]
fn e2e_weights_split_inflow_between_types() {
    let alice = addr(1);
    let (ledger, _) = test_ledger(test_config());
    mint_through(&ledger, alice, 12);

    // One queen (9) and one rook (5): 14 shares, 150 wei of mint revenue.
    ledger.stake(alice, ident(1), 2).unwrap();
    ledger.stake(alice, ident(2), 12).unwrap();
    let undistributed = ledger.with_state(|s| s.undistributed());
    assert_eq!(undistributed, 150);
    ledger.advance_epoch().unwrap();

    // 150 * 9 / 14 = 96, 150 * 5 / 14 = 53, one unit of dust.
    assert_eq!(ledger.unclaimed_rewards(2).unwrap(), 96);
    assert_eq!(ledger.unclaimed_rewards(12).unwrap(), 53);
    assert_eq!(ledger.with_state(|s| s.undistributed()), 1);
}

#[test]
fn e2e_unstake_keeps_rewards_until_claimed() {
    let alice = addr(1);
    let (ledger, pool) = test_ledger(test_config());
    ledger.mint(alice, 1, Color::White, 10).unwrap();

    ledger.stake(alice, ident(1), 2).unwrap();
    ledger.advance_epoch().unwrap();
    assert_eq!(ledger.unstake(alice, 2).unwrap(), 10);
    assert_eq!(ledger.nft_shares(2), 9);

    // New inflow after the unstake does not reach the token.
    ledger.mint(alice, 1, Color::White, 10).unwrap();
    ledger.advance_epoch().unwrap();
    assert_eq!(ledger.unclaimed_rewards(2).unwrap(), 10);

    assert_eq!(ledger.get_reward(alice, 2).unwrap(), 10);
    assert_eq!(ledger.nft_shares(2), 0);
    assert_eq!(pool.paid_to(&alice), 10);
}

#[test]
fn e2e_identifier_reusable_after_unstake() {
    let alice = addr(1);
    let (ledger, _) = test_ledger(test_config());
    ledger.mint(alice, 2, Color::White, 20).unwrap();

    ledger.stake(alice, ident(7), 2).unwrap();
    assert_eq!(
        ledger.stake(alice, ident(7), 3),
        Err(LedgerError::IdentifierInUse(2))
    );
    ledger.unstake(alice, 2).unwrap();
    ledger.stake(alice, ident(7), 3).unwrap();
}

// ---------------------------------------------------------------------------
// Kill and burn
// ---------------------------------------------------------------------------

#[test]
fn e2e_kill_forfeits_and_redistributes() {
    let alice = addr(1);
    let bob = addr(2);
    let (ledger, _) = test_ledger(test_config());
    let a = ledger.mint(alice, 1, Color::White, 10).unwrap();
    let b = ledger.mint(bob, 1, Color::Black, 10).unwrap();

    ledger.stake(alice, ident(1), a[0]).unwrap();
    ledger.stake(bob, ident(2), b[0]).unwrap();
    ledger.advance_epoch().unwrap();
    assert_eq!(ledger.unclaimed_rewards(a[0]).unwrap(), 10);

    let forfeited = ledger.multi_kill(bob, &a, 100).unwrap();
    assert_eq!(forfeited, 10);
    ledger.advance_epoch().unwrap();

    // Bob's queen now receives the kill fee plus Alice's forfeited reward.
    assert_eq!(ledger.unclaimed_rewards(b[0]).unwrap(), 10 + 110);
    assert_eq!(
        ledger.get_reward(alice, a[0]),
        Err(LedgerError::TokenBurnedWithUnclaimedRewards {
            token: a[0],
            forfeited: 10
        })
    );

    let events = ledger.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        LedgerEvent::TokenBurnedWithUnclaimedRewards { forfeited: 10, .. }
    )));
    assert!(events.iter().any(|e| matches!(e, LedgerEvent::Killed { .. })));
}

#[test]
fn e2e_burn_staked_token() {
    let alice = addr(1);
    let (ledger, pool) = test_ledger(test_config());
    ledger.mint(alice, 2, Color::White, 20).unwrap();
    ledger.stake(alice, ident(1), 2).unwrap();
    ledger.advance_epoch().unwrap();

    assert_eq!(ledger.burn(alice, 2).unwrap(), 20);
    assert_eq!(ledger.with_state(|s| s.type_shares(PieceType::Queen)), 0);
    assert_eq!(ledger.with_state(|s| s.undistributed()), 20);
    assert_eq!(pool.balance(), owed_by_pool(&ledger));
}

// ---------------------------------------------------------------------------
// Default pricing
// ---------------------------------------------------------------------------

#[test]
fn e2e_default_prices() {
    let alice = addr(1);
    let bob = addr(2);
    let (ledger, _) = test_ledger(LedgerConfig::default());

    assert!(matches!(
        ledger.mint(alice, 5, Color::White, 19_999_999_999_999),
        Err(LedgerError::InsufficientPayment { .. })
    ));
    let a = ledger.mint(alice, 5, Color::White, 20_000_000_000_000).unwrap();
    ledger.mint(bob, 5, Color::Black, 20_000_000_000_000).unwrap();
    assert!(matches!(
        ledger.mint(alice, 6, Color::White, 24_000_000_000_000),
        Err(LedgerError::InvalidQuantity(6))
    ));

    ledger.multi_kill(bob, &a[..2], 80_000_000_000_000).unwrap();
    let request = ledger.reveal_king_hand(alice, a[2], 10_000_000_000_000).unwrap();
    ledger.fulfill_reveal(request, 0).unwrap();
    assert_eq!(ledger.claim_king_hand(alice, a[2]).unwrap(), 10_000_000_000_000);
}

#[test]
fn e2e_king_auction_decays_daily() {
    let start = 1_700_000_000;
    let (ledger, _) = test_ledger(LedgerConfig {
        auction_start: start,
        ..LedgerConfig::default()
    });

    assert_eq!(ledger.current_price(start).unwrap(), 10 * ETHER);
    let day_one = ledger.current_price(start + SECONDS_PER_DAY).unwrap();
    let day_two = ledger.current_price(start + 2 * SECONDS_PER_DAY).unwrap();
    assert!(day_one < 10 * ETHER && day_two < day_one);
    assert!(ledger.current_price(start + 3_650 * SECONDS_PER_DAY).unwrap() >= ETHER / 2);

    let buyer = addr(3);
    assert!(matches!(
        ledger.buy_king(buyer, Color::Black, day_one, start - 1),
        Err(LedgerError::AuctionNotStarted { .. })
    ));
    let king = ledger
        .buy_king(buyer, Color::Black, day_one, start + SECONDS_PER_DAY)
        .unwrap();
    assert_eq!(king, 1);
    assert_eq!(ledger.piece_type(king), PieceType::King);
    assert_eq!(
        ledger.buy_king(buyer, Color::Black, 10 * ETHER, start),
        Err(LedgerError::KingAlreadySold(1))
    );
}

// ---------------------------------------------------------------------------
// King hand
// ---------------------------------------------------------------------------

#[test]
fn e2e_king_hand_pot_bounds_prize() {
    let alice = addr(1);
    let bob = addr(2);
    let (ledger, pool) = test_ledger(test_config());
    ledger.mint(alice, 1, Color::White, 10).unwrap();
    ledger.mint(bob, 1, Color::Black, 10).unwrap();

    let ra = ledger.reveal_king_hand(alice, 2, 50).unwrap();
    let rb = ledger.reveal_king_hand(bob, 3, 50).unwrap();
    assert!(ledger.fulfill_reveal(ra, 10).unwrap());
    assert!(ledger.fulfill_reveal(rb, 20).unwrap());

    // Pot of 100: first winner takes the full prize, second what is left.
    assert_eq!(ledger.claim_king_hand(alice, 2).unwrap(), 70);
    assert_eq!(ledger.claim_king_hand(bob, 3).unwrap(), 30);
    assert_eq!(pool.paid_to(&bob), 30);
    assert_eq!(ledger.with_state(|s| s.king_hand_pot()), 0);
}

#[test]
fn e2e_killed_token_loses_pending_reveal() {
    let alice = addr(1);
    let bob = addr(2);
    let (ledger, _) = test_ledger(test_config());
    ledger.mint(alice, 1, Color::White, 10).unwrap();

    let request = ledger.reveal_king_hand(alice, 2, 50).unwrap();
    ledger.multi_kill(bob, &[2], 100).unwrap();
    assert!(matches!(
        ledger.fulfill_reveal(request, 0),
        Err(LedgerError::UnknownRequest(_))
    ));
}

#[test]
fn e2e_events_serialize_to_json() {
    let alice = addr(1);
    let (ledger, _) = test_ledger(test_config());
    ledger.mint(alice, 1, Color::White, 10).unwrap();
    ledger.stake(alice, ident(1), 2).unwrap();
    ledger.advance_epoch().unwrap();

    let lines: Vec<String> = ledger
        .drain_events()
        .iter()
        .map(|e| serde_json::to_string(e).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains("1.eth"));
    assert!(lines[2].contains("EpochAdvanced"));
}
