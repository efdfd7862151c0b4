//! Ledger and referral integration tests: balance/entry-stream consistency,
//! withdrawal guards, and the one-time two-sided referral bonus.

mod common;

use common::{engine, seed_policy, seed_user};
use rewards_engine::models::{LedgerEntryKind, PayoutMethod};
use rewards_engine::EngineError;
use uuid::Uuid;

#[tokio::test]
async fn balance_is_always_the_sum_of_entries() {
    let eng = engine();
    let user = seed_user(&eng);
    let content = seed_policy(&eng, 100, 600);

    let session = eng.manager.start(user, content).await.unwrap().session_id;
    eng.manager.update(session, user, 300, 1).await.unwrap();
    eng.ledger
        .credit(user, 2000, LedgerEntryKind::Earning, None)
        .unwrap();
    eng.ledger
        .withdraw(
            user,
            1000,
            &PayoutMethod::Paypal {
                email: "user@example.com".into(),
            },
        )
        .unwrap();

    let balance = eng.ledger.balance(user).unwrap();
    assert_eq!(balance, 50 + 2000 - 1000);
    assert_eq!(eng.ledger.audited_balance(user).unwrap(), balance);
}

#[tokio::test]
async fn withdrawal_over_balance_is_rejected() {
    let eng = engine();
    let user = seed_user(&eng);
    eng.ledger
        .credit(user, 1200, LedgerEntryKind::Earning, None)
        .unwrap();

    let err = eng
        .ledger
        .withdraw(
            user,
            1500,
            &PayoutMethod::BankTransfer {
                account: "DE02100100100006820101".into(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientBalance {
            balance: 1200,
            requested: 1500
        }
    ));
    assert_eq!(eng.ledger.balance(user).unwrap(), 1200);
}

#[tokio::test]
async fn withdrawal_below_minimum_is_rejected() {
    let eng = engine();
    let user = seed_user(&eng);
    eng.ledger
        .credit(user, 5000, LedgerEntryKind::Earning, None)
        .unwrap();

    let err = eng
        .ledger
        .withdraw(
            user,
            999,
            &PayoutMethod::MobileMoney {
                msisdn: "+254700000001".into(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert_eq!(eng.ledger.balance(user).unwrap(), 5000);
}

#[tokio::test]
async fn malformed_payout_method_never_reaches_the_ledger() {
    let eng = engine();
    let user = seed_user(&eng);
    eng.ledger
        .credit(user, 5000, LedgerEntryKind::Earning, None)
        .unwrap();

    let err = eng
        .ledger
        .withdraw(
            user,
            2000,
            &PayoutMethod::Paypal {
                email: "not-an-email".into(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPayoutMethod(_)));
    assert_eq!(eng.ledger.entries_page(user, 0, 10).unwrap().len(), 1);
}

#[tokio::test]
async fn accepted_withdrawal_appends_a_negative_entry() {
    let eng = engine();
    let user = seed_user(&eng);
    eng.ledger
        .credit(user, 5000, LedgerEntryKind::Earning, None)
        .unwrap();

    let entry = eng
        .ledger
        .withdraw(
            user,
            1500,
            &PayoutMethod::Paypal {
                email: "user@example.com".into(),
            },
        )
        .unwrap();
    assert_eq!(entry.kind, LedgerEntryKind::Withdrawal);
    assert_eq!(entry.amount, -1500);
    assert_eq!(eng.ledger.balance(user).unwrap(), 3500);
}

#[tokio::test]
async fn credits_reject_negative_amounts() {
    let eng = engine();
    let user = seed_user(&eng);

    let err = eng
        .ledger
        .credit(user, -5, LedgerEntryKind::LevelBonus, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn entries_are_paginated_newest_first() {
    let eng = engine();
    let user = seed_user(&eng);
    for amount in 1..=5 {
        eng.ledger
            .credit(user, amount, LedgerEntryKind::Earning, None)
            .unwrap();
    }

    let first_page = eng.ledger.entries_page(user, 0, 2).unwrap();
    let second_page = eng.ledger.entries_page(user, 1, 2).unwrap();
    assert_eq!(
        first_page.iter().map(|e| e.amount).collect::<Vec<_>>(),
        vec![5, 4]
    );
    assert_eq!(
        second_page.iter().map(|e| e.amount).collect::<Vec<_>>(),
        vec![3, 2]
    );
}

#[tokio::test]
async fn referral_credits_both_sides_once() {
    let eng = engine();
    let referrer = seed_user(&eng);
    let newcomer = seed_user(&eng);
    let code = eng.accounts.get(referrer).unwrap().referral_code;

    let outcome = eng.referral.register(newcomer, &code).unwrap();
    assert_eq!(outcome.referrer_id, referrer);
    assert_eq!(outcome.bonus_each, 50);

    assert_eq!(eng.ledger.balance(newcomer).unwrap(), 50);
    assert_eq!(eng.ledger.balance(referrer).unwrap(), 50);

    let referrer_account = eng.accounts.get(referrer).unwrap();
    assert_eq!(referrer_account.referral_earnings, 50);
    let newcomer_account = eng.accounts.get(newcomer).unwrap();
    assert_eq!(newcomer_account.referred_by, Some(referrer));

    // A second registration attempt must not double-pay either side.
    let err = eng.referral.register(newcomer, &code).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyReferred(_)));
    assert_eq!(eng.ledger.balance(newcomer).unwrap(), 50);
    assert_eq!(eng.ledger.balance(referrer).unwrap(), 50);
}

#[tokio::test]
async fn unknown_referral_code_degrades_gracefully() {
    let eng = engine();
    let newcomer = seed_user(&eng);

    let err = eng.referral.register(newcomer, "NOSUCH").unwrap_err();
    assert!(matches!(err, EngineError::UnknownReferralCode(_)));

    // The account itself is untouched: registration proceeds without bonus.
    let account = eng.accounts.get(newcomer).unwrap();
    assert_eq!(account.balance, 0);
    assert_eq!(account.referred_by, None);
    assert!(eng.ledger.entries_page(newcomer, 0, 10).unwrap().is_empty());
}

#[tokio::test]
async fn own_referral_code_is_not_redeemable() {
    let eng = engine();
    let user = seed_user(&eng);
    let code = eng.accounts.get(user).unwrap().referral_code;

    let err = eng.referral.register(user, &code).unwrap_err();
    assert!(matches!(err, EngineError::UnknownReferralCode(_)));
    assert_eq!(eng.ledger.balance(user).unwrap(), 0);
}

#[tokio::test]
async fn unknown_user_operations_are_not_found() {
    let eng = engine();
    let ghost = Uuid::new_v4();

    assert!(matches!(
        eng.ledger.balance(ghost).unwrap_err(),
        EngineError::NotFound(_)
    ));
    assert!(matches!(
        eng.ledger
            .credit(ghost, 10, LedgerEntryKind::Earning, None)
            .unwrap_err(),
        EngineError::NotFound(_)
    ));
}
