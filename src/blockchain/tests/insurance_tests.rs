use super::*;
use crate::blockchain::insurance::PayoutTerms;
use crate::blockchain::treasury::DepositKind;
use crate::errors::SuretyError;

fn insurance() -> InsuranceLedger {
    InsuranceLedger::new(PayoutTerms::from_params(&ProtocolParams::default()))
}

#[test]
fn test_premium_capped_per_insuree_and_flight() {
    let mut ledger = insurance();
    let passenger = addr(42);

    assert!(matches!(
        ledger.buy_insurance(passenger, &flight_id(), UNIT + 1),
        Err(SuretyError::PremiumTooHigh { .. })
    ));

    ledger.buy_insurance(passenger, &flight_id(), UNIT / 2).unwrap();
    ledger.buy_insurance(passenger, &flight_id(), UNIT / 2).unwrap();
    assert_eq!(ledger.policy(&passenger, &flight_id()).unwrap().premium_paid, UNIT);

    let over = ledger.buy_insurance(passenger, &flight_id(), 1);
    assert_eq!(
        over,
        Err(SuretyError::PremiumTooHigh {
            premium: 1,
            total: UNIT + 1,
            max: UNIT
        })
    );

    // The cap is per flight and per insuree.
    ledger.buy_insurance(passenger, &FlightId::from("ND1310"), UNIT).unwrap();
    ledger.buy_insurance(addr(43), &flight_id(), UNIT).unwrap();
    assert_eq!(ledger.policies_for_flight(&flight_id()).len(), 2);
}

#[test]
fn test_zero_premium_rejected() {
    let mut ledger = insurance();
    assert_eq!(ledger.buy_insurance(addr(42), &flight_id(), 0), Err(SuretyError::InvalidAmount));
    assert!(ledger.policy(&addr(42), &flight_id()).is_none());
}

#[test]
fn test_credit_is_one_and_a_half_times_premium() {
    let mut ledger = insurance();
    ledger.buy_insurance(addr(42), &flight_id(), UNIT).unwrap();
    ledger.buy_insurance(addr(43), &flight_id(), 1).unwrap();

    let mut credited = ledger.credit_insurees(&flight_id());
    credited.sort();
    assert_eq!(credited, vec![(addr(42), UNIT * 3 / 2), (addr(43), 1)]);
    assert_eq!(ledger.credit_of(&addr(42)), 1_500_000_000);

    // Second crediting pass is a no-op.
    assert!(ledger.credit_insurees(&flight_id()).is_empty());
    assert_eq!(ledger.credit_of(&addr(42)), 1_500_000_000);
}

#[test]
fn test_credit_aggregates_across_flights() {
    let mut ledger = insurance();
    let other = FlightId::from("ND1310");
    ledger.buy_insurance(addr(42), &flight_id(), UNIT).unwrap();
    ledger.buy_insurance(addr(42), &other, UNIT / 2).unwrap();
    ledger.credit_insurees(&flight_id());
    ledger.credit_insurees(&other);
    assert_eq!(ledger.credit_of(&addr(42)), UNIT * 3 / 2 + UNIT * 3 / 4);

    let paid = ledger.withdraw_credit(&addr(42)).unwrap();
    assert_eq!(paid, UNIT * 9 / 4);
    assert_eq!(ledger.credit_of(&addr(42)), 0);
    assert_eq!(ledger.policy(&addr(42), &other).unwrap().credit_owed, 0);
    assert!(matches!(ledger.withdraw_credit(&addr(42)), Err(SuretyError::NothingOwed(_))));
}

#[test]
fn test_treasury_refuses_uncovered_payout() {
    let mut treasury = Treasury::new();
    treasury.deposit(DepositKind::Premium, addr(42), UNIT);
    assert_eq!(
        treasury.pay_out(addr(42), 2 * UNIT),
        Err(SuretyError::InsufficientFunds {
            owed: 2 * UNIT,
            available: UNIT
        })
    );
    treasury.pay_out(addr(42), UNIT / 4).unwrap();
    assert_eq!(treasury.balance, UNIT * 3 / 4);
    assert_eq!(treasury.paid_to(&addr(42)), UNIT / 4);
    assert_eq!(treasury.history.len(), 2);
}

#[test]
fn test_top_up_rejection_reports_increment_and_total() {
    let mut ledger = insurance();
    ledger.buy_insurance(addr(42), &flight_id(), UNIT).unwrap();

    let err = ledger.buy_insurance(addr(42), &flight_id(), UNIT / 2).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Premium too high: 500000000 brings the policy to 1500000000, maximum 1000000000"
    );
}
