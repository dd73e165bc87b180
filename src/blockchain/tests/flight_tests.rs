use super::*;
use crate::errors::SuretyError;

#[test]
fn test_register_and_list_in_order() {
    let mut registry = FlightRegistry::new();
    for name in ["ND1309", "ND1310", "AA0001"] {
        registry.register_flight(genesis(), FLIGHT_TS, FlightId::from(name)).unwrap();
    }
    let listed: Vec<String> = registry.list_flights().map(|f| f.to_string()).collect();
    assert_eq!(listed, vec!["ND1309", "ND1310", "AA0001"]);
    assert_eq!(registry.len(), 3);

    let flight = registry.flight(&flight_id()).unwrap();
    assert_eq!(flight.status, FlightStatus::Unknown);
    assert!(!flight.status_finalized);
}

#[test]
fn test_flight_ids_globally_unique() {
    let mut registry = FlightRegistry::new();
    registry.register_flight(addr(1), FLIGHT_TS, flight_id()).unwrap();
    let result = registry.register_flight(addr(2), FLIGHT_TS + 60, flight_id());
    assert!(matches!(result, Err(SuretyError::Duplicate(_))));
    assert_eq!(registry.flight(&flight_id()).unwrap().airline, addr(1));
}

#[test]
fn test_matches_requires_airline_and_timestamp() {
    let mut registry = FlightRegistry::new();
    registry.register_flight(addr(1), FLIGHT_TS, flight_id()).unwrap();
    assert!(registry.matches(&addr(1), &flight_id(), FLIGHT_TS));
    assert!(!registry.matches(&addr(2), &flight_id(), FLIGHT_TS));
    assert!(!registry.matches(&addr(1), &flight_id(), FLIGHT_TS + 1));
    assert!(!registry.matches(&addr(1), &FlightId::from("XX0000"), FLIGHT_TS));
}

#[test]
fn test_set_status_first_finalization_wins() {
    let mut registry = FlightRegistry::new();
    registry.register_flight(addr(1), FLIGHT_TS, flight_id()).unwrap();

    assert!(matches!(
        registry.set_status(&flight_id(), FLIGHT_TS + 1, FlightStatus::OnTime),
        Err(SuretyError::UnknownFlight(_))
    ));
    assert_eq!(registry.set_status(&flight_id(), FLIGHT_TS, FlightStatus::LateAirline), Ok(true));
    assert_eq!(registry.set_status(&flight_id(), FLIGHT_TS, FlightStatus::OnTime), Ok(false));

    let flight = registry.flight(&flight_id()).unwrap();
    assert_eq!(flight.status, FlightStatus::LateAirline);
    assert!(flight.status_finalized);
}

#[test]
fn test_unknown_status_leaves_flight_open() {
    let mut registry = FlightRegistry::new();
    registry.register_flight(addr(1), FLIGHT_TS, flight_id()).unwrap();

    assert_eq!(registry.set_status(&flight_id(), FLIGHT_TS, FlightStatus::Unknown), Ok(false));
    assert!(!registry.flight(&flight_id()).unwrap().status_finalized);

    assert_eq!(registry.set_status(&flight_id(), FLIGHT_TS, FlightStatus::OnTime), Ok(true));
    assert_eq!(registry.flight(&flight_id()).unwrap().status, FlightStatus::OnTime);
}

#[test]
fn test_status_codes() {
    assert_eq!(FlightStatus::from_code(20), Some(FlightStatus::LateAirline));
    assert_eq!(FlightStatus::from_code(25), None);
    assert!(FlightStatus::ALL.iter().all(|s| FlightStatus::from_code(s.code()) == Some(*s)));
    assert_eq!(
        FlightStatus::ALL.iter().filter(|s| s.triggers_payout()).count(),
        1
    );
}

#[test]
fn test_address_and_flight_id_rendering() {
    let address: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
    assert_eq!(address, addr(255));
    assert_eq!(address.to_string(), "0x00000000000000000000000000000000000000ff");
    assert!("0x1234".parse::<Address>().is_err());

    let json = serde_json::to_string(&address).unwrap();
    assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), address);

    assert_eq!(FlightId::new(vec![0xff, 0x00]).to_string(), "0xff00");
}
