extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, Env, IntoVal, TryIntoVal,
};

use crate::{CrowdfundingContract, CrowdfundingContractClient};

fn setup_with_init() -> (Env, CrowdfundingContractClient<'static>) {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(CrowdfundingContract, ());
    let client = CrowdfundingContractClient::new(&env, &contract_id);
    client.initialize(&1_000i128, &86_400u64);
    (env, client)
}

#[test]
fn test_donation_event() {
    let (env, client) = setup_with_init();
    let donor = Address::generate(&env);

    client.donate(&donor, &250i128);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("donation"), donor)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("donation").into_val(&env),
        donor.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    // Data: the donated amount
    let amount: i128 = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(amount, 250);
}

#[test]
fn test_initialize_emits_no_event() {
    let (env, _client) = setup_with_init();
    assert_eq!(env.events().all().len(), 0);
}

#[test]
fn test_rejected_donation_emits_no_event() {
    let (env, client) = setup_with_init();
    let donor = Address::generate(&env);

    let _ = client.try_donate(&donor, &0i128);

    assert_eq!(env.events().all().len(), 0);
}
