//! Tests against a real store on the loopback address.
//!
//! Run with `cargo test -p pkv-bench --test live -- --ignored` while a
//! Redis-compatible server listens on 127.0.0.1:6379.

use rand::rngs::StdRng;
use rand::SeedableRng;

use pkv_bench::{probe, ScalarBackend, Scenario, ScenarioCase, ScenarioKind, Session};
use pkv_client::{KVClient, DEFAULT_ADDR};

fn session() -> Session<KVClient> {
    let session = Session::new(KVClient::connect(DEFAULT_ADDR));
    probe::probe(&*session, DEFAULT_ADDR).expect("store reachable");
    session
}

#[test]
#[ignore = "needs a store on 127.0.0.1:6379"]
fn get_of_missing_key_is_none() {
    let session = session();
    assert_eq!(session.get(b"dont_exists").expect("get"), None);
}

#[test]
#[ignore = "needs a store on 127.0.0.1:6379"]
fn scenario_against_live_store() {
    let session = session();
    let case = ScenarioCase::new("long_key", ScenarioKind::Scalar, 100);
    let mut scenario = Scenario::new(case, ScalarBackend::new(&*session), StdRng::from_entropy());

    scenario.setup(1000).expect("setup");
    let key = scenario.pick_key().expect("pick");
    for _ in 0..100 {
        scenario.lookup_fixed(&key).expect("lookup");
    }
    let keys = scenario.keys().to_vec();
    scenario.teardown().expect("teardown");

    for key in &keys {
        assert_eq!(session.get(key.as_bytes()).expect("get"), None);
    }
}
