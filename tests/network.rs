use epinet::{Compartment, Model, Network, NetworkError, Sigmoid, ThresholdPolicy, TimeRange};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

fn assert_exclusive(network: &Network) {
    for agent in network.agents() {
        let flags = [
            agent.is_susceptible(),
            agent.is_infectious(),
            agent.is_recovered(),
        ];
        assert_eq!(flags.iter().filter(|&&flag| flag).count(), 1);
    }
}

#[test]
fn compartments_stay_exclusive_over_a_run() {
    let mut rng = ChaCha12Rng::seed_from_u64(3);
    let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (0, 2)];
    let mut network = Network::with_defaults(
        5,
        &edges,
        Model::Sirs,
        ThresholdPolicy::Relative,
        TimeRange { start: 1, stop: 4 },
        &mut rng,
    )
    .unwrap();
    network.seed_infection(0).unwrap();
    let decision = Sigmoid::default();

    for _ in 0..30 {
        assert_exclusive(&network);
        for v in network.select(Compartment::Susceptible) {
            network
                .attempt_infection(v, false, &decision, &mut rng)
                .unwrap();
        }
        assert_exclusive(&network);
        network.advance_infectious().unwrap();
        network.advance_recovered().unwrap();
    }
    assert_exclusive(&network);
}

#[test]
fn absolute_threshold_on_a_path() {
    let mut network =
        Network::new(3, &[(0, 1), (1, 2)], Model::Sir, ThresholdPolicy::Absolute).unwrap();
    network.set_threshold_value(1, 1.0).unwrap();
    network.seed_infection(0).unwrap();
    let mut rng = ChaCha12Rng::seed_from_u64(0);

    let untouched = network.agent(2).unwrap().clone();
    assert!(
        network
            .attempt_infection(1, true, &Sigmoid::default(), &mut rng)
            .unwrap()
    );
    assert!(network.agent(1).unwrap().is_infectious());
    assert_eq!(network.agent(2).unwrap(), &untouched);
}

#[test]
fn full_security_always_resists() {
    let mut network = Network::new(2, &[(0, 1)], Model::Sirs, ThresholdPolicy::Relative).unwrap();
    network.set_security(1, 1.0).unwrap();
    network.seed_infection(0).unwrap();
    for seed in 0..64 {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        assert!(
            !network
                .attempt_infection(1, false, &Sigmoid::default(), &mut rng)
                .unwrap()
        );
    }
    assert!(network.agent(1).unwrap().is_susceptible());
}

#[test]
fn final_size_stays_zero_without_infection() {
    let mut rng = ChaCha12Rng::seed_from_u64(5);
    let mut network = Network::with_defaults(
        6,
        &[(0, 1), (1, 2), (3, 4)],
        Model::Sirs,
        ThresholdPolicy::Probabilistic,
        TimeRange::default(),
        &mut rng,
    )
    .unwrap();
    assert_eq!(network.final_size(), 0);
    for _ in 0..10 {
        network.tick(true).unwrap();
    }
    assert_eq!(network.final_size(), 0);
    assert_eq!(network.relative_size(), Ok(0.0));
}

#[test]
fn expected_infections_is_one_without_security() {
    let mut rng = ChaCha12Rng::seed_from_u64(8);
    let mut network = Network::with_defaults(
        7,
        &[(0, 1)],
        Model::Sirs,
        ThresholdPolicy::Relative,
        TimeRange::default(),
        &mut rng,
    )
    .unwrap();
    for v in 0..7 {
        network.set_security(v, 0.0).unwrap();
    }
    assert!((network.expected_infections() - 1.0).abs() < 1e-12);
}

#[test]
fn estimator_leaves_network_untouched() {
    let mut rng = ChaCha12Rng::seed_from_u64(21);
    let network = Network::with_defaults(
        5,
        &[(0, 1), (1, 2), (2, 3), (3, 0), (3, 4)],
        Model::Sirs,
        ThresholdPolicy::Relative,
        TimeRange::default(),
        &mut rng,
    )
    .unwrap();
    let before = network.clone();

    let effect = network.compute_network_effect(4, &mut rng).unwrap();
    assert!(effect.is_finite() && effect >= 0.0);
    assert_eq!(network, before);

    let err = network.compute_network_effect(9, &mut rng).unwrap_err();
    assert!(err.is_topology());
    assert_eq!(network, before);
}

#[test]
fn single_vertex_infection_probability() {
    let mut rng = ChaCha12Rng::seed_from_u64(2);
    let network = Network::with_defaults(
        1,
        &[],
        Model::Sir,
        ThresholdPolicy::Absolute,
        TimeRange::default(),
        &mut rng,
    )
    .unwrap();
    let attack_decision = network.agent(0).unwrap().attack_decision();
    assert_eq!(attack_decision, 1.0);
    assert_eq!(
        network.compute_infection_probability(0, &mut rng),
        Ok(attack_decision)
    );
}

#[test]
fn transmissibility_requires_an_edge() {
    let network = Network::new(3, &[(0, 1)], Model::Sir, ThresholdPolicy::Relative).unwrap();
    assert_eq!(
        network.transmissibility(1, 2),
        Err(NetworkError::NoSuchEdge(1, 2))
    );
}

fn transmissibility(rate: f64, infectious_time: u32) -> f64 {
    let mut network = Network::new(2, &[(0, 1)], Model::Sir, ThresholdPolicy::Relative).unwrap();
    network.set_rate(0, 1, rate).unwrap();
    network.set_infectious_time(0, infectious_time).unwrap();
    network.transmissibility(0, 1).unwrap()
}

proptest! {
    #[test]
    fn transmissibility_is_bounded(rate in 0.0f64..=1.0, time in 1u32..20) {
        let value = transmissibility(rate, time);
        prop_assert!((0.0..1.0).contains(&value));
        prop_assert_eq!(transmissibility(0.0, time), 0.0);
    }

    #[test]
    fn transmissibility_grows_with_rate_and_time(
        rate in 0.01f64..0.5,
        delta in 0.01f64..0.5,
        time in 1u32..20
    ) {
        prop_assert!(transmissibility(rate + delta, time) > transmissibility(rate, time));
        prop_assert!(transmissibility(rate, time + 1) > transmissibility(rate, time));
    }
}
