//! Black-box tests against the public API: a brute-force oracle comparison
//! over random rule sets, endpoint-boundary coverage, and the concurrency
//! contract (a classifier is safely shared across reader threads while a
//! new one is being built to replace it).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use fis_classify::{build, Interval, Rule};
use rand::Rng;

type Action = usize;

fn naive_best(rules: &[Rule<2, Action>], value: [u32; 2]) -> Option<Action> {
    rules
        .iter()
        .filter(|r| r.is_active())
        .filter(|r| {
            let fwd = r.field[0].contains_range(value[0], value[0].wrapping_add(1))
                && r.field[1].contains_range(value[1], value[1].wrapping_add(1));
            let rev = r.inverse_field.as_ref().is_some_and(|inv| {
                inv[0].contains_range(value[0], value[0].wrapping_add(1))
                    && inv[1].contains_range(value[1], value[1].wrapping_add(1))
            });
            fwd || rev
        })
        .min_by_key(|r| r.cost)
        .map(|r| r.action)
}

fn random_rules(n: usize, seed: u64) -> Vec<Rule<2, Action>> {
    // rand::rngs::StdRng is seedable and deterministic across platforms,
    // which is what a reproducible property test needs.
    use rand::{rngs::StdRng, SeedableRng};
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let make_dim = |rng: &mut StdRng| -> Interval {
                match rng.gen_range(0..3) {
                    0 => Interval::make_anytoany(),
                    1 => {
                        let begin = rng.gen_range(1..900);
                        let span = rng.gen_range(1..100);
                        Interval::make_range(begin, begin + span)
                    }
                    _ => Interval::make_range_set(
                        (0..2)
                            .map(|_| {
                                let begin = rng.gen_range(1..900);
                                (begin, begin + rng.gen_range(1..50))
                            })
                            .collect(),
                    ),
                }
            };
            let field = [make_dim(&mut rng), make_dim(&mut rng)];
            let cost = rng.gen_range(1..1000);
            if rng.gen_bool(0.3) {
                let inverse_field = [make_dim(&mut rng), make_dim(&mut rng)];
                Rule::bidirectional(&format!("r{i}"), field, inverse_field, cost, i)
            } else {
                Rule::new(&format!("r{i}"), field, cost, i)
            }
        })
        .collect()
}

#[test]
fn matches_naive_oracle_over_random_rulesets() {
    for seed in 0..12u64 {
        let rules = random_rules(40, seed);
        let classifier = build(rules.clone(), 1).unwrap().unwrap();

        use rand::{rngs::StdRng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(seed ^ 0xa5a5);
        for _ in 0..300 {
            let value = [rng.gen_range(0..1000), rng.gen_range(0..1000)];
            let got = classifier.query(value).map(|r| r.action);
            let want = naive_best(&rules, value);
            assert_eq!(got, want, "seed {seed} value {value:?}");
        }
    }
}

#[test]
fn every_rule_endpoint_is_covered_correctly() {
    let rules = random_rules(25, 7);
    let classifier = build(rules.clone(), 1).unwrap().unwrap();
    for rule in &rules {
        for field in rule.field.iter().chain(rule.inverse_field.iter().flatten()) {
            for &endpoint in &field.endpoints() {
                // Querying exactly at a declared endpoint and one below it
                // must agree with the oracle: endpoints are where an
                // off-by-one in the half-open range math would show up.
                for probe in [endpoint.saturating_sub(1), endpoint] {
                    let value = [probe, probe];
                    let got = classifier.query(value).map(|r| r.action);
                    let want = naive_best(&rules, value);
                    assert_eq!(got, want, "endpoint probe {probe}");
                }
            }
        }
    }
}

#[test]
fn rebuilding_from_the_same_rules_is_deterministic() {
    let rules = random_rules(20, 99);
    let a = build(rules.clone(), 1).unwrap().unwrap();
    let b = build(rules, 1).unwrap().unwrap();
    for v0 in (0u32..1000).step_by(37) {
        for v1 in (0u32..1000).step_by(53) {
            let value = [v0, v1];
            assert_eq!(
                a.query(value).map(|r| r.action),
                b.query(value).map(|r| r.action)
            );
        }
    }
}

#[test]
fn dropping_a_classifier_releases_every_rule() {
    #[derive(Clone)]
    struct Counted(Arc<AtomicUsize>);
    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    let live = Arc::new(AtomicUsize::new(0));
    let rules: Vec<Rule<1, Counted>> = (0..30)
        .map(|i| {
            live.fetch_add(1, Ordering::SeqCst);
            Rule::new(
                &format!("r{i}"),
                [Interval::make_range((i + 1) * 10, (i + 1) * 10 + 5)],
                (i + 1) as i32,
                Counted(live.clone()),
            )
        })
        .collect();

    let classifier = build(rules, 0).unwrap().unwrap();
    assert!(classifier.query([15]).is_some());
    fis_classify::destroy(Some(classifier));
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn readers_observe_a_consistent_classifier_during_a_writer_swap() {
    use rayon::prelude::*;
    use std::sync::RwLock;

    let initial = build(random_rules(30, 1), 1).unwrap().unwrap();
    let shared = Arc::new(RwLock::new(Arc::new(initial)));
    let start = Arc::new(Barrier::new(5));

    rayon::scope(|s| {
        for _ in 0..4 {
            let shared = shared.clone();
            let start = start.clone();
            s.spawn(move |_| {
                start.wait();
                // No assertion on which ruleset answered; the property
                // under test is that this never panics or deadlocks while
                // a writer is swapping the Arc underneath, even when the
                // reader itself fans out over multiple values in parallel.
                (0u32..2000).into_par_iter().for_each(|i| {
                    let classifier = shared.read().unwrap().clone();
                    let _ = classifier.query([i % 1000, (i * 7) % 1000]);
                });
            });
        }

        let shared = shared.clone();
        let start = start.clone();
        s.spawn(move |_| {
            start.wait();
            for seed in 0..20u64 {
                let next = build(random_rules(30, 100 + seed), 1).unwrap().unwrap();
                *shared.write().unwrap() = Arc::new(next);
            }
        });
    });
}
