//! Seeding and reproducibility integration tests.

use technobabble::{GenerateRequest, Generator, Mode};

fn fixture_generator(seed: u64) -> Generator {
    Generator::builder()
        .seed(seed)
        .rules_path("tests/fixtures/test_rules.ron")
        .build()
        .unwrap()
}

fn request(n: usize, mutations: bool, mode: Mode) -> GenerateRequest {
    GenerateRequest {
        num_sentences: Some(n),
        mutations,
        mode,
    }
}

#[test]
fn same_seed_same_output() {
    let mut first = fixture_generator(42);
    let mut second = fixture_generator(42);

    assert_eq!(
        first.generate(&request(5, false, Mode::Sentences)),
        second.generate(&request(5, false, Mode::Sentences))
    );
}

#[test]
fn same_seed_same_output_with_mutations() {
    // Mutation draws come from the same session RNG, so they are part of
    // the deterministic stream.
    let mut first = fixture_generator(42);
    let mut second = fixture_generator(42);

    assert_eq!(
        first.generate(&request(5, true, Mode::Sentences)),
        second.generate(&request(5, true, Mode::Sentences))
    );
}

#[test]
fn same_seed_same_output_hierarchical_modes() {
    for mode in [Mode::Format, Mode::Post] {
        let mut first = fixture_generator(7);
        let mut second = fixture_generator(7);
        assert_eq!(
            first.generate(&request(1, true, mode)),
            second.generate(&request(1, true, mode)),
            "mode {:?} not deterministic",
            mode
        );
    }
}

#[test]
fn different_seeds_differ() {
    let mut baseline = fixture_generator(1);
    let reference = baseline.generate(&request(8, false, Mode::Sentences));

    let mut found_different = false;
    for seed in 2..20 {
        let mut other = fixture_generator(seed);
        if other.generate(&request(8, false, Mode::Sentences)) != reference {
            found_different = true;
            break;
        }
    }
    assert!(found_different, "expected different output across seeds");
}

#[test]
fn set_seed_restores_reproducibility() {
    let mut generator = fixture_generator(99);
    // Advance the stream arbitrarily first
    generator.generate(&request(3, true, Mode::Sentences));

    generator.set_seed(42);
    let first = generator.generate(&request(5, false, Mode::Sentences));

    generator.set_seed(42);
    let second = generator.generate(&request(5, false, Mode::Sentences));

    assert_eq!(first, second);
}

#[test]
fn seed_multiplier_survives_unrelated_draw_reordering() {
    // The SEED:scan draw in the fixture is derived from (seed, key), not
    // from the main stream, so it is identical across generators with the
    // same seed even though their other draws diverge by call pattern.
    let mut first = fixture_generator(1234);
    let mut second = fixture_generator(1234);

    // Different warm-up: one generator burns extra draws first
    second.generate(&request(2, false, Mode::Sentences));

    let out_a = first.generate(&request(10, false, Mode::Sentences));
    let out_b = second.generate(&request(10, false, Mode::Sentences));

    let scan_value = |s: &str| -> Option<String> {
        let idx = s.find("scan ")?;
        let rest = &s[idx + "scan ".len()..];
        let end = rest.find(' ')?;
        Some(rest[..end].to_string())
    };

    if let (Some(a), Some(b)) = (scan_value(&out_a), scan_value(&out_b)) {
        assert_eq!(a, b, "seed-multiplier value should not depend on draw order");
    }
}

#[test]
fn unseeded_generator_still_works() {
    let mut generator = Generator::builder()
        .rules_path("tests/fixtures/test_rules.ron")
        .build()
        .unwrap();
    let output = generator.generate(&request(4, true, Mode::Sentences));
    assert!(!output.is_empty());
    assert!(!output.contains('<'));
}
