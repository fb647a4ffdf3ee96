//! Configuration errors must be hard failures at construction time.

use crustmix::{
    ConfigError, FieldRegistry, MemberDefinition, MemberSamples, MemberSpec, PolicyKind,
    ReconConfig, Reconstruction, SampleSet,
};

fn registry() -> FieldRegistry {
    let mut r = FieldRegistry::new();
    r.register("Th");
    r.register("Sc");
    r
}

fn population(registry: &FieldRegistry) -> SampleSet {
    let mut set = SampleSet::for_registry(registry);
    for i in 0..10 {
        set.push(i as f64 * 400.0, &[5.0, 1.0]);
    }
    set
}

fn member(name: &str, registry: &FieldRegistry) -> MemberDefinition {
    MemberDefinition {
        spec: MemberSpec::new(name),
        samples: MemberSamples::Population(population(registry)),
    }
}

#[test]
fn test_unknown_policy_name_is_rejected() {
    let err = "Spline".parse::<PolicyKind>().unwrap_err();
    assert_eq!(err, ConfigError::UnknownPolicy("Spline".to_string()));
}

#[test]
fn test_unknown_ratio_field_fails_construction() {
    let r = registry();
    let shales = population(&r);
    let config = ReconConfig::quick().ratio("Th/Nd").seed(1);
    let result = Reconstruction::new(
        config,
        r.clone(),
        &shales,
        vec![member("A", &r), member("B", &r)],
    );
    assert!(matches!(result, Err(ConfigError::UnknownField(name)) if name == "Nd"));
}

#[test]
fn test_member_count_outside_supported_set_fails() {
    let r = registry();
    let shales = population(&r);

    let config = ReconConfig::quick().ratio("Th/Sc").seed(1);
    let result = Reconstruction::new(config, r.clone(), &shales, vec![member("A", &r)]);
    assert!(matches!(
        result,
        Err(ConfigError::UnsupportedMemberCount(1))
    ));

    let config = ReconConfig::quick().ratio("Th/Sc").seed(1);
    let six: Vec<_> = ["A", "B", "C", "D", "E", "F"]
        .iter()
        .map(|n| member(n, &r))
        .collect();
    let result = Reconstruction::new(config, r.clone(), &shales, six);
    assert!(matches!(
        result,
        Err(ConfigError::UnsupportedMemberCount(6))
    ));
}

#[test]
fn test_supported_member_counts_build() {
    let r = registry();
    let shales = population(&r);
    for count in 2..=5 {
        let config = ReconConfig::quick()
            .ratio("Th/Sc")
            .policy(PolicyKind::FuturePast)
            .endmember_kernel_width(10_000.0)
            .seed(1);
        let names = ["A", "B", "C", "D", "E"];
        let members: Vec<_> = names[..count].iter().map(|n| member(n, &r)).collect();
        let recon = Reconstruction::new(config, r.clone(), &shales, members);
        assert!(recon.is_ok(), "count {} must be accepted", count);
        assert_eq!(recon.unwrap().member_count(), count);
    }
}

#[test]
fn test_interpolating_policy_rejects_plain_populations() {
    let r = registry();
    let shales = population(&r);
    let config = ReconConfig::quick()
        .ratio("Th/Sc")
        .policy(PolicyKind::Dual)
        .seed(1);
    let result = Reconstruction::new(
        config,
        r.clone(),
        &shales,
        vec![member("A", &r), member("B", &r)],
    );
    assert!(matches!(
        result,
        Err(ConfigError::MemberSamplesMismatch { .. })
    ));
}

#[test]
fn test_invalid_jump_size_fails_validation() {
    let r = registry();
    let shales = population(&r);
    let config = ReconConfig::quick().ratio("Th/Sc").jump_size(f64::NAN);
    let result = Reconstruction::new(
        config,
        r.clone(),
        &shales,
        vec![member("A", &r), member("B", &r)],
    );
    assert!(matches!(
        result,
        Err(ConfigError::InvalidParameter {
            name: "jump_size",
            ..
        })
    ));
}
