use matrix_domain::{Condition, ConfigurationTuple, DependencySpec, DomainError, EnvironmentDescriptor, RuntimeVersion};

fn tuple(v: &str, bits: u32) -> ConfigurationTuple {
    ConfigurationTuple::parse(v, bits).unwrap()
}

#[test]
fn test_descriptor_preserves_declaration_order() {
    let d = EnvironmentDescriptor::new(vec![tuple("3.4", 64), tuple("2.7", 32), tuple("2.7", 64)], vec![]).unwrap();
    let ids: Vec<String> = d.list_configurations().iter().map(|t| t.id().to_string()).collect();
    assert_eq!(ids, vec!["3.4-64", "2.7-32", "2.7-64"]);
}

#[test]
fn test_descriptor_rejects_duplicate_identity() {
    // Mismo (version, arch) con flags distintos sigue siendo la misma tupla
    let err = EnvironmentDescriptor::new(vec![tuple("2.7", 32), tuple("2.7", 32).with_flags(["slow"])], vec![]).unwrap_err();
    assert_eq!(err, DomainError::DuplicateTuple("2.7-32".into()));
}

#[test]
fn test_descriptor_rejects_empty_matrix_and_unnamed_dependency() {
    assert!(matches!(EnvironmentDescriptor::new(Vec::new(), vec![]), Err(DomainError::Validation(_))));
    let err = EnvironmentDescriptor::new(vec![tuple("2.7", 32)], vec![DependencySpec::new("  ")]).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[test]
fn test_applicable_dependencies_follow_predicates() {
    let deps = vec![DependencySpec::new("numpy"),
                    DependencySpec::new("mock").when(Condition::RuntimeVersion(RuntimeVersion::parse("2.7").unwrap())),
                    DependencySpec::new("netcdf4")];
    let d = EnvironmentDescriptor::new(vec![tuple("2.7", 32), tuple("3.4", 64)], deps).unwrap();
    let names = |t: &ConfigurationTuple| d.applicable_dependencies(t).iter().map(|d| d.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&d.list_configurations()[0]), vec!["numpy", "mock", "netcdf4"]);
    assert_eq!(names(&d.list_configurations()[1]), vec!["numpy", "netcdf4"]);
}

#[test]
fn test_retain_ids_keeps_order_and_rejects_unknown() {
    let d = EnvironmentDescriptor::new(vec![tuple("2.7", 32), tuple("3.4", 64), tuple("3.5", 64)], vec![]).unwrap();
    let sub = d.retain_ids(&["3.5-64".to_string(), "2.7-32".to_string()]).unwrap();
    let ids: Vec<String> = sub.list_configurations().iter().map(|t| t.id().to_string()).collect();
    assert_eq!(ids, vec!["2.7-32", "3.5-64"]);
    assert!(d.retain_ids(&["3.9-64".to_string()]).is_err());
}
