use std::sync::Arc;

use specconfig_core::{
    decode, required, AccessEvent, AccessOutcome, AccessReporter, Binding, BuildOptions,
    ConfigLoader, ErrorHandlingMode, InMemoryProvider, LayeredReader, Provenance,
    ProvenanceReporter, SpecEntry, SpecProfile,
};

#[derive(Debug, Default)]
struct Draft {
    name: Option<String>,
}

fn profile() -> SpecProfile<Draft, String> {
    SpecProfile::new(|d: Draft| required(d.name, "pet.name")).binding(
        Binding::new("pet.name", |d: &mut Draft| &mut d.name, decode::string)
            .with_spec(SpecEntry::predicate("Name must not be empty", |s: &String| !s.is_empty())),
    )
}

#[test]
fn test_build_runs_fresh_each_time() {
    let loader = ConfigLoader::new(
        profile(),
        InMemoryProvider::new("memory").with("pet.name", "Rex"),
        BuildOptions::default(),
    );

    let first = loader.build();
    let second = loader.build();
    assert_eq!(first.final_value().map(String::as_str), Some("Rex"));
    assert_ne!(first.snapshot().build_id(), second.snapshot().build_id());
    assert_eq!(first.snapshot().fingerprint(), second.snapshot().fingerprint());
}

#[test]
fn test_reload_sees_replaced_reader() {
    let mut loader = ConfigLoader::new(
        profile(),
        InMemoryProvider::new("memory").with("pet.name", "Rex"),
        BuildOptions::default(),
    );
    assert!(loader.build().is_success());

    loader.replace_reader(InMemoryProvider::new("memory").with("pet.name", ""));
    let reloaded = loader.reload();
    assert!(!reloaded.is_success());
    assert_eq!(reloaded.diagnostics().error_count(), 1);
}

#[test]
fn test_reload_clears_reporter_before_building() {
    let reporter = Arc::new(ProvenanceReporter::new());
    let reader = LayeredReader::new()
        .with_provider(InMemoryProvider::new("file").with("pet.name", "Rex"))
        .with_reporter(reporter.clone());
    let options = BuildOptions::new()
        .with_error_handling(ErrorHandlingMode::FailFast)
        .with_provenance_reporter(reporter.clone());
    let loader = ConfigLoader::new(profile(), reader, options);

    let built = loader.build();
    assert_eq!(
        built.snapshot().value("pet.name").unwrap().provenance(),
        &Provenance::ExternalProvider {
            name: "file".to_string()
        }
    );

    reporter.report(&AccessEvent {
        key: "stale.key".to_string(),
        outcome: AccessOutcome::Found {
            provider: "old".to_string(),
            provenance: Provenance::EnvironmentVariable,
        },
    });
    assert!(reporter.provenance("stale.key").is_some());
    let reloaded = loader.reload();
    assert_eq!(
        reloaded.snapshot().value("pet.name").unwrap().provenance(),
        &Provenance::ExternalProvider {
            name: "file".to_string()
        }
    );
    assert_eq!(reporter.provenance("stale.key"), None);
    assert_eq!(loader.options().error_handling, ErrorHandlingMode::FailFast);
}
