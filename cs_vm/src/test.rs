use super::*;
use cs_model::LoaderConfig;
use std::sync::Arc;

fn minimal_class_bytes(name: &str) -> Vec<u8> {
    fn utf8(cp: &mut Vec<Vec<u8>>, s: &str) -> u16 {
        let mut b = vec![1u8];
        b.extend_from_slice(&(s.len() as u16).to_be_bytes());
        b.extend_from_slice(s.as_bytes());
        cp.push(b);
        cp.len() as u16
    }
    fn class(cp: &mut Vec<Vec<u8>>, name_index: u16) -> u16 {
        let mut b = vec![7u8];
        b.extend_from_slice(&name_index.to_be_bytes());
        cp.push(b);
        cp.len() as u16
    }

    let mut cp = Vec::new();
    let name_idx = utf8(&mut cp, name);
    let this_class = class(&mut cp, name_idx);
    let object_name = utf8(&mut cp, "java/lang/Object");
    let super_class = class(&mut cp, object_name);

    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&52u16.to_be_bytes());
    out.extend_from_slice(&(cp.len() as u16 + 1).to_be_bytes());
    for entry in &cp {
        out.extend_from_slice(entry);
    }
    out.extend_from_slice(&0u16.to_be_bytes()); // access_flags
    out.extend_from_slice(&this_class.to_be_bytes());
    out.extend_from_slice(&super_class.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
    out.extend_from_slice(&0u16.to_be_bytes()); // fields
    out.extend_from_slice(&0u16.to_be_bytes()); // methods
    out.extend_from_slice(&0u16.to_be_bytes()); // attributes
    out
}

struct FakeLocator {
    classes: std::collections::HashMap<String, Vec<u8>>,
}

impl ClasspathLocator for FakeLocator {
    fn locate(&self, name: &str) -> Result<Vec<u8>, LocateError> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| LocateError::NotFound {
                name: name.to_string(),
            })
    }
}

#[test]
fn fleet_loads_known_classes_into_the_registry() {
    let mut classes = std::collections::HashMap::new();
    classes.insert("Foo".to_string(), minimal_class_bytes("Foo"));
    classes.insert("Bar".to_string(), minimal_class_bytes("Bar"));
    let locator = Arc::new(FakeLocator { classes });
    let registry = Arc::new(InMemoryClassRegistry::new());

    let fleet = Fleet::new(2, locator, registry.clone(), LoaderConfig::default());
    fleet.submit("Foo").unwrap();
    fleet.submit("Bar").unwrap();

    let mut loaded = Vec::new();
    for _ in 0..2 {
        match fleet.recv().expect("a result for every submitted job") {
            LoadOutcome::Loaded { name } => loaded.push(name),
            LoadOutcome::Failed { name, error } => panic!("{} failed to load: {}", name, error),
        }
    }
    loaded.sort();
    assert_eq!(loaded, vec!["Bar".to_string(), "Foo".to_string()]);

    assert!(registry.contains("Foo"));
    assert!(registry.contains("Bar"));

    fleet.shutdown();
}

#[test]
fn fleet_reports_locate_failures_without_touching_the_registry() {
    let locator = Arc::new(FakeLocator {
        classes: std::collections::HashMap::new(),
    });
    let registry = Arc::new(InMemoryClassRegistry::new());

    let fleet = Fleet::new(1, locator, registry.clone(), LoaderConfig::default());
    fleet.submit("Missing").unwrap();

    match fleet.recv().expect("a result") {
        LoadOutcome::Failed { name, .. } => assert_eq!(name, "Missing"),
        LoadOutcome::Loaded { name } => panic!("{} should not have loaded", name),
    }
    assert!(!registry.contains("Missing"));

    fleet.shutdown();
}

#[test]
fn in_memory_registry_round_trips_inserted_classes() {
    let registry = InMemoryClassRegistry::new();
    assert!(!registry.contains("Foo"));

    let bytes = minimal_class_bytes("Foo");
    let class = cs_parser::load_class_file(&bytes, &LoaderConfig::default()).unwrap();
    registry.insert("Foo".to_string(), Arc::new(class));

    assert!(registry.contains("Foo"));
    let fetched = registry.get("Foo").expect("inserted class should be retrievable");
    assert_eq!(
        fetched
            .this_class
            .get(&fetched.constant_pool)
            .name_index
            .get(&fetched.constant_pool),
        "Foo"
    );
}

#[test]
fn fs_locator_falls_through_multiple_roots() {
    let dir = std::env::temp_dir().join(format!("cs_vm_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("Present.class"), minimal_class_bytes("Present")).unwrap();

    let locator = FsClasspathLocator::new(vec![
        std::env::temp_dir().join("cs_vm_test_does_not_exist"),
        dir.clone(),
    ]);

    let bytes = locator.locate("Present").expect("should find Present.class");
    assert!(!bytes.is_empty());

    let err = locator.locate("Absent").unwrap_err();
    assert!(matches!(err, LocateError::NotFound { .. }));

    std::fs::remove_dir_all(&dir).ok();
}
