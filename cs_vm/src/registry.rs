use cs_model::ClassFile;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Holds format-checked classes for linking and execution. External
/// collaborator: the parsing pipeline hands finished `ClassFile`s off here
/// and never reads them back.
pub trait ClassRegistry: Send + Sync {
    fn insert(&self, name: String, class: Arc<ClassFile>);
    fn get(&self, name: &str) -> Option<Arc<ClassFile>>;
    fn contains(&self, name: &str) -> bool;
}

#[derive(Default)]
pub struct InMemoryClassRegistry {
    classes: Mutex<HashMap<String, Arc<ClassFile>>>,
}

impl InMemoryClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClassRegistry for InMemoryClassRegistry {
    fn insert(&self, name: String, class: Arc<ClassFile>) {
        self.classes.lock().unwrap().insert(name, class);
    }

    fn get(&self, name: &str) -> Option<Arc<ClassFile>> {
        self.classes.lock().unwrap().get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.classes.lock().unwrap().contains_key(name)
    }
}
