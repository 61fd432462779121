//! Named probe registrations

use super::adapter::Probe;
use std::collections::BTreeMap;

/// Probes by name, each with its declared call shape
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    probes: BTreeMap<&'static str, Probe>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every probe the crate ships
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::probes::register_builtin(&mut registry);
        registry
    }

    /// Add `probe`, replacing any earlier probe of the same name
    pub fn register(&mut self, probe: Probe) -> &mut Self {
        if self.probes.insert(probe.name(), probe).is_some() {
            tracing::debug!("probe registration replaced");
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Probe> {
        self.probes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.probes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Probe> {
        self.probes.values()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}
