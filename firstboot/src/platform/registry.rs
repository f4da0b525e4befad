//! Global dialog registry keyed by OS family and phase.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use super::definition::DialogDefinition;
use super::stage::Phase;
use super::vendors;
use crate::error::{ConfigurationError, Result};
use crate::topology::OsFamily;

/// Global dialog registry.
static REGISTRY: Lazy<RwLock<DialogRegistry>> = Lazy::new(|| RwLock::new(DialogRegistry::builtin()));

/// Registry of dialog definitions.
#[derive(Debug, Clone, Default)]
pub struct DialogRegistry {
    dialogs: HashMap<(OsFamily, Phase), DialogDefinition>,
}

impl DialogRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in dialogs.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for dialog in vendors::builtin_dialogs() {
            registry.dialogs.insert((dialog.os, dialog.phase), dialog);
        }
        registry
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<DialogRegistry> {
        &REGISTRY
    }

    /// Copy of the global registry, for handing to workers.
    pub fn snapshot() -> Self {
        match REGISTRY.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Register a dialog. Fails if one exists for the same OS and phase.
    pub fn register(&mut self, dialog: DialogDefinition) -> Result<()> {
        let key = (dialog.os, dialog.phase);
        if self.dialogs.contains_key(&key) {
            return Err(ConfigurationError::AlreadyRegistered {
                name: dialog.name.clone(),
            }
            .into());
        }
        self.dialogs.insert(key, dialog);
        Ok(())
    }

    /// Register a dialog, replacing any existing one.
    pub fn replace(&mut self, dialog: DialogDefinition) -> Option<DialogDefinition> {
        self.dialogs.insert((dialog.os, dialog.phase), dialog)
    }

    /// Get the dialog for an OS and phase.
    pub fn get(&self, os: OsFamily, phase: Phase) -> Option<&DialogDefinition> {
        self.dialogs.get(&(os, phase))
    }

    /// Like [`get`](Self::get), but a missing dialog is an error.
    pub fn require(&self, os: OsFamily, phase: Phase) -> Result<&DialogDefinition> {
        self.get(os, phase)
            .ok_or_else(|| ConfigurationError::NoDialog { os, phase }.into())
    }

    pub fn contains(&self, os: OsFamily, phase: Phase) -> bool {
        self.dialogs.contains_key(&(os, phase))
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::platform::TransportKind;

    #[test]
    fn test_builtin_dialogs() {
        let registry = DialogRegistry::builtin();
        assert!(registry.contains(OsFamily::Ios, Phase::Initial));
        assert!(registry.contains(OsFamily::Iosxe, Phase::Initial));
        assert!(registry.contains(OsFamily::Ios, Phase::Provision));
        assert!(registry.contains(OsFamily::Ftd, Phase::Initial));
        assert!(registry.contains(OsFamily::Linux, Phase::Initial));
        assert!(!registry.contains(OsFamily::Ftd, Phase::Provision));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = DialogRegistry::builtin();
        let dialog = DialogDefinition::new("ftd_again", OsFamily::Ftd, Phase::Initial, TransportKind::Telnet);
        assert!(matches!(
            registry.register(dialog.clone()),
            Err(Error::Configuration(ConfigurationError::AlreadyRegistered { .. }))
        ));
        assert!(registry.replace(dialog).is_some());
    }

    #[test]
    fn test_require_missing_dialog() {
        let registry = DialogRegistry::new();
        assert!(matches!(
            registry.require(OsFamily::Ios, Phase::Initial),
            Err(Error::Configuration(ConfigurationError::NoDialog { .. }))
        ));
    }

    #[test]
    fn test_global_snapshot() {
        let snapshot = DialogRegistry::snapshot();
        assert!(snapshot.len() >= 6);
    }
}
