//! Device registry
//!
//! Maps device category names to the numeric codes used in routine corpora.
//! A registry is scoped to one country and must be a bijection. Registries are
//! read from TOML files of the form:
//!
//! ```toml
//! [devices]
//! Light = 13
//! MotionSensor = 15
//! ```

use crate::error::{AnalysisError, InputKind, RegistryIntegrityError};
use crate::types::{DeviceCode, UNKNOWN_CATEGORY};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Built-in device taxonomy shared by the bundled country datasets
const STANDARD_DEVICES: [(&str, DeviceCode); 33] = [
    ("AirConditioner", 0),
    ("AirPurifier", 1),
    ("Blind", 2),
    ("Camera", 3),
    ("ClothingCareMachine", 4),
    ("Computer", 5),
    ("ContactSensor", 6),
    ("CurbPowerMeter", 7),
    ("Dishwasher", 8),
    ("Dryer", 9),
    ("Elevator", 10),
    ("Fan", 11),
    ("GarageDoor", 12),
    ("Light", 13),
    ("Microwave", 14),
    ("MotionSensor", 15),
    ("NetworkAudio", 16),
    ("None", 17),
    ("Other", 18),
    ("Oven", 19),
    ("PresenceSensor", 20),
    ("Projector", 21),
    ("Refrigerator", 22),
    ("RemoteController", 23),
    ("RobotCleaner", 24),
    ("Siren", 25),
    ("SmartLock", 26),
    ("SmartPlug", 27),
    ("Switch", 28),
    ("Television", 29),
    ("Thermostat", 30),
    ("Washer", 31),
    ("WaterValve", 32),
];

#[derive(Debug, Deserialize)]
struct RegistryFile {
    devices: BTreeMap<String, DeviceCode>,
}

/// Bidirectional name/code mapping for one country's devices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRegistry {
    by_code: BTreeMap<DeviceCode, String>,
    by_name: HashMap<String, DeviceCode>,
}

impl DeviceRegistry {
    /// Build a registry, rejecting duplicate codes or names
    pub fn from_entries<I, S>(entries: I) -> Result<Self, RegistryIntegrityError>
    where
        I: IntoIterator<Item = (S, DeviceCode)>,
        S: Into<String>,
    {
        let mut registry = Self::default();

        for (name, code) in entries {
            let name = name.into();

            if registry.by_name.contains_key(&name) {
                return Err(RegistryIntegrityError::DuplicateName { name });
            }
            if let Some(first) = registry.by_code.get(&code) {
                return Err(RegistryIntegrityError::DuplicateCode {
                    code,
                    first: first.clone(),
                    second: name,
                });
            }

            registry.by_name.insert(name.clone(), code);
            registry.by_code.insert(code, name);
        }

        Ok(registry)
    }

    /// The built-in 33-category taxonomy
    pub fn standard() -> Self {
        let mut registry = Self::default();
        for (name, code) in STANDARD_DEVICES {
            registry.by_name.insert(name.to_string(), code);
            registry.by_code.insert(code, name.to_string());
        }
        registry
    }

    /// Parse a registry from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, AnalysisError> {
        let file: RegistryFile =
            toml::from_str(text).map_err(|e| AnalysisError::RegistryParse(e.to_string()))?;

        if let Some((name, code)) = file.devices.iter().find(|(_, code)| **code < 0) {
            return Err(AnalysisError::RegistryParse(format!(
                "device '{name}' has negative code {code}"
            )));
        }

        Ok(Self::from_entries(file.devices)?)
    }

    /// Read a registry file. A missing file is reported as [`AnalysisError::MissingInput`].
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AnalysisError::MissingInput {
                kind: InputKind::Registry,
                path: path.to_path_buf(),
            },
            _ => AnalysisError::Io(e),
        })?;

        let registry = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), devices = registry.len(), "loaded device registry");
        Ok(registry)
    }

    /// Category name of a code, or `"Unknown"` if the code is not registered
    pub fn code_to_name(&self, code: DeviceCode) -> &str {
        self.by_code
            .get(&code)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Code of a category name, `None` if the name is not registered
    pub fn name_to_code(&self, name: &str) -> Option<DeviceCode> {
        self.by_name.get(name).copied()
    }

    pub fn contains_code(&self, code: DeviceCode) -> bool {
        self.by_code.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Entries in ascending code order
    pub fn iter(&self) -> impl Iterator<Item = (DeviceCode, &str)> {
        self.by_code.iter().map(|(code, name)| (*code, name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NONE_CATEGORY;
    use pretty_assertions::assert_eq;

    fn sample() -> DeviceRegistry {
        DeviceRegistry::from_entries([("Light", 13), ("MotionSensor", 15), ("PresenceSensor", 20)])
            .unwrap()
    }

    #[test]
    fn test_round_trip_for_registered_codes() {
        let registry = sample();
        for (code, name) in registry.iter() {
            assert_eq!(registry.name_to_code(registry.code_to_name(code)), Some(code));
            assert_eq!(registry.code_to_name(code), name);
        }
    }

    #[test]
    fn test_unknown_code_resolves_to_sentinel() {
        let registry = sample();
        assert_eq!(registry.code_to_name(99), UNKNOWN_CATEGORY);
        assert_eq!(registry.code_to_name(-1), UNKNOWN_CATEGORY);
        assert!(!registry.contains_code(99));
        assert_eq!(registry.name_to_code("Fan"), None);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let err = DeviceRegistry::from_entries([("Light", 13), ("Lamp", 13)]).unwrap_err();
        assert_eq!(
            err,
            RegistryIntegrityError::DuplicateCode {
                code: 13,
                first: "Light".to_string(),
                second: "Lamp".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = DeviceRegistry::from_entries([("Light", 13), ("Light", 14)]).unwrap_err();
        assert_eq!(
            err,
            RegistryIntegrityError::DuplicateName {
                name: "Light".to_string()
            }
        );
    }

    #[test]
    fn test_standard_registry_is_bijective() {
        let standard = DeviceRegistry::standard();
        assert_eq!(standard.len(), STANDARD_DEVICES.len());
        assert!(DeviceRegistry::from_entries(STANDARD_DEVICES).is_ok());

        // "None" is a real category, distinct from the unknown sentinel
        assert_eq!(standard.code_to_name(17), NONE_CATEGORY);
        assert_eq!(standard.name_to_code(NONE_CATEGORY), Some(17));
        assert_eq!(standard.code_to_name(33), UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_from_toml() {
        let registry = DeviceRegistry::from_toml_str(
            r#"
            [devices]
            Light = 13
            MotionSensor = 15
            PresenceSensor = 20
            "#,
        )
        .unwrap();
        assert_eq!(registry, sample());
    }

    #[test]
    fn test_toml_duplicate_code() {
        let err = DeviceRegistry::from_toml_str("[devices]\nLight = 13\nLamp = 13\n").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::RegistryIntegrity(RegistryIntegrityError::DuplicateCode { code: 13, .. })
        ));
    }

    #[test]
    fn test_toml_rejects_invalid_documents() {
        let err = DeviceRegistry::from_toml_str("[devices]\nLight = \"thirteen\"\n").unwrap_err();
        assert!(matches!(err, AnalysisError::RegistryParse(_)));

        let err = DeviceRegistry::from_toml_str("[devices]\nLight = 13\nLight = 14\n").unwrap_err();
        assert!(matches!(err, AnalysisError::RegistryParse(_)));
    }

    #[test]
    fn test_toml_rejects_negative_codes() {
        let err = DeviceRegistry::from_toml_str("[devices]\nLight = -13\n").unwrap_err();
        match err {
            AnalysisError::RegistryParse(message) => assert!(message.contains("Light")),
            other => panic!("unexpected error: {other:?}"),
        }

        let registry = DeviceRegistry::from_toml_str("[devices]\nLight = 0\n").unwrap();
        assert_eq!(registry.code_to_name(0), "Light");
    }

    #[test]
    fn test_duplicate_code_keeps_wide_codes() {
        let err = DeviceRegistry::from_entries([("Hub", 5_000_000_000), ("Bridge", 5_000_000_000)])
            .unwrap_err();
        assert_eq!(
            err,
            RegistryIntegrityError::DuplicateCode {
                code: 5_000_000_000,
                first: "Hub".to_string(),
                second: "Bridge".to_string(),
            }
        );
        assert!(err.to_string().contains("5000000000"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeviceRegistry::load(&dir.path().join("dictionary.toml")).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MissingInput {
                kind: InputKind::Registry,
                ..
            }
        ));
    }
}
