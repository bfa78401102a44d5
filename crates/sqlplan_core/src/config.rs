use std::sync::LazyLock;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use sqlplan_error::{PlanError, Result};

use crate::types::ScalarValue;

/// Configuration for planning a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// When false, identifiers are lowercased before lookup.
    pub case_sensitive: bool,
    /// Namespace passed to the catalog for unqualified table names.
    pub default_namespace: Option<String>,
    pub enable_optimizer: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            case_sensitive: false,
            default_namespace: None,
            enable_optimizer: true,
        }
    }
}

impl PlannerConfig {
    /// Normalize an identifier according to the case sensitivity setting.
    pub fn normalize_ident(&self, ident: &str) -> String {
        if self.case_sensitive {
            ident.to_string()
        } else {
            ident.to_lowercase()
        }
    }

    pub fn set(&mut self, name: &str, value: ScalarValue) -> Result<()> {
        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| PlanError::Syntax(format!("Missing setting for '{name}'")))?;

        (func.set)(value, self)
    }

    pub fn get(&self, name: &str) -> Result<ScalarValue> {
        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| PlanError::Syntax(format!("Missing setting for '{name}'")))?;

        Ok((func.get)(self))
    }

    pub fn reset(&mut self, name: &str) -> Result<()> {
        let def_conf = Self::default();
        let value = def_conf.get(name)?;
        self.set(name, value)
    }
}

struct SettingFunctions {
    set: fn(value: ScalarValue, conf: &mut PlannerConfig) -> Result<()>,
    get: fn(conf: &PlannerConfig) -> ScalarValue,
}

impl SettingFunctions {
    const fn new<S: PlannerSetting>() -> Self {
        SettingFunctions {
            set: S::set_from_scalar as _,
            get: S::get_as_scalar as _,
        }
    }
}

fn insert_setting<S: PlannerSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<CaseSensitive>(&mut map);
    insert_setting::<DefaultNamespace>(&mut map);
    insert_setting::<EnableOptimizer>(&mut map);

    map
});

pub trait PlannerSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_scalar(value: ScalarValue, conf: &mut PlannerConfig) -> Result<()>;
    fn get_as_scalar(conf: &PlannerConfig) -> ScalarValue;
}

pub struct CaseSensitive;

impl PlannerSetting for CaseSensitive {
    const NAME: &'static str = "case_sensitive";
    const DESCRIPTION: &'static str = "Controls if identifiers keep their case";

    fn set_from_scalar(value: ScalarValue, conf: &mut PlannerConfig) -> Result<()> {
        conf.case_sensitive = value.try_as_bool()?;
        Ok(())
    }

    fn get_as_scalar(conf: &PlannerConfig) -> ScalarValue {
        conf.case_sensitive.into()
    }
}

pub struct DefaultNamespace;

impl PlannerSetting for DefaultNamespace {
    const NAME: &'static str = "default_namespace";
    const DESCRIPTION: &'static str = "Namespace used for unqualified table names";

    fn set_from_scalar(value: ScalarValue, conf: &mut PlannerConfig) -> Result<()> {
        conf.default_namespace = match value {
            ScalarValue::Null => None,
            other => Some(other.try_as_str()?.to_string()),
        };
        Ok(())
    }

    fn get_as_scalar(conf: &PlannerConfig) -> ScalarValue {
        conf.default_namespace.clone().into()
    }
}

pub struct EnableOptimizer;

impl PlannerSetting for EnableOptimizer {
    const NAME: &'static str = "enable_optimizer";
    const DESCRIPTION: &'static str = "Controls if the optimizer is enabled";

    fn set_from_scalar(value: ScalarValue, conf: &mut PlannerConfig) -> Result<()> {
        conf.enable_optimizer = value.try_as_bool()?;
        Ok(())
    }

    fn get_as_scalar(conf: &PlannerConfig) -> ScalarValue {
        conf.enable_optimizer.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut conf = PlannerConfig::default();
        conf.set("enable_optimizer", false.into()).unwrap();
        assert_eq!(ScalarValue::Bool(false), conf.get("enable_optimizer").unwrap());

        conf.set("default_namespace", "main".into()).unwrap();
        assert_eq!(Some("main".to_string()), conf.default_namespace);

        conf.set("default_namespace", ScalarValue::Null).unwrap();
        assert_eq!(None, conf.default_namespace);
    }

    #[test]
    fn set_wrong_type() {
        let mut conf = PlannerConfig::default();
        conf.set("case_sensitive", "yes".into()).unwrap_err();
    }

    #[test]
    fn unknown_setting() {
        let mut conf = PlannerConfig::default();
        conf.set("partitions", ScalarValue::Int8(4)).unwrap_err();
        conf.get("partitions").unwrap_err();
    }

    #[test]
    fn reset_setting() {
        let mut conf = PlannerConfig::default();
        conf.set("case_sensitive", true.into()).unwrap();
        conf.reset("case_sensitive").unwrap();
        assert!(!conf.case_sensitive);
    }

    #[test]
    fn normalize_ident() {
        let conf = PlannerConfig::default();
        assert_eq!("users", conf.normalize_ident("Users"));

        let conf = PlannerConfig {
            case_sensitive: true,
            ..Default::default()
        };
        assert_eq!("Users", conf.normalize_ident("Users"));
    }
}
