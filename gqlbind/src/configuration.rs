//! Engine configuration.

use std::str::FromStr;

use heck::ToLowerCamelCase;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;

/// Options of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct EngineOptions {
    /// How references to a type still under construction are handled.
    pub cycles: CyclePolicy,

    /// Whether building stops at the first declaration error.
    pub errors: ErrorMode,

    /// How exposed field names are derived from declared names.
    pub field_naming: FieldNaming,
}

#[buildstructor::buildstructor]
impl EngineOptions {
    #[builder]
    pub fn new(
        cycles: Option<CyclePolicy>,
        errors: Option<ErrorMode>,
        field_naming: Option<FieldNaming>,
    ) -> Self {
        Self {
            cycles: cycles.unwrap_or_default(),
            errors: errors.unwrap_or_default(),
            field_naming: field_naming.unwrap_or_default(),
        }
    }

    /// The JSON schema of the options.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(EngineOptions)
    }
}

/// Parse options from a string in YAML syntax
impl FromStr for EngineOptions {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml::from_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// A type may refer to a type under construction through `Option` or `Vec`.
    #[default]
    AllowThroughIndirection,
    /// Any reference to a type under construction fails.
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Stop at the first error.
    #[default]
    FailFast,
    /// Report every error.
    Collect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldNaming {
    /// Fields are exposed under their declared name.
    #[default]
    AsDeclared,
    /// Declared names are converted to lowerCamelCase.
    CamelCase,
}

impl FieldNaming {
    pub(crate) fn expose(self, declared: &str) -> String {
        match self {
            FieldNaming::AsDeclared => declared.to_string(),
            FieldNaming::CamelCase => declared.to_lower_camel_case(),
        }
    }
}
