//! Bridge configuration: which runtime library to host, how the
//! execution context is started, and which managed function serves
//! which pipeline stage.
//!
//! Two entry points build a [`BridgeConfig`]: TOML deserialization
//! (used by the CLI harness) and [`BridgeConfig::from_options`], which
//! consumes the host server's flat option surface (`clr_library`,
//! `asm_<stage>` / `class_<stage>` / `func_<stage>`, and so on).

use crate::stage::Stage;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Separator for platform path lists such as the trusted assembly set.
const PATH_LIST_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Hosting property the bridge computes from `trusted_assemblies`.
/// Reserved: it cannot be overridden through `runtime_properties`.
pub const TRUSTED_PLATFORM_ASSEMBLIES: &str = "TRUSTED_PLATFORM_ASSEMBLIES";

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while parsing or validating bridge configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required option `{0}`")]
    MissingOption(&'static str),

    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("unknown stage `{0}`")]
    UnknownStage(String),

    #[error("stage `{stage}` configures a function but no assembly; set `asm_{stage}` or the global `assembly`")]
    MissingAssembly { stage: Stage },

    #[error("stage `{stage}` configures a function but no class; set `class_{stage}` or the global `class`")]
    MissingClass { stage: Stage },

    #[error("hosting property `{0}` is reserved")]
    ReservedProperty(String),

    #[error("trusted assembly path {path:?} does not exist")]
    MissingAssemblyPath { path: PathBuf },

    #[error("failed to scan trusted assembly directory {path:?}")]
    AssemblyScan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Default file name of the runtime library when `clr_library` is not
/// configured.
pub fn default_runtime_library() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("libcoreclr.dylib")
    } else if cfg!(windows) {
        PathBuf::from("coreclr.dll")
    } else {
        PathBuf::from("libcoreclr.so")
    }
}

fn default_context_name() -> String {
    "radnet".to_string()
}

/// Per-stage target selection before global defaults are applied.
/// A stage with no `function` is disabled regardless of the rest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageOptions {
    #[serde(default)]
    pub assembly: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub function: Option<String>,
}

/// A fully resolved (assembly, class, function) binding triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateTarget {
    pub assembly: String,
    pub class: String,
    pub function: String,
}

impl fmt::Display for DelegateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.assembly, self.class, self.function)
    }
}

/// Everything one bridge instance needs to host a runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Path to the runtime library to load.
    #[serde(default = "default_runtime_library")]
    pub runtime_library: PathBuf,

    /// Application base directory handed to the runtime initializer.
    /// Required; there is no compiled-in default.
    pub base_path: PathBuf,

    /// Managed assembly files, or directories expanded to their `*.dll`
    /// entries, forming `TRUSTED_PLATFORM_ASSEMBLIES`. Required.
    #[serde(default)]
    pub trusted_assemblies: Vec<PathBuf>,

    /// Friendly name for the execution context.
    #[serde(default = "default_context_name")]
    pub context_name: String,

    /// Extra hosting properties, passed through in key order.
    #[serde(default)]
    pub runtime_properties: BTreeMap<String, String>,

    /// Default assembly for stages that configure a function but no
    /// assembly of their own.
    #[serde(default)]
    pub assembly: Option<String>,

    /// Default class, same fallback rule as `assembly`.
    #[serde(default)]
    pub class: Option<String>,

    /// Per-stage target selection, keyed by stage key.
    #[serde(default)]
    pub stages: BTreeMap<String, StageOptions>,
}

impl BridgeConfig {
    /// Builds and validates a configuration from the host server's flat
    /// option list. Recognized keys: `clr_library`, `base_path`,
    /// `trusted_assemblies` (platform path list), `context_name`,
    /// `assembly`, `class`, `property_<KEY>`, and the per-stage
    /// `asm_<stage>` / `class_<stage>` / `func_<stage>` triples.
    /// Anything else is rejected.
    pub fn from_options<'a>(
        options: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        let mut config = BridgeConfig {
            runtime_library: default_runtime_library(),
            base_path: PathBuf::new(),
            trusted_assemblies: Vec::new(),
            context_name: default_context_name(),
            runtime_properties: BTreeMap::new(),
            assembly: None,
            class: None,
            stages: BTreeMap::new(),
        };

        for (key, value) in options {
            match key {
                "clr_library" => config.runtime_library = PathBuf::from(value),
                "base_path" => config.base_path = PathBuf::from(value),
                "trusted_assemblies" => {
                    config.trusted_assemblies = value
                        .split(PATH_LIST_SEPARATOR)
                        .filter(|part| !part.is_empty())
                        .map(PathBuf::from)
                        .collect();
                }
                "context_name" => config.context_name = value.to_string(),
                "assembly" => config.assembly = Some(value.to_string()),
                "class" => config.class = Some(value.to_string()),
                _ => {
                    if let Some(property) = key.strip_prefix("property_") {
                        config
                            .runtime_properties
                            .insert(property.to_string(), value.to_string());
                    } else if let Some(stage_key) = key.strip_prefix("asm_") {
                        stage_options(&mut config.stages, stage_key)?.assembly =
                            Some(value.to_string());
                    } else if let Some(stage_key) = key.strip_prefix("class_") {
                        stage_options(&mut config.stages, stage_key)?.class =
                            Some(value.to_string());
                    } else if let Some(stage_key) = key.strip_prefix("func_") {
                        stage_options(&mut config.stages, stage_key)?.function =
                            Some(value.to_string());
                    } else {
                        return Err(ConfigError::UnknownOption(key.to_string()));
                    }
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants that need no filesystem access: required
    /// options are present, stage keys are known, and no reserved
    /// hosting property is overridden.
    pub fn validate(&self) -> Result<()> {
        if self.base_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingOption("base_path"));
        }
        if self.trusted_assemblies.is_empty() {
            return Err(ConfigError::MissingOption("trusted_assemblies"));
        }
        if self.context_name.is_empty() {
            return Err(ConfigError::MissingOption("context_name"));
        }
        if self
            .runtime_properties
            .contains_key(TRUSTED_PLATFORM_ASSEMBLIES)
        {
            return Err(ConfigError::ReservedProperty(
                TRUSTED_PLATFORM_ASSEMBLIES.to_string(),
            ));
        }
        for stage_key in self.stages.keys() {
            if Stage::from_key(stage_key).is_none() {
                return Err(ConfigError::UnknownStage(stage_key.clone()));
            }
        }
        self.resolve_targets()?;
        Ok(())
    }

    /// Resolves the per-stage targets in pipeline order, applying the
    /// global `assembly`/`class` defaults. `None` means the stage is
    /// disabled because no function is configured for it.
    pub fn resolve_targets(&self) -> Result<Vec<(Stage, Option<DelegateTarget>)>> {
        Stage::ALL
            .iter()
            .map(|&stage| Ok((stage, self.resolve_target(stage)?)))
            .collect()
    }

    fn resolve_target(&self, stage: Stage) -> Result<Option<DelegateTarget>> {
        let options = self.stages.get(stage.key());
        let Some(function) = options.and_then(|o| o.function.clone()) else {
            return Ok(None);
        };
        let assembly = options
            .and_then(|o| o.assembly.clone())
            .or_else(|| self.assembly.clone())
            .ok_or(ConfigError::MissingAssembly { stage })?;
        let class = options
            .and_then(|o| o.class.clone())
            .or_else(|| self.class.clone())
            .ok_or(ConfigError::MissingClass { stage })?;
        Ok(Some(DelegateTarget {
            assembly,
            class,
            function,
        }))
    }

    /// Builds the ordered hosting property list for context
    /// initialization: `TRUSTED_PLATFORM_ASSEMBLIES` first, then the
    /// extra `runtime_properties` in key order.
    pub fn hosting_properties(&self) -> Result<Vec<(String, String)>> {
        let mut properties = vec![(
            TRUSTED_PLATFORM_ASSEMBLIES.to_string(),
            self.trusted_assembly_list()?,
        )];
        properties.extend(
            self.runtime_properties
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Ok(properties)
    }

    /// Joins the trusted assembly set into a platform path list.
    /// Directories contribute their `*.dll` entries in sorted order,
    /// files are taken verbatim, and a missing path is an error rather
    /// than a silently wrong search set.
    fn trusted_assembly_list(&self) -> Result<String> {
        let mut entries: Vec<String> = Vec::new();
        for path in &self.trusted_assemblies {
            if path.is_dir() {
                entries.extend(scan_assembly_dir(path)?);
            } else if path.is_file() {
                entries.push(path.to_string_lossy().into_owned());
            } else {
                return Err(ConfigError::MissingAssemblyPath { path: path.clone() });
            }
        }
        Ok(entries.join(PATH_LIST_SEPARATOR))
    }
}

fn stage_options<'a>(
    stages: &'a mut BTreeMap<String, StageOptions>,
    stage_key: &str,
) -> Result<&'a mut StageOptions> {
    if Stage::from_key(stage_key).is_none() {
        return Err(ConfigError::UnknownStage(stage_key.to_string()));
    }
    Ok(stages.entry(stage_key.to_string()).or_default())
}

fn scan_assembly_dir(dir: &Path) -> Result<Vec<String>> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| ConfigError::AssemblyScan {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| ConfigError::AssemblyScan {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_assembly = path.is_file()
            && path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("dll"))
                .unwrap_or(false);
        if is_assembly {
            entries.push(path.to_string_lossy().into_owned());
        }
    }
    entries.sort();
    Ok(entries)
}
