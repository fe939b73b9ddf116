use crate::LifecycleError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use switchyard_engine::{RoutingConfigurationSet, ScriptEvaluator};
use tracing::{debug, info};

const PACKAGED_PREFIX: &str = "packaged-resource:";

/// Route scripts bundled into the binary, keyed by resource path.
pub const PACKAGED_SCRIPTS: &[(&str, &str)] = &[(
    "bootstrap/control.toml",
    include_str!("../scripts/bootstrap/control.toml"),
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptScheme {
    FileSystem,
    Packaged,
}

/// Where a route script lives: a path on disk or a packaged resource.
///
/// Text form is either a bare filesystem path or
/// `packaged-resource:<path>` (prefix matched case-insensitively).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptReference {
    scheme: ScriptScheme,
    path: String,
}

impl ScriptReference {
    pub fn parse(text: &str) -> Result<Self, LifecycleError> {
        let text = text.trim();
        let (scheme, path) = match text.get(..PACKAGED_PREFIX.len()) {
            Some(head) if head.eq_ignore_ascii_case(PACKAGED_PREFIX) => {
                (ScriptScheme::Packaged, text[PACKAGED_PREFIX.len()..].trim())
            }
            _ => (ScriptScheme::FileSystem, text),
        };
        if path.is_empty() {
            return Err(LifecycleError::Precondition(format!(
                "script reference '{text}' has an empty path"
            )));
        }
        Ok(Self {
            scheme,
            path: path.to_owned(),
        })
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            scheme: ScriptScheme::FileSystem,
            path: path.into().to_string_lossy().into_owned(),
        }
    }

    pub fn scheme(&self) -> ScriptScheme {
        self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Read the script text.
    pub fn resolve(&self) -> Result<String, LifecycleError> {
        match self.scheme {
            ScriptScheme::Packaged => {
                let wanted = self.path.trim_start_matches('/');
                PACKAGED_SCRIPTS
                    .iter()
                    .find(|(name, _)| *name == wanted)
                    .map(|(_, text)| (*text).to_owned())
                    .ok_or_else(|| LifecycleError::ResourceNotFound(self.path.clone()))
            }
            ScriptScheme::FileSystem => {
                std::fs::read_to_string(&self.path).map_err(|source| LifecycleError::ScriptIo {
                    reference: self.to_string(),
                    source,
                })
            }
        }
    }
}

impl fmt::Display for ScriptReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scheme {
            ScriptScheme::Packaged => write!(f, "{PACKAGED_PREFIX}{}", self.path),
            ScriptScheme::FileSystem => f.write_str(&self.path),
        }
    }
}

/// Source of a routing configuration set for the control channel.
pub trait RouteLoader {
    fn load(&self) -> Result<RoutingConfigurationSet, LifecycleError>;
}

/// Reads a script and evaluates it. Stateless: every `load` re-reads.
pub struct ScriptLoader {
    reference: ScriptReference,
    evaluator: Arc<dyn ScriptEvaluator>,
}

impl ScriptLoader {
    pub fn new(reference: ScriptReference, evaluator: Arc<dyn ScriptEvaluator>) -> Self {
        Self {
            reference,
            evaluator,
        }
    }

    pub fn reference(&self) -> &ScriptReference {
        &self.reference
    }
}

impl RouteLoader for ScriptLoader {
    fn load(&self) -> Result<RoutingConfigurationSet, LifecycleError> {
        info!("loading route script {}", self.reference);
        let text = self.reference.resolve()?;
        debug!("script {}:\n{text}", self.reference);
        self.evaluator
            .evaluate(&text)
            .map_err(|source| LifecycleError::Evaluation {
                reference: self.reference.to_string(),
                source,
            })
    }
}

impl RouteLoader for RoutingConfigurationSet {
    fn load(&self) -> Result<RoutingConfigurationSet, LifecycleError> {
        Ok(self.clone())
    }
}
