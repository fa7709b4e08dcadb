use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

use crate::{Error, InternalResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Window used by `ma`/`ema` when the call omits one.
    #[serde(default = "default_window")]
    pub default_window: usize,

    #[serde(default = "default_true")]
    pub evaluate_arguments_concurrently: bool,

    /// Fixed "now" (unix seconds) stamped on scalar results. Wall clock when
    /// unset.
    #[serde(default)]
    pub now_override: Option<i64>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            default_window: default_window(),
            evaluate_arguments_concurrently: default_true(),
            now_override: None,
        }
    }
}

impl InterpreterConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()
    }

    pub fn from_str(s: &str) -> InternalResult<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()
    }

    fn validate(self) -> InternalResult<Self> {
        if self.default_window == 0 {
            return Err(Error::config("default_window must be a positive integer"));
        }
        Ok(self)
    }
}

fn default_window() -> usize {
    14
}
fn default_true() -> bool {
    true
}
