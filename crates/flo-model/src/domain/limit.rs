use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Upper bound on tasks that are started but not yet settled.
///
/// Serialized as `null` (unbounded) or a positive integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<NonZeroUsize>", into = "Option<NonZeroUsize>")]
pub enum Limit {
    /// Every task starts immediately.
    #[default]
    Unbounded,
    /// At most this many tasks are in flight at once.
    Bounded(NonZeroUsize),
}

impl Limit {
    /// Build a bounded limit, rejecting zero.
    pub fn bounded(n: usize) -> Result<Self, ModelError> {
        NonZeroUsize::new(n)
            .map(Limit::Bounded)
            .ok_or(ModelError::ZeroLimit)
    }

    /// Number of tasks to start up front for a sequence of `total` tasks.
    ///
    /// This is `min(limit, total)`; an unbounded limit starts everything.
    #[inline]
    pub fn window(&self, total: usize) -> usize {
        match self {
            Limit::Unbounded => total,
            Limit::Bounded(n) => n.get().min(total),
        }
    }

    /// Returns `true` if this limit would actually hold back some of `total` tasks.
    #[inline]
    pub fn constrains(&self, total: usize) -> bool {
        self.window(total) < total
    }

    /// Read a limit from an environment variable.
    ///
    /// A missing variable means [`Limit::Unbounded`].
    pub fn from_env(var: &str) -> Result<Self, ModelError> {
        match std::env::var(var) {
            Ok(raw) => raw.parse(),
            Err(std::env::VarError::NotPresent) => Ok(Limit::Unbounded),
            Err(std::env::VarError::NotUnicode(_)) => Err(ModelError::NonUnicodeEnv {
                var: var.to_string(),
            }),
        }
    }
}

impl From<Option<NonZeroUsize>> for Limit {
    fn from(value: Option<NonZeroUsize>) -> Self {
        value.map_or(Limit::Unbounded, Limit::Bounded)
    }
}

impl From<Limit> for Option<NonZeroUsize> {
    fn from(value: Limit) -> Self {
        match value {
            Limit::Unbounded => None,
            Limit::Bounded(n) => Some(n),
        }
    }
}

impl From<NonZeroUsize> for Limit {
    fn from(value: NonZeroUsize) -> Self {
        Limit::Bounded(value)
    }
}

impl FromStr for Limit {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "" | "none" | "unbounded" => Ok(Limit::Unbounded),
            digits => {
                let n: usize = digits
                    .parse()
                    .map_err(|_| ModelError::InvalidLimit(s.to_string()))?;
                Limit::bounded(n)
            }
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Unbounded => f.write_str("unbounded"),
            Limit::Bounded(n) => write!(f, "{n}"),
        }
    }
}
