// packages/harness/src/harness/constants.rs
//! Symbolic state constants
//!
//! Tests compare against `SymbolicState` names rather than whatever values
//! the engine's enum happens to use. The mirror is filled once during setup,
//! before interception becomes visible to tests, and never changes after.

use crate::loader::definitions::EnumDef;
use crate::utils::errors::{HarnessError, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SymbolicState {
    Active,
    Idle,
    Locked,
}

impl SymbolicState {
    pub const ALL: [SymbolicState; 3] = [Self::Active, Self::Idle, Self::Locked];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Idle => "IDLE",
            Self::Locked => "LOCKED",
        }
    }
}

impl fmt::Display for SymbolicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic name to engine-native value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateConstants {
    values: BTreeMap<SymbolicState, i64>,
}

impl StateConstants {
    /// Copy ACTIVE, IDLE and LOCKED out of an engine enum
    ///
    /// Every name must be present and values must be distinct.
    pub fn from_enum(def: &EnumDef) -> Result<Self> {
        let mut values = BTreeMap::new();

        for state in SymbolicState::ALL {
            let value = *def.values.get(state.as_str()).ok_or_else(|| {
                HarnessError::load_failure(&def.name, format!("enum has no {} value", state))
            })?;

            if let Some((other, _)) = values.iter().find(|(_, v)| **v == value) {
                return Err(HarnessError::load_failure(
                    &def.name,
                    format!("{} and {} share value {}", other, state, value),
                ));
            }
            values.insert(state, value);
        }

        Ok(Self { values })
    }

    pub fn get(&self, state: SymbolicState) -> i64 {
        // from_enum guarantees every state is present
        self.values.get(&state).copied().unwrap_or_default()
    }

    pub fn active(&self) -> i64 {
        self.get(SymbolicState::Active)
    }

    pub fn idle(&self) -> i64 {
        self.get(SymbolicState::Idle)
    }

    pub fn locked(&self) -> i64 {
        self.get(SymbolicState::Locked)
    }

    /// Reverse lookup of an engine value
    pub fn name_of(&self, value: i64) -> Option<SymbolicState> {
        self.values
            .iter()
            .find(|(_, v)| **v == value)
            .map(|(state, _)| *state)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolicState, i64)> + '_ {
        self.values.iter().map(|(state, value)| (*state, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Write-once holder for the constants
#[derive(Debug, Default)]
pub struct ConstantMirror {
    table: OnceCell<StateConstants>,
}

impl ConstantMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the mirror from `def`; a filled mirror is left as it is
    pub fn populate(&self, def: &EnumDef) -> Result<&StateConstants> {
        self.table.get_or_try_init(|| {
            let constants = StateConstants::from_enum(def)?;
            debug!("Mirrored {} from {}", constants.len(), def.name);
            Ok(constants)
        })
    }

    /// `None` until setup has populated the mirror
    pub fn get(&self) -> Option<&StateConstants> {
        self.table.get()
    }
}
