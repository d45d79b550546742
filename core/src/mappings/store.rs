//! Mapping store
//!
//! Holds the ordered global mapping list plus per-token lists, and serves
//! the merged view one resolution pass reads. Persistence is TOML at this
//! boundary only; the legacy object-keyed file shape is converted to the
//! array shape on load (see `effigy_types::MappingFile`) and never
//! written back.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use effigy_types::{Mapping, MappingFile};

use crate::error::StoreError;
use crate::host::TokenState;

#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    /// Global rules applying to every token (subject to scoping)
    global: Vec<Mapping>,

    /// Per-token rule lists, keyed by token id
    by_token: HashMap<String, Vec<Mapping>>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_global(&mut self, mappings: Vec<Mapping>) {
        self.global = mappings;
    }

    pub fn global(&self) -> &[Mapping] {
        &self.global
    }

    pub fn set_token_mappings(&mut self, token_id: impl Into<String>, mappings: Vec<Mapping>) {
        let token_id = token_id.into();
        if mappings.is_empty() {
            self.by_token.remove(&token_id);
        } else {
            self.by_token.insert(token_id, mappings);
        }
    }

    pub fn token_mappings(&self, token_id: &str) -> &[Mapping] {
        self.by_token
            .get(token_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Merged rule list for one token: its own mappings first, then global
    /// entries filtered by `target_actors` scope and deduplicated against
    /// the token's own entries by (label, group).
    pub fn for_token(&self, token: &dyn TokenState) -> Vec<Mapping> {
        let own = self.token_mappings(token.id());
        let mut merged: Vec<Mapping> = own.to_vec();

        for mapping in &self.global {
            if !mapping.target_actors.is_empty()
                && !mapping
                    .target_actors
                    .iter()
                    .any(|t| t == token.actor_type())
            {
                continue;
            }
            let shadowed = own.iter().any(|existing| {
                existing.effective_label() == mapping.effective_label()
                    && existing.group == mapping.group
            });
            if !shadowed {
                merged.push(mapping.clone());
            }
        }

        merged
    }

    // ─── Persistence ────────────────────────────────────────────────────────

    /// Load the global list from a TOML file, accepting either the current
    /// array shape or the legacy object-keyed shape.
    pub fn load_global(&mut self, path: &Path) -> Result<(), StoreError> {
        self.global = load_file(path)?;
        Ok(())
    }

    pub fn save_global(&self, path: &Path) -> Result<(), StoreError> {
        save_file(path, &self.global)
    }
}

/// Load one mapping file
pub fn load_file(path: &Path) -> Result<Vec<Mapping>, StoreError> {
    let contents = fs::read_to_string(path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let file: MappingFile = toml::from_str(&contents).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(file.into_mappings())
}

/// Save a mapping list in the current array shape
pub fn save_file(path: &Path, mappings: &[Mapping]) -> Result<(), StoreError> {
    #[derive(Serialize)]
    struct FileShape<'a> {
        mapping: &'a [Mapping],
    }

    let contents =
        toml::to_string_pretty(&FileShape { mapping: mappings }).map_err(|e| {
            StoreError::Serialize {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

    fs::write(path, contents).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
