//! Codebase pipeline
//!
//! Drives a whole source tree through the phases:
//!
//! 1. discover files under the source root
//! 2. parse `.js` units in parallel
//! 3. register and finalize the framework registry, then the project registry
//!    (or restore both phases from a snapshot)
//! 4. compile units in parallel against the immutable registry
//! 5. write outputs under the stamped target root
//!
//! A unit that fails to compile is reproduced verbatim and reported.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{Snapshot, SnapshotCache};
use crate::capability::CapabilityTable;
use crate::config::CompilerConfig;
use crate::diagnostics::{ranked, Diagnostics, DIAG_UNIT_FALLBACK};
use crate::discovery::{discover, read_unit, SourceFile};
use crate::error::PipelineError;
use crate::extract::ParsedUnit;
use crate::naming::NamingContext;
use crate::registry::Registry;
use crate::unit::compile_unit;

pub const GENERATOR: &str = "extjs2react";
pub const STAMP_FILE: &str = "extjs2react.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stamp {
    generator: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUTS
// ═══════════════════════════════════════════════════════════════════════════════

/// What a unit turns into in the target tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutput {
    Compiled { path: String, code: String },
    /// Unparseable, or compilation failed.
    Verbatim { path: String, code: String },
    /// Every class was assimilated elsewhere.
    Removed { path: String },
}

impl UnitOutput {
    pub fn path(&self) -> &str {
        match self {
            UnitOutput::Compiled { path, .. }
            | UnitOutput::Verbatim { path, .. }
            | UnitOutput::Removed { path } => path,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            UnitOutput::Compiled { code, .. } | UnitOutput::Verbatim { code, .. } => Some(code),
            UnitOutput::Removed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranspileSummary {
    pub compiled: usize,
    pub copied: usize,
    pub removed: usize,
    pub fallbacks: usize,
}

/// Ranked usage tables for tuning rule and capability tables.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub class_names: Vec<(String, usize)>,
    pub method_calls: Vec<(String, usize)>,
    pub unrecognized_tags: Vec<(String, usize)>,
    pub unrecognized_props: Vec<(String, usize)>,
    pub property_usage: Vec<(String, usize)>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CODEBASE
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Codebase {
    units: Vec<ParsedUnit>,
    /// Files copied through untouched, relative to the source root.
    unparseable: Vec<String>,
    registry: Registry,
    capabilities: CapabilityTable,
    diagnostics: Diagnostics,
    source_dir: PathBuf,
}

impl Codebase {
    /// Discover, parse and resolve the source tree named by `config`.
    pub fn load(config: &CompilerConfig) -> Result<Codebase, PipelineError> {
        config.validate()?;
        let tree = discover(&config.source_dir)?;
        let framework = match &config.framework_file {
            Some(path) => Some(read_unit(path)?),
            None => None,
        };

        let mut codebase = match &config.snapshot_id {
            Some(id) => Self::load_with_snapshot(config, id, tree.scripts, framework)?,
            None => Self::from_sources(tree.scripts, framework.as_ref(), config)?,
        };
        codebase.unparseable.extend(tree.assets);
        codebase.unparseable.sort();
        codebase.source_dir = config.source_dir.clone();
        Ok(codebase)
    }

    /// Parse and resolve in-memory units. `framework` declares the classes the
    /// project extends but does not compile.
    pub fn from_sources(
        scripts: Vec<SourceFile>,
        framework: Option<&SourceFile>,
        config: &CompilerConfig,
    ) -> Result<Codebase, PipelineError> {
        let mut diagnostics = Diagnostics::new();
        let parent = build_framework_registry(framework, config, &mut diagnostics)?;

        let callees = &config.define_callees;
        let parsed: Vec<ParsedUnit> = scripts
            .par_iter()
            .map(|file| ParsedUnit::parse(&file.path, &file.source, callees))
            .collect();

        let mut registry = Registry::new(NamingContext::new(&config.words));
        if let Some(parent) = parent {
            registry = registry.with_parent(parent);
        }

        let mut units = Vec::new();
        let mut unparseable = Vec::new();
        for mut unit in parsed {
            diagnostics.merge(std::mem::take(&mut unit.diagnostics));
            if unit.parseable {
                registry.register(&unit)?;
                units.push(unit);
            } else {
                unparseable.push(unit.path);
            }
        }
        registry.finalize()?;
        diagnostics.merge(registry.take_diagnostics());

        log::info!(
            "resolved {} class(es) in {} unit(s); {} file(s) copied through",
            registry.len(),
            units.len(),
            unparseable.len()
        );

        Ok(Codebase {
            units,
            unparseable,
            registry,
            capabilities: CapabilityTable::default(),
            diagnostics,
            source_dir: config.source_dir.clone(),
        })
    }

    fn load_with_snapshot(
        config: &CompilerConfig,
        id: &str,
        scripts: Vec<SourceFile>,
        framework: Option<SourceFile>,
    ) -> Result<Codebase, PipelineError> {
        let cache = SnapshotCache::new(&config.snapshot_dir);
        let fingerprint = SnapshotCache::compute_fingerprint(
            scripts
                .iter()
                .chain(framework.iter())
                .map(|f| (f.path.as_str(), f.source.as_str())),
            &config.words,
            &config.define_callees,
        );

        if let Some(snapshot) = cache.get(id, &fingerprint) {
            let mut diagnostics = Diagnostics::new();
            let parent = build_framework_registry(framework.as_ref(), config, &mut diagnostics)?;
            let registry = Registry::restore(
                snapshot.classes,
                NamingContext::new(&snapshot.words),
                parent,
            )?;
            let parsed: Vec<&str> = snapshot.units.iter().map(|u| u.path.as_str()).collect();
            let unparseable = scripts
                .iter()
                .filter(|f| !parsed.contains(&f.path.as_str()))
                .map(|f| f.path.clone())
                .collect();
            return Ok(Codebase {
                units: snapshot.units,
                unparseable,
                registry,
                capabilities: CapabilityTable::default(),
                diagnostics,
                source_dir: config.source_dir.clone(),
            });
        }

        let codebase = Self::from_sources(scripts, framework.as_ref(), config)?;
        let snapshot = Snapshot {
            fingerprint,
            words: config.words.clone(),
            units: codebase.units.clone(),
            classes: codebase.registry.classes().cloned().collect(),
        };
        cache.set(id, &snapshot)?;
        log::info!("saved snapshot '{}'", id);
        Ok(codebase)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn units(&self) -> &[ParsedUnit] {
        &self.units
    }

    pub fn unparseable(&self) -> &[String] {
        &self.unparseable
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn with_capabilities(mut self, capabilities: CapabilityTable) -> Self {
        self.capabilities = capabilities;
        self
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Compile
    // ───────────────────────────────────────────────────────────────────────────

    /// Compile every parseable unit in parallel. Diagnostics of each unit are
    /// merged afterwards in unit order.
    pub fn compile(&self) -> (Vec<UnitOutput>, Diagnostics) {
        let results: Vec<(UnitOutput, Diagnostics)> = self
            .units
            .par_iter()
            .map(|unit| {
                let mut diagnostics = Diagnostics::new();
                let output = match compile_unit(unit, &self.registry, &self.capabilities) {
                    Ok(Some(compiled)) => {
                        diagnostics.merge(compiled.diagnostics);
                        UnitOutput::Compiled {
                            path: compiled.path,
                            code: compiled.code,
                        }
                    }
                    Ok(None) => UnitOutput::Removed {
                        path: unit.path.clone(),
                    },
                    Err(e) => {
                        diagnostics.report(
                            DIAG_UNIT_FALLBACK,
                            format!("Compilation failed, copying verbatim: {}", e),
                            Some(&unit.path),
                        );
                        UnitOutput::Verbatim {
                            path: unit.path.clone(),
                            code: unit.source.clone(),
                        }
                    }
                };
                (output, diagnostics)
            })
            .collect();

        let mut diagnostics = self.diagnostics.clone();
        let outputs = results
            .into_iter()
            .map(|(output, unit_diagnostics)| {
                diagnostics.merge(unit_diagnostics);
                output
            })
            .collect();
        (outputs, diagnostics)
    }

    /// Compile into `target_dir`. Refuses to touch an existing directory that
    /// carries no matching stamp.
    pub fn transpile(&self, target_dir: &Path) -> Result<(TranspileSummary, Diagnostics), PipelineError> {
        prepare_target(target_dir)?;

        let mut summary = TranspileSummary::default();
        for path in &self.unparseable {
            let from = self.source_dir.join(path);
            let to = target_dir.join(path);
            ensure_parent(&to)?;
            fs::copy(&from, &to).map_err(|e| PipelineError::io(&from, e))?;
            summary.copied += 1;
        }

        let (outputs, diagnostics) = self.compile();
        for output in &outputs {
            let to = target_dir.join(output.path());
            match output {
                UnitOutput::Compiled { code, .. } | UnitOutput::Verbatim { code, .. } => {
                    ensure_parent(&to)?;
                    fs::write(&to, code).map_err(|e| PipelineError::io(&to, e))?;
                    if matches!(output, UnitOutput::Compiled { .. }) {
                        summary.compiled += 1;
                    } else {
                        summary.fallbacks += 1;
                    }
                }
                UnitOutput::Removed { .. } => {
                    if to.exists() {
                        fs::remove_file(&to).map_err(|e| PipelineError::io(&to, e))?;
                    }
                    summary.removed += 1;
                }
            }
        }

        log::info!(
            "transpiled {} unit(s), copied {}, removed {}, {} fallback(s)",
            summary.compiled,
            summary.copied,
            summary.removed,
            summary.fallbacks
        );
        Ok((summary, diagnostics))
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Reports
    // ───────────────────────────────────────────────────────────────────────────

    /// Usage tables. Tag, prop and property tallies come from a compile pass.
    pub fn usage_report(&self, compiled: &Diagnostics) -> UsageReport {
        UsageReport {
            class_names: self.registry.class_names_ranked(),
            method_calls: self.registry.method_call_frequencies(),
            unrecognized_tags: ranked(&compiled.unrecognized_tags),
            unrecognized_props: ranked(&compiled.unrecognized_props),
            property_usage: ranked(&compiled.property_usage),
        }
    }
}

fn build_framework_registry(
    framework: Option<&SourceFile>,
    config: &CompilerConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Option<Arc<Registry>>, PipelineError> {
    let Some(file) = framework else {
        return Ok(None);
    };
    let mut unit = ParsedUnit::parse(&file.path, &file.source, &config.define_callees);
    diagnostics.merge(std::mem::take(&mut unit.diagnostics));

    let mut registry = Registry::new(NamingContext::new(&config.words));
    registry.register(&unit)?;
    registry.finalize()?;
    diagnostics.merge(registry.take_diagnostics());
    log::info!("framework registry: {} class(es)", registry.len());
    Ok(Some(Arc::new(registry)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TARGET ROOT
// ═══════════════════════════════════════════════════════════════════════════════

/// Check the stamp of an existing target root, then (re)write it.
pub fn prepare_target(target_dir: &Path) -> Result<(), PipelineError> {
    let stamp_path = target_dir.join(STAMP_FILE);
    if target_dir.is_dir() {
        let generator = fs::read_to_string(&stamp_path)
            .ok()
            .and_then(|data| serde_json::from_str::<Stamp>(&data).ok())
            .map(|stamp| stamp.generator);
        if generator.as_deref() != Some(GENERATOR) {
            return Err(PipelineError::StampMismatch {
                root: target_dir.to_path_buf(),
                generator: GENERATOR.to_string(),
            });
        }
    }

    fs::create_dir_all(target_dir).map_err(|e| PipelineError::io(target_dir, e))?;
    let stamp = Stamp {
        generator: GENERATOR.to_string(),
    };
    let data = serde_json::to_string_pretty(&stamp)?;
    fs::write(&stamp_path, data).map_err(|e| PipelineError::io(&stamp_path, e))
}

fn ensure_parent(path: &Path) -> Result<(), PipelineError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e)),
        None => Ok(()),
    }
}
