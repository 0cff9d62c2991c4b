//! Diffs current configs and snapshots against a gold standard.

use crate::error::TfResult;
use crate::schema::{self, CanonicalConfig, SchemaInput};
use crate::snapshot::{GameSnapshot, SnapshotBundle};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DiffKind {
    Missing,
    Extra,
    Changed,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Diff {
    pub kind: DiffKind,
    pub key: String,
}

impl Diff {
    pub fn new(kind: DiffKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}

/// Key-by-key comparison over the union of both maps, sorted by key.
pub fn diff_maps<V: PartialEq>(current: &BTreeMap<String, V>, gold: &BTreeMap<String, V>) -> Vec<Diff> {
    let keys: BTreeSet<&String> = current.keys().chain(gold.keys()).collect();
    keys.into_iter()
        .filter_map(|key| match (current.get(key), gold.get(key)) {
            (None, _) => Some(Diff::new(DiffKind::Missing, key.clone())),
            (_, None) => Some(Diff::new(DiffKind::Extra, key.clone())),
            (Some(a), Some(b)) if a != b => Some(Diff::new(DiffKind::Changed, key.clone())),
            _ => None,
        })
        .collect()
}

/// Flattens a config into `layout`, `bindings.<name>` and `actionMeta.<name>` entries.
fn flatten_config(config: &CanonicalConfig) -> TfResult<BTreeMap<String, Value>> {
    let mut out = BTreeMap::new();
    out.insert("layout".to_string(), Value::String(config.layout.to_string()));
    for (name, binding) in &config.bindings {
        out.insert(format!("bindings.{}", name), serde_json::to_value(binding)?);
    }
    for (name, meta) in &config.action_meta {
        out.insert(format!("actionMeta.{}", name), serde_json::to_value(meta)?);
    }
    Ok(out)
}

pub fn config_diffs(current: &CanonicalConfig, gold: &CanonicalConfig) -> TfResult<Vec<Diff>> {
    Ok(diff_maps(&flatten_config(current)?, &flatten_config(gold)?))
}

pub fn snapshot_diffs(current: Option<&GameSnapshot>, gold: Option<&GameSnapshot>) -> Vec<Diff> {
    match (current, gold) {
        (Some(c), Some(g)) => {
            let mut diffs = Vec::new();
            for (viewport, gold_layout) in &g.layouts {
                match c.layouts.get(viewport) {
                    None => diffs.push(Diff::new(DiffKind::Missing, viewport.clone())),
                    Some(layout) if layout != gold_layout => {
                        diffs.push(Diff::new(DiffKind::Changed, viewport.clone()))
                    }
                    Some(_) => {}
                }
            }
            for viewport in c.layouts.keys().filter(|v| !g.layouts.contains_key(*v)) {
                diffs.push(Diff::new(DiffKind::Extra, viewport.clone()));
            }
            diffs
        }
        _ => vec![Diff::new(DiffKind::Missing, "layout_snapshot")],
    }
}

/// Outcome for one game. `config` is `None` when configs were not compared.
#[derive(Debug, Clone, Serialize)]
pub struct GameComparison {
    pub name: String,
    pub config: Option<Vec<Diff>>,
    pub layout: Vec<Diff>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompareReport {
    pub games: Vec<GameComparison>,
    pub missing_configs: Vec<String>,
    pub missing_gold: Vec<String>,
}

impl CompareReport {
    pub fn config_matches(&self) -> usize {
        self.games
            .iter()
            .filter(|g| g.config.as_ref().is_some_and(Vec::is_empty))
            .count()
    }

    pub fn layout_matches(&self) -> usize {
        self.games.iter().filter(|g| g.layout.is_empty()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.missing_configs.is_empty()
            && self.missing_gold.is_empty()
            && self
                .games
                .iter()
                .all(|g| g.layout.is_empty() && g.config.as_ref().is_none_or(Vec::is_empty))
    }
}

/// Where per-game config files live.
#[derive(Debug, Clone)]
pub struct ConfigDirs {
    pub current: PathBuf,
    pub gold: PathBuf,
}

/// Gold configs may be stored as `<name>.json` or `<name>_config.json`.
fn find_config(dir: &Path, name: &str) -> Option<PathBuf> {
    [format!("{}.json", name), format!("{}_config.json", name)]
        .into_iter()
        .map(|f| dir.join(f))
        .find(|p| p.is_file())
}

fn load_config(path: &Path) -> TfResult<Result<CanonicalConfig, String>> {
    let text = fs::read_to_string(path)?;
    let input = SchemaInput::from_json(&text)?;
    Ok(schema::normalize(&input).map_err(|e| e.to_string()))
}

pub fn compare(
    current: &SnapshotBundle,
    gold: &SnapshotBundle,
    configs: Option<&ConfigDirs>,
    names: Option<&BTreeSet<String>>,
) -> TfResult<CompareReport> {
    let names: BTreeSet<String> = match names {
        Some(n) => n.clone(),
        None => gold.games.keys().cloned().collect(),
    };

    let mut report = CompareReport::default();

    for name in names {
        let config = match configs {
            None => None,
            Some(dirs) => {
                let current_path = find_config(&dirs.current, &name);
                let gold_path = find_config(&dirs.gold, &name);
                match (current_path, gold_path) {
                    (None, _) => {
                        report.missing_configs.push(name.clone());
                        None
                    }
                    (_, None) => {
                        report.missing_gold.push(name.clone());
                        None
                    }
                    (Some(c), Some(g)) => Some(match (load_config(&c)?, load_config(&g)?) {
                        (Ok(c), Ok(g)) => config_diffs(&c, &g)?,
                        (Err(e), _) => vec![Diff::new(DiffKind::Invalid, format!("current ({})", e))],
                        (_, Err(e)) => vec![Diff::new(DiffKind::Invalid, format!("gold ({})", e))],
                    }),
                }
            }
        };

        let layout = snapshot_diffs(current.games.get(&name), gold.games.get(&name));
        debug!("{}: {} layout diffs", name, layout.len());
        report.games.push(GameComparison { name, config, layout });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_maps_reports_each_kind() {
        let current = BTreeMap::from([
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("d".to_string(), 4),
        ]);
        let gold = BTreeMap::from([
            ("a".to_string(), 1),
            ("b".to_string(), 3),
            ("c".to_string(), 3),
        ]);
        let diffs: Vec<String> = diff_maps(&current, &gold).iter().map(|d| d.to_string()).collect();
        assert_eq!(diffs, vec!["changed:b", "missing:c", "extra:d"]);
    }
}
