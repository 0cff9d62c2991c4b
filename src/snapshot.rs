//! Regression snapshots: every game's layout over a fixed set of viewports.

use crate::api::{LayoutEngine, LayoutResult};
use crate::error::{TfResult, TouchForgeError};
use crate::geometry::{LayoutMetrics, SafeArea, Viewport};
use crate::schema::{Archetype, Binding, BindingName, SchemaInput};
use crate::selector::ControlType;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Named device profiles: (name, width, height, safe area T/R/B/L).
const VIEWPORT_TABLE: [(&str, f64, f64, [f64; 4]); 5] = [
    ("phone-portrait", 390.0, 844.0, [47.0, 0.0, 34.0, 0.0]),
    ("phone-landscape", 844.0, 390.0, [0.0, 47.0, 21.0, 47.0]),
    ("small-phone", 360.0, 640.0, [0.0, 0.0, 0.0, 0.0]),
    ("tablet-portrait", 810.0, 1080.0, [24.0, 0.0, 20.0, 0.0]),
    ("tablet-landscape", 1024.0, 768.0, [0.0, 0.0, 0.0, 0.0]),
];

pub fn regression_viewports() -> Vec<(&'static str, Viewport)> {
    VIEWPORT_TABLE
        .iter()
        .map(|(name, w, h, [t, r, b, l])| {
            let vp = Viewport::builder()
                .width(*w)
                .height(*h)
                .safe_area(SafeArea::new(*t, *r, *b, *l))
                .build();
            (*name, vp)
        })
        .collect()
}

pub fn viewport_by_name(name: &str) -> Option<Viewport> {
    regression_viewports()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, vp)| vp)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonSummary {
    pub id: String,
    pub role: BindingName,
    #[serde(rename = "type")]
    pub control_type: ControlType,
    pub keys: Binding,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub layout: Archetype,
    pub buttons: Vec<ButtonSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSnapshot {
    pub summary: LayoutSummary,
    pub metrics: LayoutMetrics,
}

impl From<&LayoutResult> for ViewportSnapshot {
    fn from(result: &LayoutResult) -> Self {
        let buttons = result
            .buttons
            .iter()
            .map(|b| ButtonSummary {
                id: b.id.clone(),
                role: b.role,
                control_type: b.control_type,
                keys: b.keys.clone(),
                x: round1(b.x),
                y: round1(b.y),
                size: round1(b.size),
            })
            .collect();
        Self {
            summary: LayoutSummary {
                layout: result.layout,
                buttons,
            },
            metrics: result.metrics.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub layouts: BTreeMap<String, ViewportSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBundle {
    pub games: BTreeMap<String, GameSnapshot>,
    /// Games whose schema could not be laid out, with the reason.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, String>,
}

impl SnapshotBundle {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> TfResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> TfResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Deterministic digest of the whole bundle, for quick equality checks.
    pub fn fingerprint(&self) -> TfResult<String> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_string(self)?.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

pub fn snapshot_game(engine: &LayoutEngine, input: &SchemaInput) -> TfResult<GameSnapshot> {
    let mut layouts = BTreeMap::new();
    for (name, viewport) in regression_viewports() {
        let result = engine.build_layout(input, &viewport)?;
        layouts.insert(name.to_string(), ViewportSnapshot::from(&result));
    }
    Ok(GameSnapshot { layouts })
}

/// Lays out every game in parallel. A failing game is recorded, not fatal.
pub fn build_bundle(engine: &LayoutEngine, games: &[(String, SchemaInput)]) -> SnapshotBundle {
    let results: Vec<(String, TfResult<GameSnapshot>)> = games
        .par_iter()
        .map(|(name, input)| (name.clone(), snapshot_game(engine, input)))
        .collect();

    let mut bundle = SnapshotBundle::default();
    for (name, result) in results {
        match result {
            Ok(game) => {
                bundle.games.insert(name, game);
            }
            Err(e) => {
                warn!("Snapshot failed for '{}': {}", name, e);
                bundle.failures.insert(name, e.to_string());
            }
        }
    }
    info!(
        "Snapshotted {} games ({} failed)",
        bundle.games.len(),
        bundle.failures.len()
    );
    bundle
}

/// Every `*.json` under `dir`, keyed by file stem, optionally filtered.
pub fn discover_games<P: AsRef<Path>>(
    dir: P,
    allow: Option<&BTreeSet<String>>,
) -> TfResult<Vec<(String, PathBuf)>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(TouchForgeError::Config(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| TouchForgeError::Config(e.to_string()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        if allow.is_some_and(|names| !names.contains(&stem)) {
            continue;
        }
        found.push((stem, path.to_path_buf()));
    }
    Ok(found)
}

pub fn load_inputs(paths: &[(String, PathBuf)]) -> TfResult<Vec<(String, SchemaInput)>> {
    paths
        .iter()
        .map(|(name, path)| {
            let text = fs::read_to_string(path)?;
            Ok((name.clone(), SchemaInput::from_json(&text)?))
        })
        .collect()
}

/// One name per line; blank lines and `#` comments are skipped.
pub fn load_name_list<P: AsRef<Path>>(path: P) -> TfResult<BTreeSet<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}
