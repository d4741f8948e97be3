use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::placement::ModelId;
use crate::policy::InteractionPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    pub max_objects: usize,
    /// Scale new objects by `hit distance * distance_scale_factor`.
    pub rescale_by_distance: bool,
    pub distance_scale_factor: f32,
    /// Model spawned until the picker changes it.
    pub model: ModelId,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            max_objects: 1,
            rescale_by_distance: false,
            distance_scale_factor: 0.3,
            model: ModelId(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManipulationSettings {
    /// World units per frame at one unit of distance from the camera.
    pub move_speed: f32,
}

impl Default for ManipulationSettings {
    fn default() -> Self {
        Self { move_speed: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Pauses longer than this restart tracking on resume.
    pub reset_after_pause_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reset_after_pause_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub placement: PlacementSettings,
    #[serde(default)]
    pub manipulation: ManipulationSettings,
    #[serde(default)]
    pub policy: InteractionPolicy,
    #[serde(default)]
    pub session: SessionSettings,
}

impl Profile {
    pub fn from_toml_str(txt: &str) -> Result<Self> {
        let profile: Profile = toml::from_str(txt)?;
        validate_profile(&profile)?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        Self::from_toml_str(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))
    }

    pub fn display_name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or("unnamed")
    }
}

pub fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

pub fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("arplace"))
}

pub fn profiles_dir() -> Result<PathBuf> {
    Ok(config_dir()?.join("profiles"))
}

/// Loads `default.toml` from the profiles directory, installing it first if missing.
pub fn load_or_install_default() -> Result<Profile> {
    let profdir = profiles_dir()?;
    fs::create_dir_all(&profdir)?;

    let def_path = profdir.join("default.toml");
    if !def_path.exists() {
        fs::write(&def_path, default_profile_text())?;
        info!("installed default profile at {}", def_path.display());
    }
    Profile::load(&def_path)
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

pub fn validate_profile(p: &Profile) -> Result<()> {
    if p.placement.max_objects == 0 {
        return Err(anyhow!("placement.max_objects must be at least 1"));
    }
    if !positive(p.placement.distance_scale_factor) {
        return Err(anyhow!(
            "placement.distance_scale_factor must be a positive number"
        ));
    }
    if !positive(p.manipulation.move_speed) {
        return Err(anyhow!("manipulation.move_speed must be a positive number"));
    }
    Ok(())
}
