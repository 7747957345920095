//! JSON scene loader.
//!
//! A scene lists box objects, fixtures placed before sampling, the sampler
//! tree, and the top-level call arguments.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use nalgebra::Vector3;
use serde::Deserialize;
use thiserror::Error;
use u_placement_core::{
    BoxObject, ObjectHandle, PlacedEntry, PlacementTable, Pose, QuadrantRegions, Region, Side,
    SpawnSite,
};
use u_placement_sampler::{
    MultiRegionSampler, SampleArgs, SampleOverrides, Sampler, SamplerConfig,
    SequentialCompositeSampler, UniformRegionSampler,
};

/// Errors that can occur when loading a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid scene: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Placement(#[from] u_placement_core::Error),
}

/// A loaded scene, ready to sample.
#[derive(Debug)]
pub struct Scene {
    /// Every declared object by name.
    pub objects: HashMap<String, ObjectHandle>,
    /// Entries present before sampling.
    pub fixtures: PlacementTable,
    /// Root of the sampler tree.
    pub sampler: Sampler,
    /// Arguments of the top-level call.
    pub args: SampleArgs,
}

impl Scene {
    /// Reactivates the spawn sites of every object, for a fresh pass.
    pub fn reactivate_spawns(&self) {
        for object in self.objects.values() {
            if let Some(spawns) = object.spawns() {
                spawns.reactivate_all();
            }
        }
    }
}

/// Builds [`Scene`]s from JSON.
#[derive(Debug, Default)]
pub struct SceneParser {
    attempts: Option<usize>,
}

impl SceneParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the retry budget of every uniform and multi-region sampler.
    pub fn with_attempts(mut self, attempts: Option<usize>) -> Self {
        self.attempts = attempts;
        self
    }

    /// Parses a scene from a JSON file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Scene, SceneError> {
        let content = fs::read_to_string(path)?;
        self.parse_json(&content)
    }

    /// Parses a scene from a JSON string.
    pub fn parse_json(&self, json: &str) -> Result<Scene, SceneError> {
        let raw: RawScene = serde_json::from_str(json)?;
        self.convert_raw_scene(raw)
    }

    fn convert_raw_scene(&self, raw: RawScene) -> Result<Scene, SceneError> {
        let mut objects = HashMap::new();
        for raw_object in raw.objects {
            let name = raw_object.name.clone();
            let handle = convert_raw_object(raw_object)?;
            if objects.insert(name.clone(), handle).is_some() {
                return Err(SceneError::InvalidFormat(format!(
                    "object '{}' declared twice",
                    name
                )));
            }
        }

        let mut fixtures = PlacementTable::new();
        for fixture in raw.fixtures {
            let object = lookup(&objects, &fixture.object)?;
            let quat = checked_quat(fixture.quat)?;
            let pose = Pose::from_wxyz(Vector3::from(fixture.position), quat);
            fixtures.insert(PlacedEntry::new(pose, object))?;
        }

        let sampler = self.convert_raw_sampler(raw.sampler, &objects)?;

        Ok(Scene {
            objects,
            fixtures,
            sampler,
            args: raw.args,
        })
    }

    fn convert_raw_sampler(
        &self,
        raw: RawSampler,
        objects: &HashMap<String, ObjectHandle>,
    ) -> Result<Sampler, SceneError> {
        let sampler = match raw {
            RawSampler::Uniform {
                name,
                objects: names,
                region,
                config,
            } => UniformRegionSampler::new(
                name,
                lookup_all(objects, &names)?,
                region,
                self.apply_attempts(config),
            )?
            .into(),

            RawSampler::MultiRegion {
                name,
                objects: names,
                regions,
                side,
                config,
            } => {
                let side: Side = side.parse()?;
                let regions = QuadrantRegions::from_named(regions)?;
                MultiRegionSampler::new(
                    name,
                    regions,
                    side,
                    lookup_all(objects, &names)?,
                    self.apply_attempts(config),
                )?
                .into()
            }

            RawSampler::Composite {
                name,
                children,
                hide,
            } => {
                let mut composite = SequentialCompositeSampler::new(name);
                for child in children {
                    let sampler = self.convert_raw_sampler(child.sampler, objects)?;
                    composite.append_sampler(sampler, child.overrides, child.optional)?;
                }
                if !hide.is_empty() {
                    composite.hide(lookup_all(objects, &hide)?)?;
                }
                composite.into()
            }
        };
        Ok(sampler)
    }

    fn apply_attempts(&self, mut config: SamplerConfig) -> SamplerConfig {
        if let Some(attempts) = self.attempts {
            config.num_attempts = attempts;
        }
        config
    }
}

fn convert_raw_object(raw: RawObject) -> Result<ObjectHandle, SceneError> {
    let [w, d, h] = raw.size;
    let mut object = BoxObject::new(raw.name, w, d, h);
    object.validate()?;
    if let Some(quat) = raw.init_quat {
        let orientation = Pose::from_wxyz(Vector3::zeros(), checked_quat(quat)?).orientation;
        object = object.with_init_orientation(orientation);
    }
    for spawn in raw.spawns {
        object = object.with_spawn(
            SpawnSite::new(Vector3::from(spawn.offset))
                .with_half_height(spawn.half_height)
                .with_disabled(spawn.disabled),
        );
    }
    Ok(object.into_handle())
}

fn checked_quat(quat: [f64; 4]) -> Result<[f64; 4], SceneError> {
    let norm_sq: f64 = quat.iter().map(|v| v * v).sum();
    if !norm_sq.is_finite() || norm_sq < 1e-12 {
        return Err(SceneError::InvalidFormat(format!(
            "quaternion {:?} cannot be normalized",
            quat
        )));
    }
    Ok(quat)
}

fn lookup(objects: &HashMap<String, ObjectHandle>, name: &str) -> Result<ObjectHandle, SceneError> {
    objects
        .get(name)
        .cloned()
        .ok_or_else(|| SceneError::InvalidFormat(format!("unknown object '{}'", name)))
}

fn lookup_all(
    objects: &HashMap<String, ObjectHandle>,
    names: &[String],
) -> Result<Vec<ObjectHandle>, SceneError> {
    names.iter().map(|n| lookup(objects, n)).collect()
}

fn identity_quat() -> [f64; 4] {
    [1.0, 0.0, 0.0, 0.0]
}

fn default_side() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize)]
struct RawScene {
    objects: Vec<RawObject>,
    #[serde(default)]
    fixtures: Vec<RawFixture>,
    sampler: RawSampler,
    #[serde(default)]
    args: SampleArgs,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    name: String,
    size: [f64; 3],
    #[serde(default)]
    init_quat: Option<[f64; 4]>,
    #[serde(default)]
    spawns: Vec<RawSpawn>,
}

#[derive(Debug, Deserialize)]
struct RawSpawn {
    offset: [f64; 3],
    #[serde(default)]
    half_height: f64,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct RawFixture {
    object: String,
    position: [f64; 3],
    #[serde(default = "identity_quat")]
    quat: [f64; 4],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawSampler {
    Uniform {
        name: String,
        objects: Vec<String>,
        #[serde(default)]
        region: Region,
        #[serde(default)]
        config: SamplerConfig,
    },
    MultiRegion {
        name: String,
        objects: Vec<String>,
        regions: Vec<(String, Region)>,
        #[serde(default = "default_side")]
        side: String,
        #[serde(default)]
        config: SamplerConfig,
    },
    Composite {
        name: String,
        #[serde(default)]
        children: Vec<RawChild>,
        #[serde(default)]
        hide: Vec<String>,
    },
}

#[derive(Debug, Deserialize)]
struct RawChild {
    sampler: RawSampler,
    #[serde(default)]
    overrides: SampleOverrides,
    #[serde(default)]
    optional: bool,
}
