//! The shared sampler capability and its call plumbing.

use rand::Rng;
use u_placement_core::{Error, GeometryOracle, ObjectHandle, PlacementTable, Result};

use crate::composite::SequentialCompositeSampler;
use crate::multi_region::MultiRegionSampler;
use crate::reference::SampleArgs;
use crate::uniform::UniformRegionSampler;

/// Collaborators threaded through one sampling call.
///
/// The generator is owned by the top-level caller. No sampler seeds its own.
pub struct SampleContext<'a, R: Rng + ?Sized> {
    /// Geometric predicates.
    pub oracle: &'a dyn GeometryOracle,
    /// Random number generator.
    pub rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> SampleContext<'a, R> {
    /// Creates a context.
    pub fn new(oracle: &'a dyn GeometryOracle, rng: &'a mut R) -> Self {
        Self { oracle, rng }
    }
}

/// The retry budget ran out for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhaustion {
    /// Object that could not be placed.
    pub object: String,
    /// Sampler that gave up.
    pub sampler: String,
    /// Attempts made.
    pub attempts: usize,
}

impl From<Exhaustion> for Error {
    fn from(e: Exhaustion) -> Self {
        Error::PlacementExhausted {
            object: e.object,
            sampler: e.sampler,
            attempts: e.attempts,
        }
    }
}

/// Result of a sampling attempt.
#[derive(Debug, Clone)]
pub enum SampleOutcome {
    /// Every object was placed; holds only the newly placed entries.
    Placed(PlacementTable),
    /// Some object could not be placed.
    Exhausted(Exhaustion),
}

impl SampleOutcome {
    /// Returns true on success.
    pub fn is_placed(&self) -> bool {
        matches!(self, SampleOutcome::Placed(_))
    }

    /// Converts exhaustion into [`Error::PlacementExhausted`].
    pub fn into_result(self) -> Result<PlacementTable> {
        match self {
            SampleOutcome::Placed(delta) => Ok(delta),
            SampleOutcome::Exhausted(e) => Err(e.into()),
        }
    }
}

/// Any sampler kind.
#[derive(Debug)]
pub enum Sampler {
    /// Rejection sampling within one region.
    UniformRegion(UniformRegionSampler),
    /// Ordered pipeline of child samplers.
    SequentialComposite(SequentialCompositeSampler),
    /// One of up to four quadrant samplers, picked at random.
    MultiRegion(MultiRegionSampler),
}

impl Sampler {
    /// Sampler name.
    pub fn name(&self) -> &str {
        match self {
            Sampler::UniformRegion(s) => s.name(),
            Sampler::SequentialComposite(s) => s.name(),
            Sampler::MultiRegion(s) => s.name(),
        }
    }

    /// Names of every object registered in this sampler and its descendants.
    pub fn object_names(&self) -> Vec<String> {
        match self {
            Sampler::UniformRegion(s) => s.object_names(),
            Sampler::SequentialComposite(s) => s.object_names(),
            Sampler::MultiRegion(s) => s.object_names(),
        }
    }

    /// Registers more objects.
    pub fn add_objects(&mut self, objects: Vec<ObjectHandle>) -> Result<()> {
        match self {
            Sampler::UniformRegion(s) => s.add_objects(objects),
            Sampler::SequentialComposite(s) => s.add_objects(objects),
            Sampler::MultiRegion(s) => s.add_objects(objects),
        }
    }

    /// Clears registered objects, recursively.
    pub fn reset(&mut self) {
        match self {
            Sampler::UniformRegion(s) => s.reset(),
            Sampler::SequentialComposite(s) => s.reset(),
            Sampler::MultiRegion(s) => s.reset(),
        }
    }

    /// Attempts to place every registered object.
    pub fn attempt<R: Rng + ?Sized>(
        &self,
        table: &PlacementTable,
        args: &SampleArgs,
        ctx: &mut SampleContext<'_, R>,
    ) -> Result<SampleOutcome> {
        match self {
            Sampler::UniformRegion(s) => s.attempt(table, args, ctx),
            Sampler::SequentialComposite(s) => s.attempt(table, args, ctx),
            Sampler::MultiRegion(s) => s.attempt(table, args, ctx),
        }
    }

    /// Places every registered object, failing with
    /// [`Error::PlacementExhausted`] if one cannot be placed.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        table: &PlacementTable,
        args: &SampleArgs,
        ctx: &mut SampleContext<'_, R>,
    ) -> Result<PlacementTable> {
        self.attempt(table, args, ctx)?.into_result()
    }
}

impl From<UniformRegionSampler> for Sampler {
    fn from(s: UniformRegionSampler) -> Self {
        Sampler::UniformRegion(s)
    }
}

impl From<SequentialCompositeSampler> for Sampler {
    fn from(s: SequentialCompositeSampler) -> Self {
        Sampler::SequentialComposite(s)
    }
}

impl From<MultiRegionSampler> for Sampler {
    fn from(s: MultiRegionSampler) -> Self {
        Sampler::MultiRegion(s)
    }
}

/// Fails with [`Error::DuplicateObject`] if any of `incoming` is in `registered`
/// or repeats within itself.
pub(crate) fn check_unique<'a, I>(registered: &[String], incoming: I) -> Result<()>
where
    I: IntoIterator<Item = &'a ObjectHandle>,
{
    let mut seen: Vec<&str> = registered.iter().map(String::as_str).collect();
    for obj in incoming {
        let name = obj.name();
        if seen.contains(&name) {
            return Err(Error::DuplicateObject(name.to_string()));
        }
        seen.push(name);
    }
    Ok(())
}
