//! Integration tests for u-placement-sampler.

use rand::rngs::StdRng;
use rand::SeedableRng;
use u_placement_core::{
    BoxObject, BoxOracle, Error, GeometryOracle, ObjectHandle, PlacedEntry, PlacementTable, Pose,
    Quadrant, QuadrantRegions, Region, RegionCorners, Side, SpawnSite,
};
use u_placement_sampler::{
    MultiRegionSampler, Reference, RotationPolicy, SampleArgs, SampleContext, SampleOutcome,
    SampleOverrides, Sampler, SamplerConfig, SequentialCompositeSampler, SpawnCommit,
    UniformRegionSampler,
};

fn cube(name: &str, size: f64) -> ObjectHandle {
    BoxObject::new(name, size, size, size).into_handle()
}

fn square_region(half: f64) -> Region {
    Region::new((-half, half), (-half, half))
}

mod scenario_tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use std::cell::Cell;
    use u_placement_core::PlaceableObject;

    #[test]
    fn test_single_object_small_region() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(100);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let sampler = UniformRegionSampler::new(
            "small",
            vec![cube("mug", 0.06)],
            square_region(0.1),
            SamplerConfig::new().with_num_attempts(5000),
        )
        .unwrap();
        let delta = sampler
            .sample(&PlacementTable::new(), &SampleArgs::new(), &mut ctx)
            .unwrap();

        let p = delta.get("mug").unwrap().pose.position;
        // The footprint, not only the center, stays within the region.
        assert!(p.x.abs() <= 0.1 - 0.03 + 1e-9);
        assert!(p.y.abs() <= 0.1 - 0.03 + 1e-9);
    }

    /// Counts overlap tests issued for one candidate object.
    struct CountingOracle {
        inner: BoxOracle,
        candidate: &'static str,
        calls: Cell<usize>,
    }

    impl GeometryOracle for CountingOracle {
        fn region_contains(
            &self,
            object: &dyn PlaceableObject,
            pose: &Pose,
            region: &RegionCorners,
        ) -> bool {
            self.inner.region_contains(object, pose, region)
        }

        fn intersects(
            &self,
            a: &dyn PlaceableObject,
            pose_a: &Pose,
            b: &dyn PlaceableObject,
            pose_b: &Pose,
        ) -> bool {
            if a.name() == self.candidate {
                self.calls.set(self.calls.get() + 1);
            }
            self.inner.intersects(a, pose_a, b, pose_b)
        }

        fn keypoints_in_region(
            &self,
            object: &dyn PlaceableObject,
            pose: &Pose,
            region: &RegionCorners,
            min_points: usize,
        ) -> bool {
            self.inner.keypoints_in_region(object, pose, region, min_points)
        }

        fn bounding_corners(&self, object: &dyn PlaceableObject, pose: &Pose) -> [Point3<f64>; 4] {
            self.inner.bounding_corners(object, pose)
        }
    }

    #[test]
    fn test_two_large_objects_exhaust_on_second() {
        let oracle = CountingOracle {
            inner: BoxOracle::new(),
            candidate: "second",
            calls: Cell::new(0),
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let sampler = UniformRegionSampler::new(
            "shared",
            vec![cube("first", 0.3), cube("second", 0.3)],
            square_region(0.1),
            SamplerConfig::new()
                .with_boundary_check(false)
                .with_num_attempts(300),
        )
        .unwrap();

        let err = sampler
            .sample(&PlacementTable::new(), &SampleArgs::new(), &mut ctx)
            .unwrap_err();
        match err {
            Error::PlacementExhausted {
                object,
                sampler,
                attempts,
            } => {
                assert_eq!(object, "second");
                assert_eq!(sampler, "shared");
                assert_eq!(attempts, 300);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // Every draw for "second" lands on "first", so each attempt costs
        // exactly one overlap test.
        assert_eq!(oracle.calls.get(), 300);
    }

    #[test]
    fn test_stacking_on_reference() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let mut table = PlacementTable::new();
        table
            .insert(PlacedEntry::new(
                Pose::at(0.0, 0.0, 0.0),
                BoxObject::new("a", 0.5, 0.5, 0.4).into_handle(),
            ))
            .unwrap();

        let sampler = UniformRegionSampler::new(
            "stack",
            vec![BoxObject::new("b", 0.1, 0.1, 0.2).into_handle()],
            square_region(0.15),
            SamplerConfig::default(),
        )
        .unwrap();
        let args = SampleArgs::new()
            .with_reference(Reference::object("a"))
            .with_on_top(true);
        let delta = sampler.sample(&table, &args, &mut ctx).unwrap();

        let p = delta.get("b").unwrap().pose.position;
        assert_relative_eq!(p.z, 0.2 + 0.1, epsilon = 1e-12);
        assert!(p.x.abs() <= 0.15 && p.y.abs() <= 0.15);
    }

    #[test]
    fn test_optional_clutter_dropped() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(11);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let main = UniformRegionSampler::new(
            "main",
            vec![cube("bowl", 0.15), cube("cup", 0.08)],
            square_region(0.6),
            SamplerConfig::default(),
        )
        .unwrap();
        let clutter = UniformRegionSampler::new(
            "clutter",
            vec![cube("box", 1.5)],
            square_region(0.6),
            SamplerConfig::new().with_num_attempts(50),
        )
        .unwrap();

        let mut composite = SequentialCompositeSampler::new("scene");
        composite
            .append_sampler(main, SampleOverrides::new(), false)
            .unwrap();
        composite
            .append_sampler(clutter, SampleOverrides::new(), true)
            .unwrap();

        let delta = composite
            .sample(&PlacementTable::new(), &SampleArgs::new(), &mut ctx)
            .unwrap();
        assert_eq!(delta.names().collect::<Vec<_>>(), vec!["bowl", "cup"]);
    }

    #[test]
    fn test_left_side_quadrants() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(2024);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let regions = QuadrantRegions::from_named([
            ("front_left", Region::new((-2.0, -1.0), (-2.0, -1.0))),
            ("front_right", Region::new((1.0, 2.0), (-2.0, -1.0))),
            ("back_left", Region::new((-2.0, -1.0), (1.0, 2.0))),
            ("back_right", Region::new((1.0, 2.0), (1.0, 2.0))),
        ])
        .unwrap();
        let sampler = MultiRegionSampler::new(
            "corner",
            regions.clone(),
            "left".parse().unwrap(),
            vec![cube("cup", 0.1)],
            SamplerConfig::default(),
        )
        .unwrap();

        let table = PlacementTable::new();
        let (mut front, mut back) = (0, 0);
        for _ in 0..400 {
            let delta = sampler.sample(&table, &SampleArgs::new(), &mut ctx).unwrap();
            let entry = delta.get("cup").unwrap();

            let inside: Vec<Quadrant> = Quadrant::ALL
                .into_iter()
                .filter(|q| {
                    let corners = regions.get(*q).corners(&nalgebra::Vector3::zeros());
                    oracle.region_contains(entry.object.as_ref(), &entry.pose, &corners)
                })
                .collect();
            assert_eq!(inside.len(), 1);
            match inside[0] {
                Quadrant::FrontLeft => front += 1,
                Quadrant::BackLeft => back += 1,
                other => panic!("placed in {}", other),
            }
        }
        assert!((120..=280).contains(&front), "front = {}", front);
        assert!((120..=280).contains(&back), "back = {}", back);
    }
}

mod invariant_tests {
    use super::*;

    fn kitchen() -> SequentialCompositeSampler {
        let mut composite = SequentialCompositeSampler::new("kitchen");
        let stages = [("large", 0.3, 3), ("medium", 0.15, 5), ("small", 0.05, 8)];
        for (stage, size, count) in stages {
            let objects = (0..count)
                .map(|i| cube(&format!("{}_{}", stage, i), size))
                .collect();
            let sampler = UniformRegionSampler::new(
                stage,
                objects,
                square_region(1.0),
                SamplerConfig::default(),
            )
            .unwrap();
            composite
                .append_sampler(sampler, SampleOverrides::new(), false)
                .unwrap();
        }
        composite
    }

    #[test]
    fn test_determinism() {
        let oracle = BoxOracle::new();
        let composite = kitchen();

        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut ctx = SampleContext::new(&oracle, &mut rng);
            composite
                .sample(&PlacementTable::new(), &SampleArgs::new(), &mut ctx)
                .unwrap()
                .records()
        };

        assert_eq!(run(17), run(17));
        assert_ne!(run(17), run(18));
    }

    #[test]
    fn test_boundary_and_non_overlap() {
        let oracle = BoxOracle::new();
        let composite = kitchen();
        let corners = square_region(1.0).corners(&nalgebra::Vector3::zeros());

        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut ctx = SampleContext::new(&oracle, &mut rng);
            let delta = composite
                .sample(&PlacementTable::new(), &SampleArgs::new(), &mut ctx)
                .unwrap();
            assert_eq!(delta.len(), 16);

            let entries: Vec<&PlacedEntry> = delta.iter().collect();
            for (i, a) in entries.iter().enumerate() {
                assert!(oracle.region_contains(a.object.as_ref(), &a.pose, &corners));
                for b in &entries[i + 1..] {
                    assert!(
                        !oracle.intersects(a.object.as_ref(), &a.pose, b.object.as_ref(), &b.pose),
                        "{} overlaps {}",
                        a.name(),
                        b.name()
                    );
                }
            }
        }
    }

    #[test]
    fn test_composite_returns_exactly_owned_objects() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(8);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let mut fixtures = PlacementTable::new();
        fixtures
            .insert(PlacedEntry::new(
                Pose::at(3.0, 3.0, 0.5),
                cube("fridge", 1.0),
            ))
            .unwrap();

        let mut inner = SequentialCompositeSampler::new("inner");
        inner
            .append_sampler(
                UniformRegionSampler::new(
                    "plates",
                    vec![cube("plate", 0.2)],
                    square_region(0.5),
                    SamplerConfig::default(),
                )
                .unwrap(),
                SampleOverrides::new(),
                false,
            )
            .unwrap();

        let mut outer = SequentialCompositeSampler::new("outer");
        outer
            .append_sampler(inner, SampleOverrides::new(), false)
            .unwrap();
        outer
            .append_sampler(
                UniformRegionSampler::new(
                    "fruit",
                    vec![cube("apple", 0.08)],
                    square_region(0.5),
                    SamplerConfig::default(),
                )
                .unwrap(),
                SampleOverrides::new(),
                false,
            )
            .unwrap();

        let mut names = outer.object_names();
        names.sort();
        assert_eq!(names, vec!["apple", "plate"]);

        let delta = outer.sample(&fixtures, &SampleArgs::new(), &mut ctx).unwrap();
        assert_eq!(delta.names().collect::<Vec<_>>(), vec!["plate", "apple"]);
        assert!(!delta.contains("fridge"));
    }
}

mod reference_tests {
    use super::*;
    use approx::assert_relative_eq;

    fn shelf() -> ObjectHandle {
        BoxObject::new("shelf", 1.0, 0.4, 1.2)
            .with_spawn(SpawnSite::new(nalgebra::Vector3::new(0.0, 0.0, -0.3)).with_half_height(0.2))
            .with_spawn(SpawnSite::new(nalgebra::Vector3::new(0.0, 0.0, 0.3)).with_half_height(0.2))
            .into_handle()
    }

    fn shelf_table(shelf: ObjectHandle) -> PlacementTable {
        let mut table = PlacementTable::new();
        table
            .insert(PlacedEntry::new(Pose::at(0.0, 0.0, 0.6), shelf))
            .unwrap();
        table
    }

    fn on_shelf(name: &str, object: &str) -> UniformRegionSampler {
        UniformRegionSampler::new(
            name,
            vec![cube(object, 0.1)],
            Region::new((-0.3, 0.3), (-0.1, 0.1)),
            SamplerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_each_spawn_hosts_one_object() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(5);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let shelf = shelf();
        let table = shelf_table(shelf.clone());

        let mut composite = SequentialCompositeSampler::new("shelving");
        for (name, object) in [("lower", "jar"), ("upper", "can"), ("extra", "box")] {
            composite
                .append_sampler(on_shelf(name, object), SampleOverrides::new(), true)
                .unwrap();
        }
        let args = SampleArgs::new().with_reference(Reference::any_spawn("shelf"));
        let delta = composite.sample(&table, &args, &mut ctx).unwrap();

        // Two sites, three candidates: the third finds no free site.
        assert_eq!(delta.names().collect::<Vec<_>>(), vec!["jar", "can"]);
        let mut heights: Vec<f64> = delta.iter().map(|e| e.pose.position.z).collect();
        heights.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(heights[0], 0.1 + 0.05, epsilon = 1e-9);
        assert_relative_eq!(heights[1], 0.7 + 0.05, epsilon = 1e-9);

        let sites = shelf.spawns().unwrap();
        assert!(sites.active_indices(true).is_empty());
    }

    #[test]
    fn test_spawn_commit_policies() {
        let oracle = BoxOracle::new();

        for (commit, consumed) in [(SpawnCommit::Eager, true), (SpawnCommit::OnSuccess, false)] {
            let mut rng = StdRng::seed_from_u64(1);
            let mut ctx = SampleContext::new(&oracle, &mut rng);
            let shelf = shelf();
            let table = shelf_table(shelf.clone());

            let sampler = UniformRegionSampler::new(
                "too_big",
                vec![cube("crate", 2.0)],
                Region::new((-0.3, 0.3), (-0.1, 0.1)),
                SamplerConfig::new()
                    .with_num_attempts(10)
                    .with_spawn_commit(commit),
            )
            .unwrap();
            let args = SampleArgs::new().with_reference(Reference::spawn("shelf", 0));
            let outcome = sampler.attempt(&table, &args, &mut ctx).unwrap();
            assert!(!outcome.is_placed());

            let active = shelf.spawns().unwrap().get(0).unwrap().is_active();
            assert_eq!(!active, consumed, "{:?}", commit);
        }
    }

    #[test]
    fn test_in_reference_region() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(12);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let mut table = PlacementTable::new();
        let counter = BoxObject::new("counter", 1.0, 0.6, 0.9).into_handle();
        table
            .insert(PlacedEntry::new(Pose::at(0.0, 0.0, 0.45), counter.clone()))
            .unwrap();
        let counter_top = RegionCorners::from_bounding(
            &oracle.bounding_corners(counter.as_ref(), &Pose::at(0.0, 0.0, 0.45)),
        );

        let sampler = UniformRegionSampler::new(
            "near_counter",
            vec![cube("towel", 0.1)],
            square_region(1.5),
            SamplerConfig::new()
                .with_boundary_check(false)
                .with_overlap_check(false)
                .with_in_ref_region(true),
        )
        .unwrap();
        let args = SampleArgs::new().with_reference(Reference::object("counter"));
        for _ in 0..20 {
            let delta = sampler.sample(&table, &args, &mut ctx).unwrap();
            let towel = delta.get("towel").unwrap();
            assert!(oracle.keypoints_in_region(towel.object.as_ref(), &towel.pose, &counter_top, 3));
        }
    }

    #[test]
    fn test_excluded_footprints_are_avoided() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(13);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let mut table = PlacementTable::new();
        let sink = BoxObject::new("sink", 0.8, 0.8, 0.3).into_handle();
        table
            .insert(PlacedEntry::new(Pose::at(0.0, 0.0, 0.15), sink.clone()))
            .unwrap();
        let sink_area = RegionCorners::from_bounding(
            &oracle.bounding_corners(sink.as_ref(), &Pose::at(0.0, 0.0, 0.15)),
        );

        let sampler = UniformRegionSampler::new(
            "around_sink",
            vec![cube("sponge", 0.1)],
            square_region(1.0),
            SamplerConfig::new()
                .with_overlap_check(false)
                .with_out_of_ref_region(true),
        )
        .unwrap();
        let args = SampleArgs::new().with_excluded(["sink"]);
        for _ in 0..30 {
            let delta = sampler.sample(&table, &args, &mut ctx).unwrap();
            let sponge = delta.get("sponge").unwrap();
            assert!(!oracle.keypoints_in_region(sponge.object.as_ref(), &sponge.pose, &sink_area, 1));
        }
    }

    #[test]
    fn test_large_object_may_not_cover_excluded_footprint() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(21);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let mut table = PlacementTable::new();
        table
            .insert(PlacedEntry::new(
                Pose::at(0.0, 0.0, 0.1),
                BoxObject::new("sink", 0.2, 0.2, 0.2).into_handle(),
            ))
            .unwrap();

        // Pinned so that the mat covers the sink while every mat keypoint
        // stays outside it.
        let pinned = UniformRegionSampler::new(
            "pinned",
            vec![BoxObject::new("mat", 1.0, 1.0, 0.02).into_handle()],
            Region::new((0.3, 0.3), (0.0, 0.0)),
            SamplerConfig::new()
                .with_boundary_check(false)
                .with_overlap_check(false)
                .with_rotation(RotationPolicy::Fixed(0.0))
                .with_out_of_ref_region(true)
                .with_num_attempts(20),
        )
        .unwrap();
        let args = SampleArgs::new().with_excluded(["sink"]);
        let err = pinned.sample(&table, &args, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::PlacementExhausted { ref object, .. } if object == "mat"));

        // With room to move, the mat ends up clear of the sink.
        let free = UniformRegionSampler::new(
            "free",
            vec![BoxObject::new("mat", 1.0, 1.0, 0.02).into_handle()],
            square_region(2.0),
            SamplerConfig::new()
                .with_overlap_check(false)
                .with_rotation(RotationPolicy::Fixed(0.0))
                .with_out_of_ref_region(true),
        )
        .unwrap();
        for _ in 0..20 {
            let delta = free.sample(&table, &args, &mut ctx).unwrap();
            let p = delta.get("mat").unwrap().pose.position;
            assert!(p.x.abs() >= 0.6 - 1e-9 || p.y.abs() >= 0.6 - 1e-9);
        }
    }

    #[test]
    fn test_hidden_entries_do_not_block() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(14);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let mut table = PlacementTable::new();
        table
            .insert(PlacedEntry::new(Pose::at(0.0, 0.0, 0.0), cube("ghost", 4.0)).with_hidden(true))
            .unwrap();

        let sampler = UniformRegionSampler::new(
            "s",
            vec![cube("cup", 0.1)],
            square_region(0.5),
            SamplerConfig::new().with_num_attempts(20),
        )
        .unwrap();
        assert!(sampler.sample(&table, &SampleArgs::new(), &mut ctx).is_ok());
    }

    #[test]
    fn test_point_reference() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(15);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let sampler = UniformRegionSampler::new(
            "pinned",
            vec![cube("cup", 0.1)],
            Region::default().with_reference_pos(nalgebra::Vector3::new(9.0, 9.0, 9.0)),
            SamplerConfig::new().with_boundary_check(false),
        )
        .unwrap();
        let args = SampleArgs::new()
            .with_reference(Reference::point(1.0, 2.0, 3.0))
            .with_on_top(false);
        let delta = sampler
            .sample(&PlacementTable::new(), &args, &mut ctx)
            .unwrap();
        let p = delta.get("cup").unwrap().pose.position;
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 2.0);
        assert_relative_eq!(p.z, 3.0);
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_unknown_reference_lists_valid_names() {
        let oracle = BoxOracle::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = SampleContext::new(&oracle, &mut rng);

        let mut table = PlacementTable::new();
        table
            .insert(PlacedEntry::new(Pose::identity(), cube("counter", 1.0)))
            .unwrap();

        let sampler: Sampler = UniformRegionSampler::new(
            "s",
            vec![cube("cup", 0.1)],
            square_region(0.5),
            SamplerConfig::default(),
        )
        .unwrap()
        .into();

        for args in [
            SampleArgs::new().with_reference(Reference::object("island")),
            SampleArgs::new().with_excluded(["island"]),
        ] {
            match sampler.sample(&table, &args, &mut ctx) {
                Err(Error::InvalidReference { name, valid }) => {
                    assert_eq!(name, "island");
                    assert_eq!(valid, vec!["counter".to_string()]);
                }
                other => panic!("unexpected: {:?}", other.map(|t| t.len())),
            }
        }
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!("middle".parse::<Side>(), Err(Error::ConfigError(_))));
        assert!(matches!(
            "w".parse::<u_placement_core::Axis>(),
            Err(Error::ConfigError(_))
        ));
        let three = QuadrantRegions::from_named([
            ("front_left", Region::default()),
            ("front_right", Region::default()),
            ("back_left", Region::default()),
        ]);
        assert!(matches!(three, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_exhaustion_is_retryable() {
        let oracle = BoxOracle::new();
        let sampler = UniformRegionSampler::new(
            "tight",
            vec![cube("crate", 1.0)],
            square_region(0.1),
            SamplerConfig::new().with_num_attempts(5),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = SampleContext::new(&oracle, &mut rng);
        let outcome = sampler
            .attempt(&PlacementTable::new(), &SampleArgs::new(), &mut ctx)
            .unwrap();
        assert!(matches!(outcome, SampleOutcome::Exhausted(_)));

        let err = outcome.into_result().unwrap_err();
        assert!(err.is_exhausted());
        assert!(!err.is_fatal());
    }
}
