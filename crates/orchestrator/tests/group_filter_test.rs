//! Group filtering scenarios against in-memory collaborators

use section_match_common::{
    Coord, Correspondence, MatchPoints, PointColumns, RegionShape, SectionData, TileSpec,
    TransformSpec,
};
use section_match_filter::*;
use section_match_storage::{
    InMemoryMatchStore, InMemoryRegionStore, InMemoryTileService, MatchStore, StorageResult,
    TileService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const STACK: &str = "ALIGNED";
const SOURCE: &str = "raw_matches";
const TARGET: &str = "cropped_matches";

/// Tile service that counts layer fetches and coordinate resolutions
struct CountingTiles {
    inner: InMemoryTileService,
    fetches: AtomicUsize,
    resolutions: AtomicUsize,
}

impl TileService for CountingTiles {
    fn sections(&self, stack: &str) -> StorageResult<Vec<SectionData>> {
        self.inner.sections(stack)
    }

    fn tile_specs_for_z(&self, stack: &str, z: u32) -> StorageResult<Vec<TileSpec>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.tile_specs_for_z(stack, z)
    }

    fn local_to_world(
        &self,
        stack: &str,
        points: &[Coord<f64>],
        tile: &TileSpec,
    ) -> StorageResult<Vec<Coord<f64>>> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.inner.local_to_world(stack, points, tile)
    }
}

/// Match store that counts publish calls
struct CountingMatches {
    inner: InMemoryMatchStore,
    publishes: AtomicUsize,
}

impl MatchStore for CountingMatches {
    fn origin_group_ids(&self, collection: &str) -> StorageResult<Vec<String>> {
        self.inner.origin_group_ids(collection)
    }

    fn matches_from_group(
        &self,
        collection: &str,
        p_group_id: &str,
    ) -> StorageResult<Vec<Correspondence>> {
        self.inner.matches_from_group(collection, p_group_id)
    }

    fn import_matches(&self, collection: &str, matches: &[Correspondence]) -> StorageResult<usize> {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        self.inner.import_matches(collection, matches)
    }
}

struct Fixture {
    filter: MatchFilter,
    tiles: Arc<CountingTiles>,
    matches: Arc<CountingMatches>,
}

impl Fixture {
    fn published(&self) -> Vec<Correspondence> {
        self.matches.inner.collection(TARGET)
    }

    fn publish_calls(&self) -> usize {
        self.matches.publishes.load(Ordering::SeqCst)
    }

    fn resolutions(&self) -> usize {
        self.tiles.resolutions.load(Ordering::SeqCst)
    }
}

fn corr(p_group: &str, q_group: &str, p_id: &str, q_id: &str, p: &[(f64, f64)], q: &[(f64, f64)], w: &[f64]) -> Correspondence {
    let cols = |pts: &[(f64, f64)]| {
        PointColumns(
            pts.iter().map(|&(x, _)| x).collect(),
            pts.iter().map(|&(_, y)| y).collect(),
        )
    };
    Correspondence {
        p_group_id: p_group.to_string(),
        q_group_id: q_group.to_string(),
        p_id: p_id.to_string(),
        q_id: q_id.to_string(),
        matches: MatchPoints {
            p: cols(p),
            q: cols(q),
            w: w.to_vec(),
        },
    }
}

/// Section "1.0" (z=1) owns the unit square, section "2.0" (z=2) the same
/// square shifted by (10, 10). Section "3.0" (z=3) covers [0,100]^2 and its
/// tile "t3" sits at an offset of (50, 50).
fn fixture(matches: Vec<Correspondence>) -> Fixture {
    let tiles = Arc::new(CountingTiles {
        inner: InMemoryTileService::new()
            .with_section(STACK, SectionData::new("1.0", 1), vec![TileSpec::new("t1", 1, vec![])])
            .with_section(STACK, SectionData::new("2.0", 2), vec![TileSpec::new("t2", 2, vec![])])
            .with_section(
                STACK,
                SectionData::new("3.0", 3),
                vec![TileSpec::new(
                    "t3",
                    3,
                    vec![TransformSpec::Translation { dx: 50.0, dy: 50.0 }],
                )],
            ),
        fetches: AtomicUsize::new(0),
        resolutions: AtomicUsize::new(0),
    });
    let regions = InMemoryRegionStore::new()
        .with_region(STACK, 1, RegionShape::rectangle(0.0, 0.0, 1.0, 1.0))
        .with_region(STACK, 2, RegionShape::rectangle(10.0, 10.0, 11.0, 11.0))
        .with_region(STACK, 3, RegionShape::rectangle(0.0, 0.0, 100.0, 100.0));
    let store = Arc::new(CountingMatches {
        inner: InMemoryMatchStore::new().with_matches(SOURCE, matches),
        publishes: AtomicUsize::new(0),
    });

    let target = FilterTarget {
        stack: STACK.to_string(),
        source_collection: SOURCE.to_string(),
        target_collection: TARGET.to_string(),
    };
    let filter = MatchFilter::prepare(target, store.clone(), tiles.clone(), &regions).unwrap();
    Fixture {
        filter,
        tiles,
        matches: store,
    }
}

#[test]
fn test_point_inside_both_regions_survives_unchanged() {
    let original = corr("1.0", "2.0", "t1", "t2", &[(0.5, 0.5)], &[(10.5, 10.5)], &[1.0]);
    let fx = fixture(vec![original.clone()]);

    let report = fx.filter.filter_group("1.0").unwrap();
    assert_eq!(report.candidates, 1);
    assert_eq!(report.kept, 1);
    assert!(report.published);
    assert_eq!(fx.published(), vec![original]);
}

#[test]
fn test_origin_outside_drops_only_that_pair() {
    let fx = fixture(vec![corr(
        "1.0",
        "2.0",
        "t1",
        "t2",
        &[(0.5, 0.5), (5.0, 5.0)],
        &[(10.5, 10.5), (10.5, 10.5)],
        &[1.0, 2.0],
    )]);

    let report = fx.filter.filter_group("1.0").unwrap();
    assert_eq!(report.points_in, 2);
    assert_eq!(report.points_kept, 1);

    let published = fx.published();
    assert_eq!(published.len(), 1);
    let m = &published[0].matches;
    assert_eq!(m.p, PointColumns(vec![0.5], vec![0.5]));
    assert_eq!(m.q, PointColumns(vec![10.5], vec![10.5]));
    assert_eq!(m.w, vec![1.0]);
}

#[test]
fn test_destination_outside_drops_pair() {
    // origin inside, destination outside: conjunction, not union
    let fx = fixture(vec![corr(
        "1.0",
        "2.0",
        "t1",
        "t2",
        &[(0.5, 0.5), (0.25, 0.25)],
        &[(10.5, 10.5), (0.5, 0.5)],
        &[1.0, 2.0],
    )]);
    fx.filter.filter_group("1.0").unwrap();
    assert_eq!(fx.published()[0].matches.w, vec![1.0]);
}

#[test]
fn test_fully_outside_correspondence_is_not_republished() {
    let fx = fixture(vec![
        corr("1.0", "2.0", "t1", "t2", &[(5.0, 5.0), (6.0, 6.0)], &[(10.5, 10.5), (10.5, 10.5)], &[1.0, 2.0]),
        corr("1.0", "2.0", "t1", "t2", &[(0.5, 0.5)], &[(10.5, 10.5)], &[3.0]),
    ]);

    let report = fx.filter.filter_group("1.0").unwrap();
    assert_eq!(report.kept, 1);
    assert_eq!(report.dropped, 1);
    let published = fx.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].matches.w, vec![3.0]);
    assert_eq!(fx.publish_calls(), 1);
}

#[test]
fn test_group_with_no_survivors_issues_no_write() {
    let fx = fixture(vec![corr("1.0", "2.0", "t1", "t2", &[(5.0, 5.0)], &[(10.5, 10.5)], &[1.0])]);
    let report = fx.filter.filter_group("1.0").unwrap();
    assert_eq!(report.kept, 0);
    assert!(!report.published);
    assert_eq!(fx.publish_calls(), 0);
}

#[test]
fn test_empty_group_does_no_work() {
    let fx = fixture(vec![corr("1.0", "2.0", "t1", "t2", &[(0.5, 0.5)], &[(10.5, 10.5)], &[1.0])]);
    let report = fx.filter.filter_group("2.0").unwrap();
    assert_eq!(report.candidates, 0);
    assert_eq!(fx.resolutions(), 0);
    assert_eq!(fx.publish_calls(), 0);
    assert_eq!(fx.tiles.fetches.load(Ordering::SeqCst), 0);
}

#[test]
fn test_points_are_resolved_through_tile_transforms() {
    // local (10, 10) on t3 is world (60, 60): inside section 3's region.
    // local (60, 60) is world (110, 110): outside.
    let fx = fixture(vec![corr(
        "3.0",
        "1.0",
        "t3",
        "t1",
        &[(10.0, 10.0), (60.0, 60.0)],
        &[(0.5, 0.5), (0.5, 0.5)],
        &[1.0, 2.0],
    )]);
    fx.filter.filter_group("3.0").unwrap();
    let published = fx.published();
    // published points stay in tile-local coordinates
    assert_eq!(published[0].matches.p, PointColumns(vec![10.0], vec![10.0]));
    assert_eq!(fx.resolutions(), 2);
}

#[test]
fn test_boundary_point_is_excluded() {
    let fx = fixture(vec![corr(
        "1.0",
        "2.0",
        "t1",
        "t2",
        &[(1.0, 0.5), (0.5, 0.5)],
        &[(10.5, 10.5), (10.0, 10.0)],
        &[1.0, 2.0],
    )]);
    let report = fx.filter.filter_group("1.0").unwrap();
    assert_eq!(report.kept, 0);
}

#[test]
fn test_filtering_twice_gives_identical_batches() {
    let input = vec![
        corr("1.0", "2.0", "t1", "t2", &[(0.5, 0.5), (5.0, 5.0), (0.1, 0.9)], &[(10.5, 10.5), (10.5, 10.5), (10.2, 10.8)], &[1.0, 2.0, 3.0]),
        corr("1.0", "3.0", "t1", "t3", &[(0.5, 0.5)], &[(1.0, 1.0)], &[4.0]),
    ];
    let first = fixture(input.clone());
    let second = fixture(input);
    first.filter.filter_group("1.0").unwrap();
    second.filter.filter_group("1.0").unwrap();
    assert_eq!(first.published(), second.published());
    assert_eq!(first.published().len(), 2);
}

#[test]
fn test_survivors_keep_alignment_and_order() {
    let fx = fixture(vec![corr(
        "1.0",
        "2.0",
        "t1",
        "t2",
        &[(0.1, 0.1), (3.0, 3.0), (0.2, 0.2), (0.3, 0.3)],
        &[(10.1, 10.1), (10.2, 10.2), (20.0, 20.0), (10.3, 10.3)],
        &[1.0, 2.0, 3.0, 4.0],
    )]);
    fx.filter.filter_group("1.0").unwrap();
    let kept = &fx.published()[0];
    assert!(kept.validate().is_ok());
    assert_eq!(kept.matches.p.0, vec![0.1, 0.3]);
    assert_eq!(kept.matches.q.0, vec![10.1, 10.3]);
    assert_eq!(kept.matches.w, vec![1.0, 4.0]);
}

#[test]
fn test_unknown_tile_fails_group_without_publishing() {
    let fx = fixture(vec![
        corr("1.0", "2.0", "t1", "t2", &[(0.5, 0.5)], &[(10.5, 10.5)], &[1.0]),
        corr("1.0", "2.0", "t1", "ghost", &[(0.5, 0.5)], &[(10.5, 10.5)], &[1.0]),
    ]);
    let err = fx.filter.filter_group("1.0").unwrap_err();
    assert!(matches!(err, FilterError::TileLookup { ref tile_id, z: 2, .. } if tile_id == "ghost"));
    assert_eq!(fx.publish_calls(), 0);
    assert!(fx.published().is_empty());
}

#[test]
fn test_tile_from_wrong_layer_fails_group() {
    // t1 belongs to z=1 but is named as the destination tile of section 2.0
    let fx = fixture(vec![corr("1.0", "2.0", "t1", "t1", &[(0.5, 0.5)], &[(10.5, 10.5)], &[1.0])]);
    assert!(matches!(
        fx.filter.filter_group("1.0"),
        Err(FilterError::TileLookup { .. })
    ));
}

#[test]
fn test_destination_outside_stack_is_missing_resource() {
    let fx = fixture(vec![corr("1.0", "9.0", "t1", "t9", &[(0.5, 0.5)], &[(0.5, 0.5)], &[1.0])]);
    assert!(matches!(
        fx.filter.filter_group("1.0"),
        Err(FilterError::MissingResource { ref section_id, .. }) if section_id == "9.0"
    ));
}

#[test]
fn test_run_all_continues_past_failures() {
    let fx = fixture(vec![
        corr("1.0", "2.0", "t1", "t2", &[(0.5, 0.5)], &[(10.5, 10.5)], &[1.0]),
        corr("2.0", "1.0", "t2", "ghost", &[(10.5, 10.5)], &[(0.5, 0.5)], &[1.0]),
        corr("3.0", "1.0", "t3", "t1", &[(10.0, 10.0)], &[(0.5, 0.5)], &[1.0]),
    ]);
    let options = RunOptions {
        workers: 3,
        policy: FailurePolicy::ContinueOnError,
    };
    let summary = run_all(&fx.filter, &options).unwrap();

    let ids: Vec<&str> = summary.outcomes.iter().map(|o| o.group_id.as_str()).collect();
    assert_eq!(ids, vec!["1.0", "2.0", "3.0"]);
    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.failures().next().unwrap().0, "2.0");
    assert!(summary.skipped.is_empty());
    assert!(!summary.is_success());
    assert_eq!(summary.kept_total(), 2);
    assert_eq!(fx.published().len(), 2);
}

#[test]
fn test_fail_fast_stops_dispatching_groups() {
    let fx = fixture(vec![
        corr("1.0", "2.0", "t1", "ghost", &[(0.5, 0.5)], &[(10.5, 10.5)], &[1.0]),
        corr("2.0", "1.0", "t2", "t1", &[(10.5, 10.5)], &[(0.5, 0.5)], &[1.0]),
        corr("3.0", "1.0", "t3", "t1", &[(10.0, 10.0)], &[(0.5, 0.5)], &[1.0]),
    ]);
    let groups = vec!["1.0".to_string(), "2.0".to_string(), "3.0".to_string()];
    let summary = run_groups(&fx.filter, &groups, &RunOptions::default()).unwrap();

    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.outcomes.len() + summary.skipped.len(), 3);
    assert_eq!(summary.skipped, vec!["2.0".to_string(), "3.0".to_string()]);
    assert!(fx.published().is_empty());
}

#[test]
fn test_successful_run_is_success() {
    let fx = fixture(vec![
        corr("1.0", "2.0", "t1", "t2", &[(0.5, 0.5)], &[(10.5, 10.5)], &[1.0]),
        corr("2.0", "1.0", "t2", "t1", &[(10.5, 10.5)], &[(0.5, 0.5)], &[1.0]),
    ]);
    let options = RunOptions {
        workers: 2,
        policy: FailurePolicy::FailFast,
    };
    let summary = run_all(&fx.filter, &options).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.reports().filter(|r| r.published).count(), 2);
    assert!(fx.filter.tile_cache().len() >= 2);
}
