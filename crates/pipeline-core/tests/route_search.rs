mod common;

use common::{CheapCostModel, FailingTerrain, FlakyTerrain, GOAL, START};
use pipeline_core::long_range::smooth_route;
use pipeline_core::spatial::path_length_km;
use pipeline_core::{
    find_routes, haversine_km, CriteriaWeights, Criterion, PathResult, PipeSpec, Position, RoutePlanner,
    SearchConfig, SearchError, SearchStrategy,
};

fn assert_exact_endpoints(route: &PathResult) {
    assert_eq!(route.start(), Some(START));
    assert_eq!(route.goal(), Some(GOAL));
}

#[test]
fn flat_terrain_yields_straight_route() {
    let terrain = common::flat();
    let route = common::engine(&terrain)
        .search(START, GOAL, &CriteriaWeights::default())
        .expect("route on flat terrain");

    let direct = haversine_km(START, GOAL);
    assert_eq!(route.strategy, SearchStrategy::Grid);
    assert_eq!(route.coordinates, vec![START, GOAL]);
    assert!((route.metrics.total_distance - direct).abs() <= direct * 0.01);
    assert!((route.metrics.total_distance - path_length_km(&route.coordinates)).abs() < 1e-9);
    assert_eq!(route.metrics.terrain_difficulty_score, 0.0);
    assert_exact_endpoints(&route);
}

#[test]
fn route_never_enters_forbidden_square() {
    let terrain = common::forbidden_midpoint();
    let route = common::engine(&terrain)
        .search(START, GOAL, &CriteriaWeights::default())
        .expect("route around the obstacle");

    assert_exact_endpoints(&route);
    assert!(route.coordinates.len() > 2, "straight line would cross the square");
    for point in &route.coordinates {
        assert!(
            !terrain.forbidden.iter().any(|square| square.contains(*point)),
            "{point} lies in forbidden terrain"
        );
    }
    assert!(route.metrics.total_distance > haversine_km(START, GOAL));
}

#[test]
fn terrain_weight_steers_away_from_difficult_ground() {
    let terrain = common::difficult_disc();
    let engine = common::engine(&terrain);

    let baseline = engine
        .search(START, GOAL, &CriteriaWeights::only(Criterion::Distance))
        .expect("distance-only route");
    let boosted = engine
        .search(
            START,
            GOAL,
            &CriteriaWeights::only(Criterion::Distance).with(Criterion::TerrainDifficulty, 1.0),
        )
        .expect("terrain-aware route");

    assert!(baseline.metrics.terrain_difficulty_score > 0.0);
    assert!(boosted.metrics.terrain_difficulty_score <= baseline.metrics.terrain_difficulty_score);
    assert!(boosted.metrics.total_distance >= baseline.metrics.total_distance);
}

#[test]
fn first_alternative_differs_from_primary() {
    let terrain = common::difficult_disc();
    let routes = RoutePlanner::new(&terrain, PipeSpec::default())
        .with_cost_model(&CheapCostModel)
        .find_routes(START, GOAL, &CriteriaWeights::only(Criterion::Distance), 1)
        .expect("routes");

    assert_eq!(routes.len(), 2);
    assert_eq!(routes[1].metrics.alternative_num, Some(1));
    assert_ne!(routes[0].coordinates, routes[1].coordinates);
    for route in &routes {
        assert_exact_endpoints(route);
    }
}

#[test]
fn smoothing_is_idempotent() {
    let terrain = common::difficult_disc();
    let zigzag: Vec<_> = (0..=20)
        .map(|i| {
            let t = f64::from(i) / 20.0;
            let wobble = if i % 2 == 0 { 0.0 } else { 0.0004 };
            Position::new(
                START.lat + (GOAL.lat - START.lat) * t + wobble,
                START.lon + (GOAL.lon - START.lon) * t,
            )
        })
        .collect();
    let config = SearchConfig::default();

    let once = smooth_route(&terrain, &zigzag, &config);
    let twice = smooth_route(&terrain, &once, &config);
    assert_eq!(once, twice);
    assert_eq!(once.first(), zigzag.first());
    assert_eq!(once.last(), zigzag.last());
}

#[test]
fn single_criterion_weights_rank_by_that_criterion() {
    let terrain = common::flat();
    let route = common::engine(&terrain)
        .search(START, GOAL, &CriteriaWeights::only(Criterion::EnvironmentalImpact))
        .expect("environment-only route");
    assert_eq!(route.metrics.environmental_impact_score, 0.0);
    assert_exact_endpoints(&route);
}

#[test]
fn early_escalation_still_reaches_goal() {
    let terrain = common::forbidden_midpoint();
    let config = SearchConfig {
        grid_escalation_after: 10,
        ..SearchConfig::default()
    };
    let route = common::engine_with(&terrain, config)
        .search(START, GOAL, &CriteriaWeights::default())
        .expect("route with coarse lattice");
    assert_exact_endpoints(&route);
}

#[test]
fn degraded_lookups_still_produce_route() {
    let route = common::engine(&FlakyTerrain)
        .search(START, GOAL, &CriteriaWeights::default())
        .expect("lookup failures degrade instead of aborting");
    assert_exact_endpoints(&route);
    assert!(route.metrics.total_distance >= haversine_km(START, GOAL) - 1e-9);
}

#[test]
fn unreachable_service_is_reported() {
    let err = common::engine(&FailingTerrain)
        .search(START, GOAL, &CriteriaWeights::default())
        .expect_err("no terrain, no route");
    assert!(matches!(err, SearchError::TerrainServiceUnavailable(_)), "got {err:?}");
}

#[test]
fn repeated_search_hits_the_cache() {
    let terrain = common::difficult_disc();
    let engine = common::engine(&terrain);
    let weights = CriteriaWeights::default();

    let first = engine.search(START, GOAL, &weights).expect("first search");
    let calls = terrain.difficulty_calls();
    assert!(calls > 0);
    assert!(!engine.cache().is_empty());

    let second = engine.search(START, GOAL, &weights).expect("second search");
    assert_eq!(terrain.difficulty_calls(), calls);
    assert_eq!(first, second);
}

fn primary_route(terrain: &common::GridTerrain, weights: &CriteriaWeights) -> PathResult {
    let mut routes = find_routes(START, GOAL, terrain, &PipeSpec::default(), weights, 0).expect("primary route");
    assert_eq!(routes.len(), 1);
    routes.remove(0)
}

#[test]
fn default_pipeline_on_flat_terrain_is_a_single_segment() {
    let route = primary_route(&common::flat(), &CriteriaWeights::default());

    let direct = haversine_km(START, GOAL);
    assert_eq!(route.strategy, SearchStrategy::Grid);
    assert_eq!(route.coordinates, vec![START, GOAL]);
    assert!(
        (route.metrics.total_distance - direct).abs() <= direct * 0.01,
        "{} km against {} km",
        route.metrics.total_distance,
        direct
    );
    assert_eq!(route.metrics.terrain_difficulty_score, 0.0);
}

#[test]
fn default_pipeline_routes_around_forbidden_square() {
    let terrain = common::forbidden_midpoint();
    let route = primary_route(&terrain, &CriteriaWeights::default());

    assert_exact_endpoints(&route);
    assert!(route.coordinates.len() > 2);
    for point in &route.coordinates {
        assert!(
            !terrain.forbidden.iter().any(|square| square.contains(*point)),
            "{point} lies in forbidden terrain"
        );
    }
    assert!(route.metrics.total_distance > haversine_km(START, GOAL));
}

#[test]
fn default_pipeline_alternative_leaves_the_straight_line() {
    let terrain = common::difficult_disc();
    let routes = find_routes(
        START,
        GOAL,
        &terrain,
        &PipeSpec::default(),
        &CriteriaWeights::only(Criterion::Distance),
        1,
    )
    .expect("routes");

    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].coordinates, vec![START, GOAL]);
    assert_ne!(routes[0].coordinates, routes[1].coordinates);
    assert!(
        routes[1].metrics.terrain_difficulty_score <= routes[0].metrics.terrain_difficulty_score,
        "alternative {} against primary {}",
        routes[1].metrics.terrain_difficulty_score,
        routes[0].metrics.terrain_difficulty_score
    );
    for route in &routes {
        assert_exact_endpoints(route);
    }
}

#[test]
fn heavier_terrain_weight_never_raises_difficulty_score() {
    const TERRAIN_WEIGHTS: [f64; 5] = [0.0, 0.25, 0.5, 1.0, 2.0];
    const FRACTIONS: [f64; 3] = [0.35, 0.5, 0.65];
    const TOLERANCE: f64 = 0.02;

    let mut means = [0.0; TERRAIN_WEIGHTS.len()];
    for fraction in FRACTIONS {
        let terrain = common::difficult_disc_at(fraction);
        let scores: Vec<f64> = TERRAIN_WEIGHTS
            .iter()
            .map(|&weight| {
                let weights = CriteriaWeights::only(Criterion::Distance).with(Criterion::TerrainDifficulty, weight);
                primary_route(&terrain, &weights).metrics.terrain_difficulty_score
            })
            .collect();

        assert!(scores[0] > 0.0, "disc at {fraction} must lie on the baseline route");
        for (pair, weights) in scores.windows(2).zip(TERRAIN_WEIGHTS.windows(2)) {
            assert!(
                pair[1] <= pair[0] + TOLERANCE,
                "disc at {fraction}: terrain weight {} scored {}, weight {} scored {}",
                weights[0],
                pair[0],
                weights[1],
                pair[1]
            );
        }
        for (mean, score) in means.iter_mut().zip(&scores) {
            *mean += score / FRACTIONS.len() as f64;
        }
    }

    for pair in means.windows(2) {
        assert!(pair[1] <= pair[0] + TOLERANCE / 2.0, "mean scores {means:?}");
    }
    assert!(means[TERRAIN_WEIGHTS.len() - 1] < means[0], "mean scores {means:?}");
}

#[test]
fn flat_hauls_beyond_the_segment_cap_are_routed() {
    let terrain = common::flat();
    let start = Position::new(52.0, 104.0);
    for delta_lon in [4.0, 8.0] {
        let goal = Position::new(52.0, 104.0 + delta_lon);
        let routes = find_routes(start, goal, &terrain, &PipeSpec::default(), &CriteriaWeights::default(), 0)
            .unwrap_or_else(|err| panic!("{delta_lon} degrees east: {err}"));
        let route = &routes[0];

        assert_eq!(route.strategy, SearchStrategy::LongRange);
        assert_eq!(route.start(), Some(start));
        assert_eq!(route.goal(), Some(goal));
        assert!(route.metrics.total_distance >= haversine_km(start, goal) - 1e-6);
        assert!(route.nodes_expanded > 0);
    }
}
