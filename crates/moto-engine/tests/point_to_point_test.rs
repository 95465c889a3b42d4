//! Point-to-point correction against scripted routing oracles.

mod common;

use common::*;
use moto_core::geo::destination;
use moto_core::{GeoPoint, RouteError, RouteStyle, StyleLadder, TripKind};

fn end() -> GeoPoint {
    destination(START, 60.0, 90.0)
}

#[tokio::test]
async fn accepts_first_answer_under_the_limit() {
    let router = ScriptedRouter::kms(&[118.0]);
    let engine = engine(&router);

    let candidate = engine
        .synthesize_point_to_point(START, end(), &[], StyleLadder::default())
        .await
        .unwrap();

    assert_eq!(router.calls(), 1);
    assert_eq!(candidate.kind, TripKind::PointToPoint);
    assert_eq!(candidate.radius_km, None);
    let coords = &candidate.path.coordinates;
    assert!(coords.last().unwrap().same_position(&end()));
    assert_eq!(coords.len(), 2);
}

#[tokio::test]
async fn drops_worst_waypoint_then_degrades_style() {
    let on_the_way = destination(START, 30.0, 95.0);
    let detour = destination(START, 30.0, 20.0);
    let router = ScriptedRouter::kms(&[150.0, 130.0, 125.0, 121.0, 119.0]);
    let engine = engine(&router);

    let candidate = engine
        .synthesize_point_to_point(
            START,
            end(),
            &[detour, on_the_way],
            StyleLadder::starting_at(RouteStyle::Curvy),
        )
        .await
        .unwrap();

    let requests = router.requests();
    assert_eq!(requests.len(), 5);
    assert_eq!(requests[0].locations.via(), &[detour, on_the_way]);
    assert_eq!(requests[1].locations.via(), &[on_the_way]);
    assert!(requests[2].locations.via().is_empty());

    let styles: Vec<RouteStyle> = requests.iter().map(|r| r.style).collect();
    assert_eq!(
        styles,
        vec![
            RouteStyle::Curvy,
            RouteStyle::Curvy,
            RouteStyle::Curvy,
            RouteStyle::CurvyLight,
            RouteStyle::Rapid,
        ]
    );
    assert_eq!(candidate.distance_km, 119.0);
    assert_eq!(candidate.style, RouteStyle::Rapid);
    assert_eq!(candidate.attempts, 5);
}

#[tokio::test]
async fn exhausts_when_nothing_left_to_drop_or_degrade() {
    let router = ScriptedRouter::kms(&[150.0]);
    let engine = engine(&router);

    let err = engine
        .synthesize_point_to_point(
            START,
            end(),
            &[destination(START, 20.0, 60.0)],
            StyleLadder::starting_at(RouteStyle::CurvyLight),
        )
        .await
        .unwrap_err();

    // One call with the waypoint, one without, one on rapid.
    assert_eq!(router.calls(), 3);
    match err {
        RouteError::CannotMeetConstraints { attempts, closest } => {
            assert_eq!(attempts, 3);
            assert_eq!(closest.unwrap().distance_km, 150.0);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn rapid_without_waypoints_gets_a_single_call() {
    let router = ScriptedRouter::new(vec![Reply::Transport]);
    let engine = engine(&router);

    let err = engine
        .synthesize_point_to_point(
            START,
            end(),
            &[],
            StyleLadder::starting_at(RouteStyle::Rapid),
        )
        .await
        .unwrap_err();

    assert_eq!(router.calls(), 1);
    assert!(matches!(err, RouteError::OracleUnavailable { attempts: 1 }), "{err:?}");
}

#[tokio::test]
async fn malformed_shape_stops_point_to_point() {
    let router = ScriptedRouter::new(vec![Reply::Malformed(100.0)]);
    let engine = engine(&router);

    let err = engine
        .synthesize_point_to_point(START, end(), &[], StyleLadder::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::MalformedShape(_)));
    assert_eq!(router.calls(), 1);
}

#[tokio::test]
async fn prechecks_reject_unreachable_requests() {
    let router = ScriptedRouter::kms(&[100.0]);
    let engine = engine(&router);

    let too_far = destination(START, 90.0, 90.0);
    let err = engine
        .synthesize_point_to_point(START, too_far, &[], StyleLadder::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::InputRejected(_)));

    // Straight-line legs through the waypoints already exceed the limit.
    let zigzag = [destination(START, 70.0, 0.0), destination(START, 70.0, 180.0)];
    let err = engine
        .synthesize_point_to_point(START, end(), &zigzag, StyleLadder::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::InputRejected(_)));

    let five = vec![destination(START, 10.0, 90.0); 5];
    let err = engine
        .synthesize_point_to_point(START, end(), &five, StyleLadder::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::InputRejected(_)));

    assert_eq!(router.calls(), 0);
}
