use std::sync::Arc;

use aas_core::router::RoutingTables;
use aas_core::travel::TravelType;
use aas_core::world::{
    AasWorld, Area, AreaContents, AreaFlags, AreaNum, AreaSettings, PresenceType, Reachability,
};
use aas_service::config::Config;
use aas_service::routes::build_router;
use aas_service::state::{AppState, LoadedMap};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn two_area_world() -> AasWorld {
    let mut world = AasWorld::default();
    world.areas.push(Area { first_face: 0, num_faces: 0 });
    world.area_settings.push(AreaSettings {
        presence_type: PresenceType::NORMAL,
        area_flags: AreaFlags::empty(),
        contents: AreaContents::empty(),
        cluster: 0,
        cluster_area_num: 0,
        first_reachable_area: 0,
        num_reachable_areas: 0,
    });
    for _ in 0..2 {
        world.areas.push(Area { first_face: 0, num_faces: 0 });
        world.area_settings.push(AreaSettings {
            presence_type: PresenceType::NORMAL,
            area_flags: AreaFlags::empty(),
            contents: AreaContents::empty(),
            cluster: 1,
            cluster_area_num: 1,
            first_reachable_area: 0,
            num_reachable_areas: 0,
        });
    }
    world.area_settings[1].first_reachable_area = 0;
    world.area_settings[1].num_reachable_areas = 1;
    world.reachability.push(Reachability {
        area_num: AreaNum(2),
        face_num: 0,
        edge_num: 0,
        start: [0.0, 0.0, 0.0],
        end: [100.0, 0.0, 0.0],
        travel_type: TravelType::Walk,
        travel_time: 100,
    });
    world
}

fn app_with_loaded_map() -> axum::Router {
    let config = Config { addr: "127.0.0.1:0".parse().unwrap(), default_map: None, max_clients: 8 };
    let state = Arc::new(AppState::new(config));
    let world = two_area_world();
    let tables = RoutingTables::build(&world).unwrap();
    state.map.store(Arc::new(Some(LoadedMap {
        path: "memory".into(),
        world,
        tables,
    })));
    build_router(state)
}

#[tokio::test]
async fn healthz_always_ok() {
    let config = Config { addr: "127.0.0.1:0".parse().unwrap(), default_map: None, max_clients: 8 };
    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    let res = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn readyz_reflects_loaded_map() {
    let config = Config { addr: "127.0.0.1:0".parse().unwrap(), default_map: None, max_clients: 8 };
    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    let res = app
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn query_route_finds_path_between_areas() {
    let app = app_with_loaded_map();

    let body = serde_json::json!({
        "area_num": 1,
        "origin": [0.0, 0.0, 0.0],
        "goal_area_num": 2,
        "travel_flags": 0xFFFF_FFFFu32
    })
    .to_string();

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/query/route")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["status"], "reachability");
    assert_eq!(v["travel_type"], "Walk");
}

#[tokio::test]
async fn query_route_without_a_loaded_map_is_bad_request() {
    let config = Config { addr: "127.0.0.1:0".parse().unwrap(), default_map: None, max_clients: 8 };
    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    let body = serde_json::json!({
        "area_num": 1,
        "origin": [0.0, 0.0, 0.0],
        "goal_area_num": 2,
        "travel_flags": 0
    })
    .to_string();

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/query/route")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
