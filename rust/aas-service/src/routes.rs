use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info, info_span};

use aas_core::loader;
use aas_core::mover::{MoveHandle, MoveInputs};
use aas_core::router::{RouteResult, Router as RouteEngine, RoutingTables};
use aas_core::sampler::Sampler;
use aas_core::travel::TravelFlags;
use aas_core::world::{AreaNum, PresenceType};

use crate::errors::AppError;
use crate::models::{
    LoadMapRequest, LoadMapResponse, MoveRequest, MoveResponse, PointAreaQuery, PointAreaResponse,
    RouteQuery, RouteResponse, TraceQuery, TraceResponse,
};
use crate::state::{AppState, LoadedMap};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/version", get(version))
        .route("/maps/load", post(load_map))
        .route("/query/point", post(query_point))
        .route("/query/trace", post(query_trace))
        .route("/query/route", post(query_route))
        .route("/move", post(move_to_goal))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, Json(json!({"ready": true}))).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"ready": false}))).into_response()
    }
}

async fn version() -> impl IntoResponse {
    let svc_version = env!("CARGO_PKG_VERSION");
    let core_version = aas_core::version();
    (StatusCode::OK, Json(json!({"service_version": svc_version, "core_version": core_version})))
}

async fn load_map(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoadMapRequest>,
) -> Result<impl IntoResponse, AppError> {
    let path = req
        .path
        .map(std::path::PathBuf::from)
        .or_else(|| state.config.default_map.clone())
        .ok_or_else(|| AppError::BadRequest("no map path given and no default configured".into()))?;

    let span = info_span!("load_map", path = %path.display());
    let _enter = span.enter();

    let world = loader::load_from_path(&path, req.checksum)
        .map_err(|e| AppError::BadRequest(format!("failed to load {}: {e}", path.display())))?;
    let tables = RoutingTables::build(&world)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build routing tables: {e}")))?;

    let response = LoadMapResponse {
        path: path.display().to_string(),
        areas: world.area_settings.len(),
        clusters: world.clusters.len(),
        portals: world.portals.len(),
        reachabilities: world.reachability.len(),
    };

    info!(areas = response.areas, clusters = response.clusters, "map loaded");
    state.map.store(std::sync::Arc::new(Some(LoadedMap { path, world, tables })));

    Ok((StatusCode::OK, Json(response)))
}

fn loaded_map(state: &AppState) -> Result<arc_swap::Guard<std::sync::Arc<Option<LoadedMap>>>, AppError> {
    let guard = state.map.load();
    if guard.is_none() {
        return Err(AppError::BadRequest("no map loaded".into()));
    }
    Ok(guard)
}

async fn query_point(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PointAreaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let guard = loaded_map(&state)?;
    let world = &guard.as_ref().as_ref().unwrap().world;
    let sampler = Sampler::new(world);
    let area_num = sampler.point_area_num(req.origin);
    let reach_area_num = sampler.point_reachability_area_num(req.origin);
    Ok((
        StatusCode::OK,
        Json(PointAreaResponse {
            area_num: area_num.0,
            reachability_area_num: reach_area_num.0,
        }),
    ))
}

async fn query_trace(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TraceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let guard = loaded_map(&state)?;
    let world = &guard.as_ref().as_ref().unwrap().world;
    let sampler = Sampler::new(world);
    let presence = if req.crouch { PresenceType::CROUCH } else { PresenceType::NORMAL };
    let trace = sampler
        .trace_client_bbox(req.start, req.end, presence, None)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok((
        StatusCode::OK,
        Json(TraceResponse {
            startsolid: trace.startsolid,
            fraction: trace.fraction,
            endpos: trace.endpos,
            area: trace.area,
            plane_num: trace.plane_num,
        }),
    ))
}

async fn query_route(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RouteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let guard = loaded_map(&state)?;
    let loaded = guard.as_ref().as_ref().unwrap();
    let router = RouteEngine::new(&loaded.world, &loaded.tables);
    let result = router.route(
        AreaNum(req.area_num),
        req.origin,
        AreaNum(req.goal_area_num),
        TravelFlags(req.travel_flags),
    );
    let body = match result {
        RouteResult::AtGoal => RouteResponse::AtGoal,
        RouteResult::Unreachable => RouteResponse::Unreachable,
        RouteResult::Reachability { reach, time } => RouteResponse::Reachability {
            reach_num: reach.0 as u32,
            travel_type: format!("{:?}", loaded.world.reachability[reach.as_usize()].travel_type),
            time,
        },
    };
    Ok((StatusCode::OK, Json(body)))
}

/// `BotMoveToGoal` over HTTP: one think for one client, driven by
/// whatever movement state the service has cached for it.
async fn move_to_goal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MoveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let guard = loaded_map(&state)?;
    let loaded = guard.as_ref().as_ref().unwrap();

    if !state.ensure_client(req.client_num, req.entity_num) {
        return Err(AppError::BadRequest(format!(
            "client_num {} out of range (max {})",
            req.client_num, state.config.max_clients
        )));
    }

    let inputs = MoveInputs {
        world: &loaded.world,
        tables: &loaded.tables,
        collision: &state.host,
        physics: &state.host,
        goal_area: AreaNum(req.goal_area_num),
        goal_origin: req.goal_origin,
        travel_flags: TravelFlags(req.travel_flags),
    };

    let mut moves = state.moves.lock().unwrap();
    let mut ea = state.ea.lock().unwrap();

    let handle = MoveHandle(req.client_num);
    let move_state = moves.get_mut(handle);
    move_state.origin = req.origin;

    let result = aas_core::mover::move_to_goal(&inputs, &mut ea, move_state)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let yaw = move_state.view_angles[1].to_radians();
    let forward = [yaw.cos(), yaw.sin(), 0.0];
    let right = [yaw.sin(), -yaw.cos(), 0.0];
    let resolved = ea.get_input(req.client_num, forward, right);
    if let Some(view) = result.ideal_viewangles {
        move_state.view_angles = view;
    }

    let response = MoveResponse {
        failure: result.failure,
        blocked: result.blocked,
        travel_type: result.travel_type.map(|t| format!("{t:?}")),
        forwardmove: resolved.forwardmove,
        rightmove: resolved.rightmove,
        upmove: resolved.upmove,
        viewangles: move_state.view_angles,
        actionflags: resolved.actionflags.0,
    };
    Ok((StatusCode::OK, Json(response)))
}
