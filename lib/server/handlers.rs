//! Request handlers of the management API.
//!
//! Each handler delegates to a `handle_*` function returning a
//! [`MonoboxResult`], then maps the outcome onto an HTTP response.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    container::{Container, ContainerId},
    orchestration::{ContainerOptions, Orchestrator},
    MonoboxError, MonoboxResult,
};

use super::{
    state::ServerState,
    types::{
        ContainerInfo, ContainerStatusResponse, CreateContainerRequest, CreateContainerResponse,
        EmptyResponse, ErrorResponse, ListContainersResponse, StopContainerRequest,
    },
};

//--------------------------------------------------------------------------------------------------
// Functions: Handlers
//--------------------------------------------------------------------------------------------------

/// Handler for the `POST /containers` endpoint.
pub async fn create_handler(
    State(state): State<ServerState>,
    Json(req): Json<CreateContainerRequest>,
) -> impl IntoResponse {
    match handle_create(state, req).await {
        Ok(container) => (
            StatusCode::OK,
            Json(CreateContainerResponse {
                container_id: container.get_id().to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

/// Handler for the `POST /containers/{id}/start` endpoint.
pub async fn start_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match handle_start(state, id).await {
        Ok(()) => (StatusCode::OK, Json(EmptyResponse {})).into_response(),
        Err(err) => error_response(err),
    }
}

/// Handler for the `POST /containers/{id}/stop` endpoint.
pub async fn stop_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<StopContainerRequest>,
) -> impl IntoResponse {
    match handle_stop(state, id, req).await {
        Ok(()) => (StatusCode::OK, Json(EmptyResponse {})).into_response(),
        Err(err) => error_response(err),
    }
}

/// Handler for the `DELETE /containers/{id}` endpoint.
pub async fn remove_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match handle_remove(state, id).await {
        Ok(()) => (StatusCode::OK, Json(EmptyResponse {})).into_response(),
        Err(err) => error_response(err),
    }
}

/// Handler for the `GET /containers` endpoint.
pub async fn list_handler(State(state): State<ServerState>) -> impl IntoResponse {
    match handle_list(state).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Handler for the `GET /containers/{id}` endpoint.
pub async fn status_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match handle_status(state, id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => error_response(err),
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Implementations
//--------------------------------------------------------------------------------------------------

/// Implementation of the create operation.
async fn handle_create(
    state: ServerState,
    req: CreateContainerRequest,
) -> MonoboxResult<Container> {
    let options = ContainerOptions::builder()
        .name(req.name)
        .command(req.command)
        .args(req.args)
        .rootfs_path(req.rootfs_path)
        .rootfs_readonly(req.rootfs_readonly)
        .stdin(req.stdin)
        .stdin_once(req.stdin_once)
        .build();

    let mut orchestrator = state.orchestrator().lock().await;
    orchestrator.create_container(options).await
}

/// Implementation of the start operation.
async fn handle_start(state: ServerState, id: String) -> MonoboxResult<()> {
    let id: ContainerId = id.parse()?;
    let mut orchestrator = state.orchestrator().lock().await;
    orchestrator.start_container(&id).await
}

/// Implementation of the stop operation.
async fn handle_stop(
    state: ServerState,
    id: String,
    req: StopContainerRequest,
) -> MonoboxResult<()> {
    let id: ContainerId = id.parse()?;
    let mut orchestrator = state.orchestrator().lock().await;
    orchestrator
        .stop_container(&id, Duration::from_millis(req.timeout_ms))
        .await
}

/// Implementation of the remove operation.
async fn handle_remove(state: ServerState, id: String) -> MonoboxResult<()> {
    let id: ContainerId = id.parse()?;
    let mut orchestrator = state.orchestrator().lock().await;
    orchestrator.remove_container(&id).await
}

/// Implementation of the list operation.
async fn handle_list(state: ServerState) -> MonoboxResult<ListContainersResponse> {
    let mut orchestrator = state.orchestrator().lock().await;
    let containers = orchestrator.list_containers().await?;
    Ok(ListContainersResponse {
        containers: containers
            .iter()
            .map(|container| container_info(&orchestrator, container))
            .collect(),
    })
}

/// Implementation of the status operation.
async fn handle_status(state: ServerState, id: String) -> MonoboxResult<ContainerStatusResponse> {
    let id: ContainerId = id.parse()?;
    let mut orchestrator = state.orchestrator().lock().await;
    let container = orchestrator.get_container(&id).await?;
    Ok(ContainerStatusResponse {
        container: container_info(&orchestrator, &container),
    })
}

/// Maps a container onto its API projection.
fn container_info(orchestrator: &Orchestrator, container: &Container) -> ContainerInfo {
    ContainerInfo {
        id: container.get_id().to_string(),
        name: container.get_name().clone(),
        status: container.get_status().to_string(),
        exit_code: *container.get_exit_code(),
        created_at: *container.get_created_at(),
        started_at: *container.get_started_at(),
        finished_at: *container.get_finished_at(),
        command: container.get_command().clone(),
        args: container.get_args().clone(),
        rootfs_path: container.get_rootfs_path().display().to_string(),
        log_path: container.get_log_path().display().to_string(),
        attach_path: orchestrator
            .container_attach_file(container.get_id())
            .display()
            .to_string(),
    }
}

/// Maps an error onto its HTTP status and JSON body.
fn error_response(err: MonoboxError) -> Response {
    let status = match &err {
        MonoboxError::ContainerNotFound(_) => StatusCode::NOT_FOUND,
        MonoboxError::InvalidContainerId(_) | MonoboxError::InvalidContainerName(_) => {
            StatusCode::BAD_REQUEST
        }
        MonoboxError::DuplicateContainerId(_)
        | MonoboxError::DuplicateContainerName(_)
        | MonoboxError::ContainerAlreadyExists(_)
        | MonoboxError::InvalidContainerStatus { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status_mapping() {
        let cases = [
            (
                MonoboxError::ContainerNotFound("x".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                MonoboxError::InvalidContainerId("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                MonoboxError::InvalidContainerName("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                MonoboxError::DuplicateContainerName("x".into()),
                StatusCode::CONFLICT,
            ),
            (
                MonoboxError::InvalidContainerStatus {
                    actual: "stopped".into(),
                    expected: "created".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                MonoboxError::ContainerStartFailed("stopped".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(error_response(err).status(), expected);
        }
    }
}
