use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bk_studio::{
    Admission, AssetId, AssetMeta, Category, ProjectDeletion, ProjectName, ProjectRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AssetQuery {
    pub category: Option<Category>,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectBody {
    pub id: AssetId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub project: ProjectName,
    pub id: Option<AssetId>,
}

fn project(name: &str) -> ServerResult<ProjectName> {
    Ok(name.parse()?)
}

fn asset_id(raw: &str) -> ServerResult<AssetId> {
    Ok(raw.parse()?)
}

fn upload_filename(query: UploadQuery, fallback: &str) -> String {
    query
        .filename
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "brandkit",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_projects(
    State(state): State<AppState>,
) -> ServerResult<Json<Vec<ProjectRecord>>> {
    Ok(Json(state.studio.list_projects()?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProject>,
) -> ServerResult<(StatusCode, Json<ProjectRecord>)> {
    let name = project(&body.name)?;
    let record = state.studio.create_project(&name)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<Json<ProjectDeletion>> {
    let name = project(&name)?;
    let mut session = state.session.lock().await;
    Ok(Json(state.studio.delete_project(&mut session, &name)?))
}

pub async fn list_assets(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<AssetQuery>,
) -> ServerResult<Json<Vec<AssetMeta>>> {
    let name = project(&name)?;
    if !state.studio.project_exists(&name)? {
        return Err(bk_studio::StudioError::ProjectNotFound(name).into());
    }

    let categories = match query.category {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };
    let mut assets = Vec::new();
    for category in categories {
        assets.extend(state.studio.list_assets(&name, category)?);
    }
    Ok(Json(assets))
}

pub async fn upload_reference(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<Admission>)> {
    let name = project(&name)?;
    let filename = upload_filename(query, "reference.png");
    let mut session = state.session.lock().await;
    state.studio.switch_project(&mut session, &name)?;

    let admission = state
        .studio
        .upload_reference(&mut session, &filename, body.to_vec())?;
    let status = if admission.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(admission)))
}

pub async fn import_asset(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<Value>)> {
    let name = project(&name)?;
    let filename = upload_filename(query, "imported.png");
    let mut session = state.session.lock().await;
    state.studio.switch_project(&mut session, &name)?;

    let id = state
        .studio
        .import_for_edit(&mut session, &filename, body.to_vec())?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Response> {
    let id = asset_id(&id)?;
    let meta = state.studio.asset_meta(&id)?;
    let content = state.studio.asset_content(&id)?;

    let content_type = if meta.filename.to_ascii_lowercase().ends_with(".png") {
        "image/png"
    } else {
        "application/octet-stream"
    };
    let disposition = format!("inline; filename=\"{}\"", meta.filename.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let id = asset_id(&id)?;
    let mut session = state.session.lock().await;
    let deleted = state.studio.delete_asset(&mut session, &id)?;
    Ok(Json(json!({ "id": id, "deleted": deleted })))
}

pub async fn put_selection(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<SelectBody>,
) -> ServerResult<Json<SelectionResponse>> {
    let name = project(&name)?;
    let mut session = state.session.lock().await;
    state.studio.switch_project(&mut session, &name)?;
    state.studio.select(&mut session, body.id)?;
    Ok(Json(SelectionResponse {
        project: name,
        id: Some(body.id),
    }))
}

pub async fn get_selection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<Json<SelectionResponse>> {
    let name = project(&name)?;
    let mut session = state.session.lock().await;
    state.studio.switch_project(&mut session, &name)?;
    let id = state.studio.current(&mut session)?;
    Ok(Json(SelectionResponse { project: name, id }))
}

