//! Employee routes: a thin mapping from HTTP onto the persistence gateway.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_extra::extract::WithRejection;
use entity::{EmployeeCard, EmployeeCardPatch, employees};
use platform_api::{ApiError, ApiResult};
use serde::Serialize;
use tracing::info;

use crate::http::AppState;

type JsonBody<T> = WithRejection<Json<T>, ApiError>;
type PathParam<T> = WithRejection<Path<T>, ApiError>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/new_employee", post(create_employee))
        .route("/employees", get(list_employees))
        .route(
            "/employees/{personnel_number}",
            get(get_by_personnel_number).patch(update_employee),
        )
        .route(
            "/employees/{surname}/{name}/{patronymic}",
            get(get_by_full_name),
        )
        .route("/employee/{personnel_number}", delete(delete_employee))
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    success: bool,
    created_id: i32,
    personnel_number: i32,
}

#[derive(Debug, Serialize)]
struct EmployeeListResponse {
    success: bool,
    employees: Vec<employees::Model>,
}

#[derive(Debug, Serialize)]
struct PersonnelNumberResponse {
    success: bool,
    personnel_number: i32,
    employee: employees::Model,
}

#[derive(Debug, Serialize)]
struct FullNameResponse {
    success: bool,
    employee: employees::Model,
}

#[derive(Debug, Serialize)]
struct UpdatedResponse {
    success: bool,
    personnel_number: i32,
    updated_fields: EmployeeCardPatch,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    success: bool,
    personnel_number: i32,
    deleted_employee: employees::Model,
}

async fn create_employee(
    State(state): State<AppState>,
    WithRejection(Json(card), _): JsonBody<EmployeeCard>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let created = platform_db::insert_employee(&state.pool, card).await?;
    info!(
        id = created.id,
        personnel_number = created.personnel_number,
        "employee created"
    );
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            created_id: created.id,
            personnel_number: created.personnel_number,
        }),
    ))
}

async fn list_employees(State(state): State<AppState>) -> ApiResult<Json<EmployeeListResponse>> {
    let employees = platform_db::list_employees(&state.pool).await?;
    Ok(Json(EmployeeListResponse {
        success: true,
        employees,
    }))
}

async fn get_by_personnel_number(
    State(state): State<AppState>,
    WithRejection(Path(personnel_number), _): PathParam<i32>,
) -> ApiResult<Json<PersonnelNumberResponse>> {
    let employee = platform_db::find_by_personnel_number(&state.pool, personnel_number).await?;
    Ok(Json(PersonnelNumberResponse {
        success: true,
        personnel_number,
        employee,
    }))
}

async fn get_by_full_name(
    State(state): State<AppState>,
    WithRejection(Path((surname, name, patronymic)), _): PathParam<(String, String, String)>,
) -> ApiResult<Json<FullNameResponse>> {
    let employee = platform_db::find_by_full_name(&state.pool, &surname, &name, &patronymic).await?;
    Ok(Json(FullNameResponse {
        success: true,
        employee,
    }))
}

async fn update_employee(
    State(state): State<AppState>,
    WithRejection(Path(personnel_number), _): PathParam<i32>,
    WithRejection(Json(patch), _): JsonBody<EmployeeCardPatch>,
) -> ApiResult<Json<UpdatedResponse>> {
    let updated = platform_db::update_employee(&state.pool, personnel_number, patch).await?;
    info!(personnel_number, "employee updated");
    Ok(Json(UpdatedResponse {
        success: true,
        personnel_number,
        updated_fields: updated.updated_fields,
    }))
}

async fn delete_employee(
    State(state): State<AppState>,
    WithRejection(Path(personnel_number), _): PathParam<i32>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted_employee = platform_db::delete_employee(&state.pool, personnel_number).await?;
    info!(personnel_number, "employee deleted");
    Ok(Json(DeletedResponse {
        success: true,
        personnel_number,
        deleted_employee,
    }))
}
