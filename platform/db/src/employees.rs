//! Employee persistence gateway. Every function takes the pool explicitly and
//! runs as a single statement or a single transaction.

use entity::{EmployeeCard, EmployeeCardPatch, employees};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, TransactionTrait,
};
use tracing::{instrument, warn};

use crate::{DbError, DbPool, DbResult, EmployeeKey};

/// Result of a partial update.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdatedEmployee {
    pub employee: employees::Model,
    /// Fields that were written; absent ones were left untouched.
    pub updated_fields: EmployeeCardPatch,
}

#[instrument(
    name = "db.employees.insert",
    skip_all,
    fields(personnel_number = card.personnel_number)
)]
pub async fn insert_employee(pool: &DbPool, card: EmployeeCard) -> DbResult<employees::Model> {
    card.validate()?;
    let personnel_number = card.personnel_number;
    card.into_active_model()
        .insert(pool)
        .await
        .map_err(|err| write_error(err, personnel_number))
}

#[instrument(name = "db.employees.list", skip_all)]
pub async fn list_employees(pool: &DbPool) -> DbResult<Vec<employees::Model>> {
    let rows = employees::Entity::find()
        .order_by_asc(employees::Column::Id)
        .all(pool)
        .await?;
    Ok(rows)
}

#[instrument(name = "db.employees.by_personnel_number", skip(pool))]
pub async fn find_by_personnel_number(
    pool: &DbPool,
    personnel_number: i32,
) -> DbResult<employees::Model> {
    load_by_personnel_number(pool, personnel_number).await
}

/// Exact match on all three name parts. When several employees share the
/// name, the one with the lowest id wins.
#[instrument(name = "db.employees.by_full_name", skip(pool))]
pub async fn find_by_full_name(
    pool: &DbPool,
    surname: &str,
    name: &str,
    patronymic: &str,
) -> DbResult<employees::Model> {
    let matches = employees::Entity::find()
        .filter(employees::Column::Surname.eq(surname))
        .filter(employees::Column::Name.eq(name))
        .filter(employees::Column::Patronymic.eq(patronymic))
        .order_by_asc(employees::Column::Id)
        .limit(2)
        .all(pool)
        .await?;
    if matches.len() > 1 {
        warn!("several employees share this full name; returning the earliest record");
    }
    matches.into_iter().next().ok_or_else(|| {
        DbError::NotFound(EmployeeKey::FullName {
            surname: surname.to_string(),
            name: name.to_string(),
            patronymic: patronymic.to_string(),
        })
    })
}

#[instrument(name = "db.employees.update", skip(pool, patch))]
pub async fn update_employee(
    pool: &DbPool,
    personnel_number: i32,
    patch: EmployeeCardPatch,
) -> DbResult<UpdatedEmployee> {
    patch.validate()?;
    let txn = pool.begin().await?;
    let existing = load_by_personnel_number(&txn, personnel_number).await?;
    if patch.is_empty() {
        txn.commit().await?;
        return Ok(UpdatedEmployee {
            employee: existing,
            updated_fields: patch,
        });
    }

    let mut active: employees::ActiveModel = existing.into();
    patch.apply(&mut active);
    let target_number = patch.personnel_number.unwrap_or(personnel_number);
    let employee = active.update(&txn).await.map_err(|err| match err {
        DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => {
            DbError::NotFound(EmployeeKey::PersonnelNumber(personnel_number))
        }
        err => write_error(err, target_number),
    })?;
    txn.commit().await?;
    Ok(UpdatedEmployee {
        employee,
        updated_fields: patch,
    })
}

/// Remove the employee and hand back the row as it was before deletion.
#[instrument(name = "db.employees.delete", skip(pool))]
pub async fn delete_employee(pool: &DbPool, personnel_number: i32) -> DbResult<employees::Model> {
    let txn = pool.begin().await?;
    let existing = load_by_personnel_number(&txn, personnel_number).await?;
    let result = employees::Entity::delete_by_id(existing.id)
        .exec(&txn)
        .await?;
    // A concurrent delete may have won between the read and the write.
    if result.rows_affected == 0 {
        return Err(DbError::NotFound(EmployeeKey::PersonnelNumber(
            personnel_number,
        )));
    }
    txn.commit().await?;
    Ok(existing)
}

async fn load_by_personnel_number<C: ConnectionTrait>(
    conn: &C,
    personnel_number: i32,
) -> DbResult<employees::Model> {
    employees::Entity::find()
        .filter(employees::Column::PersonnelNumber.eq(personnel_number))
        .one(conn)
        .await?
        .ok_or(DbError::NotFound(EmployeeKey::PersonnelNumber(
            personnel_number,
        )))
}

fn write_error(err: DbErr, personnel_number: i32) -> DbError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DbError::Duplicate(personnel_number),
        _ => DbError::Db(err),
    }
}
