use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub year_of_birth: i32,
    #[sea_orm(unique)]
    pub personnel_number: i32,
    pub salary: f64,
    pub position: String,
    pub legal_entity: String,
    pub structural_subdivision: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
