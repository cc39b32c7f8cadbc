use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    Surname,
    Name,
    Patronymic,
    YearOfBirth,
    PersonnelNumber,
    Salary,
    Position,
    LegalEntity,
    StructuralSubdivision,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employees::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employees::Surname).string().not_null())
                    .col(ColumnDef::new(Employees::Name).string().not_null())
                    .col(ColumnDef::new(Employees::Patronymic).string().not_null())
                    .col(ColumnDef::new(Employees::YearOfBirth).integer().not_null())
                    .col(ColumnDef::new(Employees::PersonnelNumber).integer().not_null())
                    .col(ColumnDef::new(Employees::Salary).double().not_null())
                    .col(ColumnDef::new(Employees::Position).string().not_null())
                    .col(ColumnDef::new(Employees::LegalEntity).string().not_null())
                    .col(
                        ColumnDef::new(Employees::StructuralSubdivision)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // personnel_number is the business key.
        manager
            .create_index(
                Index::create()
                    .name("idx_employees_personnel_number")
                    .table(Employees::Table)
                    .col(Employees::PersonnelNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_employees_full_name")
                    .table(Employees::Table)
                    .col(Employees::Surname)
                    .col(Employees::Name)
                    .col(Employees::Patronymic)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await
    }
}
