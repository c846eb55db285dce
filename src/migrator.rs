use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_create_farmers_table::Migration)]
    }
}

// Migration implementations

mod m20240101_000001_create_farmers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_farmers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Aligned with entities::farmer Model
            manager
                .create_table(
                    Table::create()
                        .table(Farmers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Farmers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Farmers::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Farmers::Phone).string_len(15).not_null())
                        .col(ColumnDef::new(Farmers::Location).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Farmers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Farmers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Phone numbers identify a farmer; the index is the source of truth for uniqueness
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_farmers_phone_unique")
                        .table(Farmers::Table)
                        .col(Farmers::Phone)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Dropping the table takes the phone index with it
            manager
                .drop_table(Table::drop().table(Farmers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Farmers {
        Table,
        Id,
        Name,
        Phone,
        Location,
        CreatedAt,
        UpdatedAt,
    }
}
