use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_lookup(manager, Director::Table, Director::Id, Director::Name).await?;
        create_lookup(manager, Actor::Table, Actor::Id, Actor::Name).await?;
        create_lookup(manager, Genre::Table, Genre::Id, Genre::Name).await?;
        create_lookup(manager, Language::Table, Language::Id, Language::Name).await?;
        create_lookup(manager, Country::Table, Country::Id, Country::Name).await?;
        create_lookup(
            manager,
            ContentRating::Table,
            ContentRating::Id,
            ContentRating::Rating,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ContentRating::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Country::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Language::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Actor::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Director::Table).to_owned()).await?;
        Ok(())
    }
}

/// Lookup tables share one shape: an auto id and a unique, case-sensitive key.
async fn create_lookup<T, I, K>(
    manager: &SchemaManager<'_>,
    table: T,
    id: I,
    key: K,
) -> Result<(), DbErr>
where
    T: IntoIden + 'static,
    I: IntoIden + 'static,
    K: IntoIden + 'static,
{
    manager
        .create_table(
            Table::create()
                .table(table)
                .if_not_exists()
                .col(pk_auto(id))
                .col(string(key).unique_key())
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
enum Director {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Actor {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Language {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Country {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum ContentRating {
    Table,
    Id,
    Rating,
}
