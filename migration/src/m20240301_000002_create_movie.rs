use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(string(Movie::Title))
                    .col(integer(Movie::DirectorId))
                    .col(integer(Movie::Duration))
                    .col(big_integer(Movie::Gross))
                    .col(integer(Movie::LanguageId))
                    .col(integer(Movie::CountryId))
                    .col(integer(Movie::ContentRatingId))
                    .col(big_integer(Movie::Budget))
                    .col(integer(Movie::Year))
                    .col(double(Movie::ImdbScore))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_director")
                            .from(Movie::Table, Movie::DirectorId)
                            .to(Director::Table, Director::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_language")
                            .from(Movie::Table, Movie::LanguageId)
                            .to(Language::Table, Language::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_country")
                            .from(Movie::Table, Movie::CountryId)
                            .to(Country::Table, Country::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_content_rating")
                            .from(Movie::Table, Movie::ContentRatingId)
                            .to(ContentRating::Table, ContentRating::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_director")
                    .table(Movie::Table)
                    .col(Movie::DirectorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_title")
                    .table(Movie::Table)
                    .col(Movie::Title)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    Title,
    DirectorId,
    Duration,
    Gross,
    LanguageId,
    CountryId,
    ContentRatingId,
    Budget,
    Year,
    ImdbScore,
}

#[derive(DeriveIden)]
enum Director {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Language {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Country {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ContentRating {
    Table,
    Id,
}
