use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(big_integer(Movies::Date))
                    .col(string(Movies::Title))
                    .col(integer(Movies::Year))
                    .col(integer_null(Movies::Rating))
                    .col(float_null(Movies::ImdbRating))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string_uniq(Genres::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Directors::Table)
                    .if_not_exists()
                    .col(pk_auto(Directors::Id))
                    .col(string_uniq(Directors::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MoviesGenres::Table)
                    .if_not_exists()
                    .col(integer(MoviesGenres::MovieId))
                    .col(integer(MoviesGenres::GenreId))
                    .primary_key(
                        Index::create().col(MoviesGenres::MovieId).col(MoviesGenres::GenreId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movies_genres_movie")
                            .from(MoviesGenres::Table, MoviesGenres::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movies_genres_genre")
                            .from(MoviesGenres::Table, MoviesGenres::GenreId)
                            .to(Genres::Table, Genres::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MoviesDirectors::Table)
                    .if_not_exists()
                    .col(integer(MoviesDirectors::MovieId))
                    .col(integer(MoviesDirectors::DirectorId))
                    .primary_key(
                        Index::create()
                            .col(MoviesDirectors::MovieId)
                            .col(MoviesDirectors::DirectorId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movies_directors_movie")
                            .from(MoviesDirectors::Table, MoviesDirectors::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movies_directors_director")
                            .from(MoviesDirectors::Table, MoviesDirectors::DirectorId)
                            .to(Directors::Table, Directors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MoviesDirectors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MoviesGenres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Directors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Date,
    Title,
    Year,
    Rating,
    #[sea_orm(iden = "imdbRating")]
    ImdbRating,
}

#[derive(DeriveIden)]
enum Genres {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Directors {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum MoviesGenres {
    Table,
    #[sea_orm(iden = "movieId")]
    MovieId,
    #[sea_orm(iden = "genreId")]
    GenreId,
}

#[derive(DeriveIden)]
enum MoviesDirectors {
    Table,
    #[sea_orm(iden = "movieId")]
    MovieId,
    #[sea_orm(iden = "directorId")]
    DirectorId,
}
