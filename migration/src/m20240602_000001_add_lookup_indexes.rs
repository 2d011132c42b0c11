use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_movies_genres_genre")
                    .table(MoviesGenres::Table)
                    .col(MoviesGenres::GenreId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_directors_director")
                    .table(MoviesDirectors::Table)
                    .col(MoviesDirectors::DirectorId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop().name("idx_movies_directors_director").table(MoviesDirectors::Table).to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop().name("idx_movies_genres_genre").table(MoviesGenres::Table).to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum MoviesGenres {
    Table,
    #[sea_orm(iden = "genreId")]
    GenreId,
}

#[derive(DeriveIden)]
enum MoviesDirectors {
    Table,
    #[sea_orm(iden = "directorId")]
    DirectorId,
}
