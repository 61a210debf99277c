use sea_orm::{ConnectionTrait, DbBackend, DbConn, DbErr};
use tracing::{info, instrument};

#[allow(warnings, clippy::all)]
pub(crate) mod paste {
    use sea_orm::entity::prelude::*;

    #[sea_orm::model]
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "paste")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(column_type = "Text")]
        pub content: String,
        pub created_at: TimeDateTime,
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Creates the `paste` table if it does not exist yet.
///
/// # Errors
/// Will return [`Err`] if the DDL statement fails.
#[instrument(skip(db))]
pub async fn ensure_schema(db: &DbConn) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    info!(?backend, "Ensuring paste table exists");
    db.execute_unprepared(create_table_sql(backend)).await?;
    Ok(())
}

const fn create_table_sql(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => {
            "CREATE TABLE IF NOT EXISTS paste (\
             id VARCHAR(6) PRIMARY KEY, \
             content TEXT NOT NULL, \
             created_at TIMESTAMP NOT NULL)"
        }
        // NOTE: bare DATETIME truncates to whole seconds on MySQL
        _ => {
            "CREATE TABLE IF NOT EXISTS paste (\
             id VARCHAR(6) PRIMARY KEY, \
             content TEXT NOT NULL, \
             created_at DATETIME(6) NOT NULL)"
        }
    }
}
