use crate::db::{DbPool, OrmConn};

/// Shared handles, built once in `main` and passed into the router.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}
