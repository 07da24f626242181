pub mod models;
pub mod schema;

use anyhow::Context;
use diesel::{
    r2d2::{ConnectionManager, Pool},
    PgConnection,
};

pub fn connect(
    connection_string: &str,
) -> anyhow::Result<Pool<ConnectionManager<PgConnection>>> {
    let manager = ConnectionManager::<PgConnection>::new(connection_string);
    Pool::builder()
        .build(manager)
        .context("could not build database connection pool")
}
