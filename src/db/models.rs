use anyhow::Context;
use diesel::prelude::*;

use super::schema::storage_entries;

#[derive(Queryable, Selectable, Insertable, Debug, PartialEq)]
#[diesel(table_name = storage_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StorageEntry {
    pub key: String,
    pub value: String,
}

impl StorageEntry {
    pub fn get(connection: &mut PgConnection, key: &str) -> anyhow::Result<Option<String>> {
        match storage_entries::dsl::storage_entries
            .find(key)
            .first::<StorageEntry>(connection)
        {
            Ok(entry) => Ok(Some(entry.value)),
            Err(error) => {
                if error == diesel::NotFound {
                    Ok(None)
                } else {
                    Err(anyhow::anyhow!(error))
                }
            }
        }
    }

    pub fn set(connection: &mut PgConnection, key: &str, value: &str) -> anyhow::Result<()> {
        let entry = StorageEntry {
            key: key.to_owned(),
            value: value.to_owned(),
        };

        diesel::insert_into(storage_entries::dsl::storage_entries)
            .values(&entry)
            .on_conflict(storage_entries::dsl::key)
            .do_update()
            .set(storage_entries::dsl::value.eq(value))
            .execute(connection)
            .context(format!("could not upsert storage entry {key}"))?;

        Ok(())
    }
}
