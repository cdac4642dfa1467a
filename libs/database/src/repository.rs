use std::marker::PhantomData;

use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PrimaryKeyTrait};
use uuid::Uuid;

/// Owns the connection pool for one entity and provides the lookups every
/// Postgres repository repeats. Anything more specific is written against
/// [`BaseRepository::db`] directly.
pub struct BaseRepository<E: EntityTrait> {
    db: DatabaseConnection,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> BaseRepository<E> {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<E::Model>, DbErr>
    where
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
    {
        E::find_by_id(id).one(&self.db).await
    }
}

impl<E: EntityTrait> Clone for BaseRepository<E> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}
