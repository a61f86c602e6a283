//! Generic PostgreSQL repository
//!
//! One [`PgRepository`] serves any type implementing [`Entity`]. Rows with a
//! non-null `deleted_on` are invisible to every read.
//!
//! # Example
//!
//! ```rust,ignore
//! use travel_service::repository::{PageRequest, PgRepository, Sort};
//!
//! let products = PgRepository::<Product>::new(pool.clone());
//! let filter = ProductFilter { is_active: Some(true), ..Default::default() };
//!
//! let (total, page) = tokio::try_join!(
//!     products.count(Some(&filter)),
//!     products.find_all(Some(&filter), PageRequest::from_parts(Some(1), Some(10)), Some(&Sort::desc("price"))),
//! )?;
//! ```

use std::fmt;
use std::marker::PhantomData;

use sqlx::{
    postgres::PgRow,
    query_builder::Separated,
    FromRow, Postgres, QueryBuilder,
};

use super::connection::Connection;
use super::error::{RepositoryError, RepositoryOperation, RepositoryResult};
use super::filter::{push_predicates, validate_identifier, Filter};
use super::pagination::{PageRequest, Sort};

/// A soft-deletable table row
///
/// `COLUMNS` lists every column written on insert and update, in the order
/// [`Entity::bind_columns`] binds them. `id` is generated by the database and
/// `deleted_on` is owned by the repository; neither belongs in `COLUMNS`.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static {
    /// Filter accepted by `find_all` and `count`
    type Filter: Filter;

    /// Name used in errors and spans
    const NAME: &'static str;

    /// Schema-qualified table name
    const TABLE: &'static str;

    const COLUMNS: &'static [&'static str];

    /// Columns a listing may be ordered by, besides `id`
    const SORTABLE: &'static [&'static str];

    fn id(&self) -> i64;

    /// Bind one value per entry of `COLUMNS`
    fn bind_columns<'qb, 'args: 'qb>(
        &self,
        values: &mut Separated<'qb, 'args, Postgres, &'static str>,
    );
}

/// CRUD over one entity type
pub struct PgRepository<E> {
    conn: Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgRepository<E> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for PgRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgRepository")
            .field("entity", &E::NAME)
            .field("transactional", &self.conn.is_transactional())
            .finish()
    }
}

impl<E: Entity> PgRepository<E> {
    pub fn new(conn: impl Into<Connection>) -> Self {
        Self {
            conn: conn.into(),
            _entity: PhantomData,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// List live rows matching `filter`
    ///
    /// Rows are ordered by `sort` (default `id ASC`) with `id` as the final
    /// tie-break. Without a page every matching row is returned.
    #[tracing::instrument(name = "repository.find_all", skip_all, fields(entity = E::NAME))]
    pub async fn find_all(
        &self,
        filter: Option<&E::Filter>,
        page: Option<PageRequest>,
        sort: Option<&Sort>,
    ) -> RepositoryResult<Vec<E>> {
        let op = RepositoryOperation::FindAll;
        let mut builder = select_query::<E>(filter, page, sort)?;

        let mut handle = self.conn.acquire(op).await?;
        builder
            .build_query_as::<E>()
            .fetch_all(handle.executor())
            .await
            .map_err(|e| RepositoryError::from_sqlx(op, e).with_entity_type(E::NAME))
    }

    /// Count live rows matching `filter`
    #[tracing::instrument(name = "repository.count", skip_all, fields(entity = E::NAME))]
    pub async fn count(&self, filter: Option<&E::Filter>) -> RepositoryResult<i64> {
        let op = RepositoryOperation::Count;
        let mut builder = count_query::<E>(filter)?;

        let mut handle = self.conn.acquire(op).await?;
        builder
            .build_query_scalar::<i64>()
            .fetch_one(handle.executor())
            .await
            .map_err(|e| RepositoryError::from_sqlx(op, e).with_entity_type(E::NAME))
    }

    #[tracing::instrument(name = "repository.find_by_id", skip_all, fields(entity = E::NAME, id = id))]
    pub async fn find_by_id(&self, id: i64) -> RepositoryResult<E> {
        let op = RepositoryOperation::FindById;
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT * FROM {} WHERE deleted_on IS NULL AND id = ",
            E::TABLE
        ));
        builder.push_bind(id);

        let mut handle = self.conn.acquire(op).await?;
        builder
            .build_query_as::<E>()
            .fetch_optional(handle.executor())
            .await
            .map_err(|e| RepositoryError::from_sqlx(op, e).with_entity(E::NAME, id))?
            .ok_or_else(|| RepositoryError::not_found(E::NAME, id))
    }

    /// Insert a new row and return it as stored
    #[tracing::instrument(name = "repository.save", skip_all, fields(entity = E::NAME))]
    pub async fn save(&self, entity: &E) -> RepositoryResult<E> {
        let op = RepositoryOperation::Save;
        let mut builder = insert_query(entity);

        let mut handle = self.conn.acquire(op).await?;
        builder
            .build_query_as::<E>()
            .fetch_one(handle.executor())
            .await
            .map_err(|e| RepositoryError::from_sqlx(op, e).with_entity_type(E::NAME))
    }

    /// Write the whole row, inserting it if the id is unknown
    #[tracing::instrument(name = "repository.update", skip_all, fields(entity = E::NAME, id = entity.id()))]
    pub async fn update(&self, entity: &E) -> RepositoryResult<E> {
        let op = RepositoryOperation::Update;
        let mut builder = upsert_query(entity);

        let mut handle = self.conn.acquire(op).await?;
        builder
            .build_query_as::<E>()
            .fetch_one(handle.executor())
            .await
            .map_err(|e| RepositoryError::from_sqlx(op, e).with_entity(E::NAME, entity.id()))
    }

    /// Soft delete; returns the number of rows newly marked
    ///
    /// Deleting a missing or already deleted row is not an error.
    #[tracing::instrument(name = "repository.delete", skip_all, fields(entity = E::NAME, id = id))]
    pub async fn delete(&self, id: i64) -> RepositoryResult<u64> {
        let op = RepositoryOperation::Delete;
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET deleted_on = now() WHERE deleted_on IS NULL AND id = ",
            E::TABLE
        ));
        builder.push_bind(id);

        let mut handle = self.conn.acquire(op).await?;
        let result = builder
            .build()
            .execute(handle.executor())
            .await
            .map_err(|e| RepositoryError::from_sqlx(op, e).with_entity(E::NAME, id))?;

        if result.rows_affected() == 0 {
            tracing::debug!(id, "nothing to delete");
        }
        Ok(result.rows_affected())
    }
}

fn live_rows<E: Entity>(
    select: &str,
    filter: Option<&E::Filter>,
    op: RepositoryOperation,
) -> RepositoryResult<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM {} WHERE deleted_on IS NULL",
        select,
        E::TABLE
    ));
    if let Some(filter) = filter {
        push_predicates(&mut builder, &filter.predicates(), op)?;
    }
    Ok(builder)
}

fn select_query<E: Entity>(
    filter: Option<&E::Filter>,
    page: Option<PageRequest>,
    sort: Option<&Sort>,
) -> RepositoryResult<QueryBuilder<'static, Postgres>> {
    let op = RepositoryOperation::FindAll;
    let mut builder = live_rows::<E>("*", filter, op)?;

    let default_sort = Sort::default();
    let sort = sort.unwrap_or(&default_sort);
    validate_identifier(op, &sort.column)?;
    if sort.column != "id" && !E::SORTABLE.contains(&sort.column.as_str()) {
        return Err(RepositoryError::configuration(
            op,
            format!("cannot order {} by '{}'", E::NAME, sort.column),
        )
        .with_entity_type(E::NAME));
    }

    builder
        .push(" ORDER BY ")
        .push(&sort.column)
        .push(" ")
        .push(sort.direction.as_sql());
    if sort.column != "id" {
        builder.push(", id ASC");
    }

    if let Some(page) = page {
        builder
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
    }
    Ok(builder)
}

fn count_query<E: Entity>(
    filter: Option<&E::Filter>,
) -> RepositoryResult<QueryBuilder<'static, Postgres>> {
    live_rows::<E>("COUNT(*)", filter, RepositoryOperation::Count)
}

fn insert_query<E: Entity>(entity: &E) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        E::TABLE,
        E::COLUMNS.join(", ")
    ));
    {
        let mut values = builder.separated(", ");
        entity.bind_columns(&mut values);
    }
    builder.push(") RETURNING *");
    builder
}

fn upsert_query<E: Entity>(entity: &E) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} (id, {}) VALUES (",
        E::TABLE,
        E::COLUMNS.join(", ")
    ));
    {
        let mut values = builder.separated(", ");
        values.push_bind(entity.id());
        entity.bind_columns(&mut values);
    }

    let assignments = E::COLUMNS
        .iter()
        .map(|column| format!("{column} = EXCLUDED.{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    builder.push(format!(
        ") ON CONFLICT (id) DO UPDATE SET {assignments} RETURNING *"
    ));
    builder
}
