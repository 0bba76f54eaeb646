//! Generic sqlx-backed implementation of the search repository port.
//!
//! One instance serves one entity table. The entity type only needs a
//! `FromRow` implementation; query text is assembled from the rendered
//! specification plus `ORDER BY`/`LIMIT`/`OFFSET`, with every value passed
//! as a bind parameter.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::Postgres;

use lexika_core::error::RepositoryError;
use lexika_core::query::page::{PageRequest, PageSlice};
use lexika_core::query::params::{SortDirection, Value};
use lexika_core::query::spec::Specification;
use lexika_core::search::repository::SearchRepository;

use crate::sql::{ensure_identifier, render_where, SqlWhere};
use crate::DbPool;

/// Specification-driven read access to one entity table.
pub struct PgSearchRepository<E> {
    pool: DbPool,
    table: String,
    columns: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E> PgSearchRepository<E> {
    /// Create a repository over `table`, selecting `columns`.
    ///
    /// Table and column names are checked against the strict identifier
    /// shape; a bad name is a configuration error, not a query error.
    pub fn new(pool: DbPool, table: &str, columns: &[&str]) -> Result<Self, RepositoryError> {
        ensure_identifier(table)?;
        if columns.is_empty() {
            return Err(RepositoryError::new("column list must not be empty"));
        }
        for column in columns {
            ensure_identifier(column)?;
        }
        Ok(Self {
            pool,
            table: table.to_string(),
            columns: columns.join(", "),
            _entity: PhantomData,
        })
    }

    /// Assemble the SELECT statement and the trailing window binds.
    fn select_sql(
        &self,
        rendered: &SqlWhere,
        page: &PageRequest,
    ) -> Result<(String, Option<i64>, Option<i64>), RepositoryError> {
        let mut sql = format!("SELECT {} FROM {}", self.columns, self.table);
        if !rendered.clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&rendered.clause);
        }

        if let Some(sort) = &page.sort {
            ensure_identifier(&sort.field)?;
            let direction = match sort.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {} {}", sort.field, direction));
        }

        let mut next = rendered.binds.len();
        let limit = page.limit;
        if limit.is_some() {
            next += 1;
            sql.push_str(&format!(" LIMIT ${next}"));
        }
        let offset = (page.offset > 0).then_some(page.offset);
        if offset.is_some() {
            next += 1;
            sql.push_str(&format!(" OFFSET ${next}"));
        }

        Ok((sql, limit, offset))
    }
}

#[async_trait]
impl<E> SearchRepository<E> for PgSearchRepository<E>
where
    E: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin + 'static,
{
    async fn find_all(
        &self,
        spec: &Specification,
        page: &PageRequest,
    ) -> Result<PageSlice<E>, RepositoryError> {
        let rendered = render_where(spec)?;
        let (sql, limit, offset) = self.select_sql(&rendered, page)?;
        tracing::debug!(table = %self.table, sql = %sql, binds = rendered.binds.len(), "Executing search query");

        let mut query = sqlx::query_as::<_, E>(&sql);
        query = bind_values(query, &rendered.binds);
        if let Some(limit) = limit {
            query = query.bind(limit);
        }
        if let Some(offset) = offset {
            query = query.bind(offset);
        }

        let items = query
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from_source)?;
        let total = self.count(spec).await?;
        Ok(PageSlice { items, total })
    }

    async fn count(&self, spec: &Specification) -> Result<i64, RepositoryError> {
        let rendered = render_where(spec)?;
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        if !rendered.clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&rendered.clause);
        }
        tracing::debug!(table = %self.table, sql = %sql, "Executing count query");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        query = bind_values_scalar(query, &rendered.binds);
        query
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from_source)
    }
}

/// Bind a slice of rendered values to a sqlx `QueryAs`.
fn bind_values<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    values: &'q [Value],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for val in values {
        match val {
            // Not producible by the builder; bound defensively as typed NULL.
            Value::Null => q = q.bind(Option::<String>::None),
            Value::Bool(v) => q = q.bind(*v),
            Value::Int(v) => q = q.bind(*v),
            Value::Float(v) => q = q.bind(*v),
            Value::Str(v) => q = q.bind(v.as_str()),
            Value::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of rendered values to a sqlx `QueryScalar`.
fn bind_values_scalar<'q>(
    mut q: QueryScalar<'q, Postgres, i64, PgArguments>,
    values: &'q [Value],
) -> QueryScalar<'q, Postgres, i64, PgArguments> {
    for val in values {
        match val {
            Value::Null => q = q.bind(Option::<String>::None),
            Value::Bool(v) => q = q.bind(*v),
            Value::Int(v) => q = q.bind(*v),
            Value::Float(v) => q = q.bind(*v),
            Value::Str(v) => q = q.bind(v.as_str()),
            Value::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use lexika_core::query::page::SortSpec;
    use lexika_core::query::params::{FilterOperator, FilterParams, SearchParams};
    use lexika_core::query::spec::build_specification;
    use lexika_core::query::supported::SupportedParams;
    use sqlx::postgres::PgPoolOptions;

    #[derive(Debug, sqlx::FromRow)]
    #[allow(dead_code)]
    struct WordRow {
        id: i64,
        name: String,
        level: i64,
    }

    /// A pool that never connects; these tests only assemble SQL.
    fn lazy_pool() -> DbPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/lexika_test")
            .expect("lazy pool")
    }

    fn repo() -> PgSearchRepository<WordRow> {
        PgSearchRepository::new(lazy_pool(), "words", &["id", "name", "level"]).unwrap()
    }

    fn spec(filters: FilterParams) -> Specification {
        let supported = SupportedParams::new().filter_fields(&["level", "name"]);
        build_specification(&filters, &SearchParams::default(), &supported).unwrap()
    }

    // -- construction --------------------------------------------------------

    #[tokio::test]
    async fn rejects_unsafe_table_name() {
        let err = PgSearchRepository::<WordRow>::new(lazy_pool(), "words; --", &["id"]);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn rejects_unsafe_column_name() {
        let err = PgSearchRepository::<WordRow>::new(lazy_pool(), "words", &["id", "BAD"]);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn rejects_empty_column_list() {
        assert!(PgSearchRepository::<WordRow>::new(lazy_pool(), "words", &[]).is_err());
    }

    // -- select_sql ----------------------------------------------------------

    #[tokio::test]
    async fn unfiltered_unpaged_select() {
        let rendered = render_where(&Specification::All).unwrap();
        let (sql, limit, offset) = repo()
            .select_sql(&rendered, &PageRequest::unpaged(None))
            .unwrap();
        assert_eq!(sql, "SELECT id, name, level FROM words");
        assert_eq!(limit, None);
        assert_eq!(offset, None);
    }

    #[tokio::test]
    async fn filtered_sorted_windowed_select() {
        let filters = FilterParams::new().with("level", FilterOperator::Gte, 2i64);
        let rendered = render_where(&spec(filters)).unwrap();
        let page = PageRequest {
            offset: 40,
            limit: Some(20),
            sort: Some(SortSpec {
                field: "name".to_string(),
                direction: SortDirection::Desc,
            }),
        };
        let (sql, limit, offset) = repo().select_sql(&rendered, &page).unwrap();
        assert_eq!(
            sql,
            "SELECT id, name, level FROM words WHERE level >= $1 \
             ORDER BY name DESC LIMIT $2 OFFSET $3"
        );
        assert_eq!(limit, Some(20));
        assert_eq!(offset, Some(40));
    }

    #[tokio::test]
    async fn first_page_omits_offset() {
        let rendered = render_where(&Specification::All).unwrap();
        let page = PageRequest {
            offset: 0,
            limit: Some(20),
            sort: None,
        };
        let (sql, _, offset) = repo().select_sql(&rendered, &page).unwrap();
        assert_eq!(sql, "SELECT id, name, level FROM words LIMIT $1");
        assert_eq!(offset, None);
    }

    #[tokio::test]
    async fn sort_field_is_identifier_checked() {
        let rendered = render_where(&Specification::All).unwrap();
        let page = PageRequest {
            offset: 0,
            limit: None,
            sort: Some(SortSpec {
                field: "name; DROP TABLE words".to_string(),
                direction: SortDirection::Asc,
            }),
        };
        assert!(repo().select_sql(&rendered, &page).is_err());
    }
}
