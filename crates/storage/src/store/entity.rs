#![forbid(unsafe_code)]

use super::error::{RecordKind, StoreError, map_write_conflict};
use folio_core::{Patch, Validate};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params_from_iter};

/// A flat record kind persisted in one table with an `INTEGER PRIMARY KEY id`
/// and store-maintained `created_at_ms` / `updated_at_ms` columns.
pub(crate) trait Record: Validate + Sized {
    type Id: Copy + Into<i64>;
    type Draft: Validate;

    const KIND: RecordKind;
    const TABLE: &'static str;
    /// Columns written on insert and update, in [`Record::values`] order.
    const COLUMNS: &'static [&'static str];
    /// Columns read back but only ever written by dedicated statements.
    const READ_ONLY: &'static [&'static str] = &[];
    const ORDER_BY: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn values(&self) -> Vec<Value>;
    /// Values for [`Record::COLUMNS`], with declared defaults filled in.
    fn draft_values(draft: &Self::Draft) -> Vec<Value>;
}

/// `column = value` on an integer column.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Filter {
    column: &'static str,
    value: i64,
}

impl Filter {
    pub(crate) fn eq(column: &'static str, value: impl Into<i64>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

fn where_clause(filters: &[Filter]) -> (String, Vec<i64>) {
    let mut sql = String::new();
    for (i, filter) in filters.iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&format!("{} = ?{}", filter.column, i + 1));
    }
    (sql, filters.iter().map(|filter| filter.value).collect())
}

pub(crate) struct Tx<'conn> {
    inner: Transaction<'conn>,
    now_ms: i64,
}

impl<'conn> Tx<'conn> {
    pub(super) fn begin(
        conn: &'conn mut Connection,
        behavior: TransactionBehavior,
        now_ms: i64,
    ) -> Result<Self, StoreError> {
        let inner = conn.transaction_with_behavior(behavior)?;
        Ok(Self { inner, now_ms })
    }

    pub(super) fn commit(self) -> Result<(), StoreError> {
        self.inner.commit()?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.inner
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub(crate) fn create<R: Record>(&self, draft: &R::Draft) -> Result<R, StoreError> {
        draft.validate()?;
        let mut values = R::draft_values(draft);
        debug_assert_eq!(values.len(), R::COLUMNS.len());
        values.push(Value::Integer(self.now_ms));
        values.push(Value::Integer(self.now_ms));

        let placeholders = (1..=values.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {}({}, created_at_ms, updated_at_ms) VALUES ({placeholders})",
            R::TABLE,
            R::COLUMNS.join(", "),
        );
        self.inner
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(map_write_conflict)?;

        let id = self.inner.last_insert_rowid();
        self.fetch::<R>(id)?
            .ok_or(StoreError::NotFound {
                kind: R::KIND,
                id: Some(id),
            })
    }

    pub(crate) fn find<R: Record>(&self, id: R::Id) -> Result<Option<R>, StoreError> {
        self.fetch::<R>(id.into())
    }

    pub(crate) fn get<R: Record>(&self, id: R::Id) -> Result<R, StoreError> {
        self.find::<R>(id)?
            .ok_or_else(|| StoreError::not_found(R::KIND, id))
    }

    pub(crate) fn exists<R: Record>(&self, id: R::Id) -> Result<bool, StoreError> {
        let id: i64 = id.into();
        let sql = format!("SELECT 1 FROM {} WHERE id = ?1", R::TABLE);
        Ok(self
            .inner
            .query_row(&sql, [id], |_| Ok(()))
            .optional()?
            .is_some())
    }

    pub(crate) fn list<R: Record>(&self, filters: &[Filter]) -> Result<Vec<R>, StoreError> {
        let (clause, values) = where_clause(filters);
        let sql = format!("{}{clause} ORDER BY {}", select_sql::<R>(), R::ORDER_BY);
        let mut stmt = self.inner.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), R::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub(crate) fn count<R: Record>(&self, filters: &[Filter]) -> Result<usize, StoreError> {
        let (clause, values) = where_clause(filters);
        let sql = format!("SELECT COUNT(*) FROM {}{clause}", R::TABLE);
        let count: i64 = self
            .inner
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Merges `patch` into the stored record. An empty patch, or one that
    /// leaves every column unchanged, returns the current record without a
    /// write.
    pub(crate) fn update<R, P>(&self, id: R::Id, patch: &P) -> Result<R, StoreError>
    where
        R: Record,
        P: Patch<R>,
    {
        let current = self.get::<R>(id)?;
        if patch.is_empty() {
            return Ok(current);
        }

        let before = current.values();
        let mut next = current;
        patch.apply_to(&mut next);
        let after = next.values();
        if after == before {
            return Ok(next);
        }
        next.validate()?;
        self.write_columns::<R>(id, after)?;
        self.get::<R>(id)
    }

    pub(crate) fn delete<R: Record>(&self, id: R::Id) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", R::TABLE);
        let deleted = self
            .inner
            .execute(&sql, [Into::<i64>::into(id)])
            .map_err(map_write_conflict)?;
        if deleted == 0 {
            return Err(StoreError::not_found(R::KIND, id));
        }
        Ok(())
    }

    fn write_columns<R: Record>(&self, id: R::Id, mut values: Vec<Value>) -> Result<(), StoreError> {
        let assignments = R::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments}, updated_at_ms = ?{} WHERE id = ?{}",
            R::TABLE,
            values.len() + 1,
            values.len() + 2,
        );
        values.push(Value::Integer(self.now_ms));
        values.push(Value::Integer(Into::<i64>::into(id)));

        let updated = self
            .inner
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(map_write_conflict)?;
        if updated == 0 {
            return Err(StoreError::not_found(R::KIND, id));
        }
        Ok(())
    }

    fn fetch<R: Record>(&self, id: i64) -> Result<Option<R>, StoreError> {
        let sql = format!("{} WHERE id = ?1", select_sql::<R>());
        Ok(self.inner.query_row(&sql, [id], R::from_row).optional()?)
    }
}

fn select_sql<R: Record>() -> String {
    let mut columns = vec!["id"];
    columns.extend_from_slice(R::COLUMNS);
    columns.extend_from_slice(R::READ_ONLY);
    columns.push("created_at_ms");
    columns.push("updated_at_ms");
    format!("SELECT {} FROM {}", columns.join(", "), R::TABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::install_schema;
    use folio_core::ids::CollectionId;
    use folio_core::{Collection, CollectionPatch, NewCollection};

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open memory db");
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .expect("enable foreign keys");
        install_schema(&conn).expect("install schema");
        conn
    }

    fn with_tx<T>(conn: &mut Connection, now_ms: i64, op: impl FnOnce(&Tx<'_>) -> T) -> T {
        let tx = Tx::begin(conn, TransactionBehavior::Immediate, now_ms).expect("begin");
        let out = op(&tx);
        tx.commit().expect("commit");
        out
    }

    #[test]
    fn create_assigns_identity_and_timestamps() {
        let mut conn = memory_conn();
        let created = with_tx(&mut conn, 100, |tx| {
            tx.create::<Collection>(&NewCollection::new("Requests"))
        })
        .expect("create");

        assert!(created.id.get() > 0);
        assert_eq!(created.name, "Requests");
        assert_eq!(created.description, None);
        assert_eq!(created.created_at_ms, 100);
        assert_eq!(created.updated_at_ms, 100);
    }

    #[test]
    fn empty_or_unchanged_patch_does_not_write() {
        let mut conn = memory_conn();
        let created = with_tx(&mut conn, 100, |tx| {
            tx.create::<Collection>(&NewCollection::new("Requests"))
        })
        .expect("create");

        let same = with_tx(&mut conn, 200, |tx| {
            tx.update::<Collection, _>(created.id, &CollectionPatch::default())
        })
        .expect("empty patch");
        assert_eq!(same, created);

        let same = with_tx(&mut conn, 300, |tx| {
            tx.update::<Collection, _>(
                created.id,
                &CollectionPatch {
                    name: Some("Requests".to_string()),
                    description: None,
                },
            )
        })
        .expect("unchanged patch");
        assert_eq!(same.updated_at_ms, 100);

        let renamed = with_tx(&mut conn, 400, |tx| {
            tx.update::<Collection, _>(
                created.id,
                &CollectionPatch {
                    name: None,
                    description: Some(Some("saved searches".to_string())),
                },
            )
        })
        .expect("real patch");
        assert_eq!(renamed.name, "Requests");
        assert_eq!(renamed.description.as_deref(), Some("saved searches"));
        assert_eq!(renamed.created_at_ms, 100);
        assert_eq!(renamed.updated_at_ms, 400);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let mut conn = memory_conn();
        let missing = CollectionId::new(404);
        with_tx(&mut conn, 1, |tx| {
            assert!(matches!(
                tx.get::<Collection>(missing),
                Err(StoreError::NotFound {
                    kind: RecordKind::Collection,
                    id: Some(404)
                })
            ));
            assert!(matches!(
                tx.update::<Collection, _>(missing, &CollectionPatch::default()),
                Err(StoreError::NotFound { .. })
            ));
            assert!(matches!(
                tx.delete::<Collection>(missing),
                Err(StoreError::NotFound { .. })
            ));
        });
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let mut conn = memory_conn();
        {
            let tx = Tx::begin(&mut conn, TransactionBehavior::Immediate, 1).expect("begin");
            tx.create::<Collection>(&NewCollection::new("ghost"))
                .expect("create");
        }
        let listed = with_tx(&mut conn, 2, |tx| tx.list::<Collection>(&[])).expect("list");
        assert!(listed.is_empty());
    }

    #[test]
    fn list_orders_by_declared_key() {
        let mut conn = memory_conn();
        with_tx(&mut conn, 1, |tx| {
            for name in ["zulu", "alpha", "mike"] {
                tx.create::<Collection>(&NewCollection::new(name))
                    .expect("create");
            }
        });
        let names: Vec<String> = with_tx(&mut conn, 2, |tx| tx.list::<Collection>(&[]))
            .expect("list")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["alpha", "mike", "zulu"]);

        let counted = with_tx(&mut conn, 3, |tx| tx.count::<Collection>(&[])).expect("count");
        assert_eq!(counted, 3);
    }
}
