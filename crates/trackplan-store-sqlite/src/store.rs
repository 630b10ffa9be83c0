//! [`SqliteStore`], the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, TransactionBehavior, params};
use tracing::{debug, warn};
use uuid::Uuid;

use trackplan_core::{
  Conflict, OwnerId, ReconcileError,
  catalog::{
    Event, PlanDetail, PlanEventView, PlanPropertyView, Property, TrackingPlan,
  },
  reconcile::reconcile,
  store::CatalogStore,
  submission::PlanSubmission,
};

use crate::{
  Error, Result,
  encode::{RawEvent, RawPlan, RawProperty, decode_uuid, encode_uuid},
  schema::SCHEMA,
  txn::SqliteCatalogTx,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tracking-plan catalog backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    debug!("catalog schema initialised");
    Ok(())
  }

  /// Load one owner-scoped row by id from `table`.
  async fn fetch_one<R, T>(
    &self,
    table: &'static str,
    columns: &'static str,
    owner: &OwnerId,
    id: Uuid,
    read: fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
    decode: fn(R) -> Result<T>,
  ) -> Result<Option<T>>
  where
    R: Send + 'static,
  {
    let owner_str = owner.as_str().to_owned();
    let id_str = encode_uuid(id);

    let raw: Option<R> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {columns} FROM {table} WHERE id = ?1 AND owner_id = ?2"),
            params![id_str, owner_str],
            read,
          )
          .optional()?)
      })
      .await?;

    raw.map(decode).transpose()
  }

  /// List owner-scoped rows of `table`, optionally filtered by name.
  async fn fetch_all<R, T>(
    &self,
    table: &'static str,
    columns: &'static str,
    owner: &OwnerId,
    name: Option<String>,
    read: fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
    decode: fn(R) -> Result<T>,
  ) -> Result<Vec<T>>
  where
    R: Send + 'static,
  {
    let owner_str = owner.as_str().to_owned();

    let raws: Vec<R> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {columns} FROM {table}
           WHERE owner_id = ?1 AND (?2 IS NULL OR name = ?2)
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(params![owner_str, name], read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(decode).collect()
  }

  /// Replace the description of an owner-scoped row; `true` if a row changed.
  async fn set_description(
    &self,
    table: &'static str,
    owner: &OwnerId,
    id: Uuid,
    description: String,
  ) -> Result<bool> {
    let owner_str = owner.as_str().to_owned();
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("UPDATE {table} SET description = ?1 WHERE id = ?2 AND owner_id = ?3"),
          params![description, id_str, owner_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }
}

#[cfg(test)]
impl SqliteStore {
  pub(crate) async fn count_rows(&self, table: &'static str) -> Result<i64> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
        })
        .await?,
    )
  }

  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    Ok(self.conn.call(move |conn| Ok(conn.execute(sql, [])?)).await?)
  }
}

/// Treat a unique-constraint failure as a lost race with another writer.
///
/// The SQLite message names tables and columns, so it is logged here and
/// kept out of the conflict text.
pub(crate) fn classify(err: ReconcileError<Error>) -> ReconcileError<Error> {
  match err {
    ReconcileError::Store(e) if e.is_unique_violation() => {
      warn!(error = %e, "unique constraint failed during reconciliation");
      ReconcileError::Conflict(Conflict::Concurrent(
        "the catalog changed while this plan was being reconciled; retry the submission"
          .to_owned(),
      ))
    }
    other => other,
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Reconciliation ────────────────────────────────────────────────────────

  async fn reconcile(
    &self,
    owner: OwnerId,
    submission: PlanSubmission,
  ) -> Result<TrackingPlan, ReconcileError<Error>> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = {
          let mut catalog = SqliteCatalogTx::new(&tx);
          reconcile(&mut catalog, &owner, &submission)
        };
        // Dropping `tx` without committing rolls every write back.
        Ok(match result {
          Ok(plan) => tx
            .commit()
            .map(|()| plan)
            .map_err(|e| ReconcileError::Store(Error::from(e))),
          Err(e) => Err(e),
        })
      })
      .await;

    match outcome {
      Ok(result) => result.map_err(classify),
      Err(e) => Err(ReconcileError::Store(Error::from(e))),
    }
  }

  // ── Plans ─────────────────────────────────────────────────────────────────

  async fn list_plans(&self, owner: OwnerId) -> Result<Vec<TrackingPlan>> {
    self
      .fetch_all(
        "tracking_plans",
        RawPlan::COLUMNS,
        &owner,
        None,
        RawPlan::from_row,
        RawPlan::into_plan,
      )
      .await
  }

  async fn get_plan(&self, owner: OwnerId, id: Uuid) -> Result<Option<TrackingPlan>> {
    self
      .fetch_one(
        "tracking_plans",
        RawPlan::COLUMNS,
        &owner,
        id,
        RawPlan::from_row,
        RawPlan::into_plan,
      )
      .await
  }

  async fn plan_detail(&self, owner: OwnerId, id: Uuid) -> Result<Option<PlanDetail>> {
    let plan = match self.get_plan(owner, id).await? {
      Some(p) => p,
      None    => return Ok(None),
    };

    let plan_id_str = encode_uuid(plan.id);

    // One row per (plan event, property); events without properties appear
    // once with NULL property columns.
    let rows: Vec<(String, bool, RawEvent, Option<(RawProperty, bool)>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             pe.id, pe.additional_properties,
             e.id, e.name, e.event_type, e.description, e.owner_id, e.created_at,
             p.id, p.name, p.property_type, p.description, p.owner_id, p.created_at,
             pep.required
           FROM plan_events pe
           JOIN events e ON e.id = pe.event_id
           LEFT JOIN plan_event_properties pep ON pep.plan_event_id = pe.id
           LEFT JOIN properties p ON p.id = pep.property_id
           WHERE pe.tracking_plan_id = ?1
           ORDER BY pe.rowid, pep.rowid",
        )?;
        let rows = stmt
          .query_map(params![plan_id_str], |row| {
            let property_id: Option<String> = row.get(8)?;
            let property = match property_id {
              Some(_) => Some((RawProperty::from_row_at(row, 8)?, row.get::<_, bool>(14)?)),
              None    => None,
            };
            Ok((
              row.get::<_, String>(0)?,
              row.get::<_, bool>(1)?,
              RawEvent::from_row_at(row, 2)?,
              property,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut events: Vec<PlanEventView> = Vec::new();
    for (plan_event_id, additional_properties, raw_event, property) in rows {
      let plan_event_id = decode_uuid(&plan_event_id)?;
      if events.last().is_none_or(|v| v.plan_event_id != plan_event_id) {
        events.push(PlanEventView {
          plan_event_id,
          event: raw_event.into_event()?,
          additional_properties,
          properties: Vec::new(),
        });
      }
      if let (Some((raw_property, required)), Some(view)) = (property, events.last_mut()) {
        view.properties.push(PlanPropertyView {
          property: raw_property.into_property()?,
          required,
        });
      }
    }

    Ok(Some(PlanDetail { plan, events }))
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn list_events(&self, owner: OwnerId, name: Option<String>) -> Result<Vec<Event>> {
    self
      .fetch_all(
        "events",
        RawEvent::COLUMNS,
        &owner,
        name,
        RawEvent::from_row,
        RawEvent::into_event,
      )
      .await
  }

  async fn get_event(&self, owner: OwnerId, id: Uuid) -> Result<Option<Event>> {
    self
      .fetch_one(
        "events",
        RawEvent::COLUMNS,
        &owner,
        id,
        RawEvent::from_row,
        RawEvent::into_event,
      )
      .await
  }

  async fn update_event_description(
    &self,
    owner:       OwnerId,
    id:          Uuid,
    description: String,
  ) -> Result<Option<Event>> {
    if !self.set_description("events", &owner, id, description).await? {
      return Ok(None);
    }
    self.get_event(owner, id).await
  }

  // ── Properties ────────────────────────────────────────────────────────────

  async fn list_properties(
    &self,
    owner: OwnerId,
    name:  Option<String>,
  ) -> Result<Vec<Property>> {
    self
      .fetch_all(
        "properties",
        RawProperty::COLUMNS,
        &owner,
        name,
        RawProperty::from_row,
        RawProperty::into_property,
      )
      .await
  }

  async fn get_property(&self, owner: OwnerId, id: Uuid) -> Result<Option<Property>> {
    self
      .fetch_one(
        "properties",
        RawProperty::COLUMNS,
        &owner,
        id,
        RawProperty::from_row,
        RawProperty::into_property,
      )
      .await
  }

  async fn update_property_description(
    &self,
    owner:       OwnerId,
    id:          Uuid,
    description: String,
  ) -> Result<Option<Property>> {
    if !self.set_description("properties", &owner, id, description).await? {
      return Ok(None);
    }
    self.get_property(owner, id).await
  }
}
