mod schema;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::events::{EventBus, LiftEvent};
use crate::models::*;
use crate::progression;

const LIFT_COLUMNS: &str = "id, name, equipment, weight_min, weight_max, weight_step,
    top_set_progression, previous_lift_id, created_at, updated_at";

const SET_COLUMNS: &str =
    "lift_id, set_index, target_min_reps, target_max_reps, target_weight, reps, weight";

/// SQLite-backed lift store.
///
/// All access goes through one connection behind a mutex. Appending a set reads
/// the current set count and inserts inside a single transaction while holding
/// that lock, so concurrent appends to the same lift always get distinct
/// indexes. Every save and removal is published on the store's [`EventBus`]
/// after commit and before the lock is released, so events arrive in commit order.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    events: EventBus,
}

impl Database {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            events: EventBus::default(),
        }
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.lock();
        schema::run_migrations(&conn)
    }

    /// Receive lift events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LiftEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    // ============================================================
    // Lift operations
    // ============================================================

    pub fn get_all_lifts(&self) -> Result<Vec<Lift>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM lifts ORDER BY name, created_at",
            LIFT_COLUMNS
        ))?;
        let mut lifts = stmt
            .query_map([], row_to_lift)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM lift_sets ORDER BY lift_id, set_index",
            SET_COLUMNS
        ))?;
        let mut sets_by_lift: HashMap<Uuid, Vec<LiftSet>> = HashMap::new();
        for set in stmt.query_map([], row_to_set)? {
            let set = set?;
            sets_by_lift.entry(set.lift_id).or_default().push(set);
        }

        for lift in &mut lifts {
            lift.sets = sets_by_lift.remove(&lift.id).unwrap_or_default();
        }

        Ok(lifts)
    }

    pub fn get_lift(&self, id: Uuid) -> Result<Option<Lift>> {
        let conn = self.lock();
        query_lift(&conn, id)
    }

    /// Create a lift and its initial sets. Names must be unique among lifts
    /// created this way.
    pub fn create_lift(&self, input: CreateLiftInput) -> Result<Lift> {
        let input = input.prepare()?;

        let lift = {
            let mut conn = self.lock();
            let tx = conn.transaction()?;
            ensure_unique_name(&tx, &input.name, None)?;
            let lift = insert_lift(&tx, input, None)?;
            tx.commit()?;
            self.events.emit(LiftEvent::Saved(lift.clone()));
            lift
        };

        tracing::info!(lift_id = %lift.id, name = %lift.name, sets = lift.sets.len(), "Created lift");
        Ok(lift)
    }

    pub fn update_lift(&self, id: Uuid, input: UpdateLiftInput) -> Result<Option<Lift>> {
        let lift = {
            let mut conn = self.lock();
            let tx = conn.transaction()?;
            let Some(mut lift) = query_lift(&tx, id)? else {
                return Ok(None);
            };

            lift.apply_update(input)?;
            if lift.previous_lift_id.is_none() {
                ensure_unique_name(&tx, &lift.name, Some(id))?;
            }
            lift.updated_at = Utc::now();

            tx.execute(
                "UPDATE lifts SET name = ?, equipment = ?, weight_min = ?, weight_max = ?,
                 weight_step = ?, top_set_progression = ?, updated_at = ? WHERE id = ?",
                (
                    &lift.name,
                    lift.equipment.map(|e| e.as_str()),
                    lift.weight_min,
                    lift.weight_max,
                    lift.weight_step,
                    progression_json(lift.top_set_progression.as_ref())?,
                    lift.updated_at.to_rfc3339(),
                    id.to_string(),
                ),
            )?;
            tx.commit()?;
            self.events.emit(LiftEvent::Saved(lift.clone()));
            lift
        };

        tracing::info!(lift_id = %lift.id, name = %lift.name, "Updated lift");
        Ok(Some(lift))
    }

    pub fn delete_lift(&self, id: Uuid) -> Result<bool> {
        let removed = {
            let mut conn = self.lock();
            let tx = conn.transaction()?;
            let Some(lift) = query_lift(&tx, id)? else {
                return Ok(false);
            };
            tx.execute("DELETE FROM lift_sets WHERE lift_id = ?", [id.to_string()])?;
            tx.execute("DELETE FROM lifts WHERE id = ?", [id.to_string()])?;
            tx.commit()?;
            self.events.emit(LiftEvent::Removed(lift.clone()));
            lift
        };

        tracing::info!(lift_id = %id, name = %removed.name, "Deleted lift");
        Ok(true)
    }

    /// Remove every lift and set. Used when seeding; emits no events.
    pub fn delete_all_lifts(&self) -> Result<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM lift_sets", [])?;
        let rows = tx.execute("DELETE FROM lifts", [])?;
        tx.commit()?;
        Ok(rows)
    }

    /// The chain of lifts that led to `id`, oldest first, ending with `id` itself.
    pub fn get_lift_history(&self, id: Uuid) -> Result<Option<Vec<Lift>>> {
        let conn = self.lock();
        let Some(lift) = query_lift(&conn, id)? else {
            return Ok(None);
        };

        let mut seen = HashSet::from([lift.id]);
        let mut previous = lift.previous_lift_id;
        let mut chain = vec![lift];
        while let Some(prev_id) = previous {
            if !seen.insert(prev_id) {
                break;
            }
            // The source may have been deleted since.
            let Some(prev) = query_lift(&conn, prev_id)? else {
                break;
            };
            previous = prev.previous_lift_id;
            chain.push(prev);
        }

        chain.reverse();
        Ok(Some(chain))
    }

    // ============================================================
    // Set operations
    // ============================================================

    /// Append a set to a lift. The set's index is the lift's current set count.
    pub fn add_set(&self, lift_id: Uuid, input: CreateSetInput) -> Result<LiftSet> {
        input.validate()?;

        let set = {
            let mut conn = self.lock();
            let tx = conn.transaction()?;
            if !lift_exists(&tx, lift_id)? {
                return Err(Error::lift_not_found(lift_id));
            }

            let set_index: u32 = tx.query_row(
                "SELECT COUNT(*) FROM lift_sets WHERE lift_id = ?",
                [lift_id.to_string()],
                |row| row.get(0),
            )?;
            let set = insert_set(&tx, lift_id, set_index, input)?;
            touch_lift(&tx, lift_id, Utc::now())?;

            let lift = query_lift(&tx, lift_id)?.ok_or_else(|| Error::lift_not_found(lift_id))?;
            tx.commit()?;
            self.events.emit(LiftEvent::Saved(lift));
            set
        };

        tracing::debug!(lift_id = %lift_id, set_index = set.set_index, "Added set");
        Ok(set)
    }

    /// Record the reps and weight actually performed for an existing set.
    /// Fields left empty keep their current value.
    pub fn record_set(
        &self,
        lift_id: Uuid,
        set_index: u32,
        input: RecordSetInput,
    ) -> Result<LiftSet> {
        input.validate()?;

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        if !lift_exists(&tx, lift_id)? {
            return Err(Error::lift_not_found(lift_id));
        }

        let rows = tx.execute(
            "UPDATE lift_sets SET reps = COALESCE(?, reps), weight = COALESCE(?, weight)
             WHERE lift_id = ? AND set_index = ?",
            (input.reps, input.weight, lift_id.to_string(), set_index),
        )?;
        if rows == 0 {
            return Err(Error::NotFound(format!(
                "set {} of lift {}",
                set_index, lift_id
            )));
        }
        touch_lift(&tx, lift_id, Utc::now())?;

        let lift = query_lift(&tx, lift_id)?.ok_or_else(|| Error::lift_not_found(lift_id))?;
        let set = lift
            .sets
            .iter()
            .find(|s| s.set_index == set_index)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("set {} of lift {}", set_index, lift_id)))?;
        tx.commit()?;

        self.events.emit(LiftEvent::Saved(lift));
        Ok(set)
    }

    // ============================================================
    // Top-set progression
    // ============================================================

    /// Create the lift that follows `last_id` in its top-set progression.
    ///
    /// The new lift and all of its sets are written in one transaction, so a
    /// failure leaves nothing behind.
    pub fn create_next_top_set_lift(&self, last_id: Uuid) -> Result<Lift> {
        let lift = {
            let mut conn = self.lock();
            let tx = conn.transaction()?;
            let last = query_lift(&tx, last_id)?.ok_or_else(|| Error::lift_not_found(last_id))?;
            let input = progression::generate_next_lift(&last)?.prepare()?;
            let lift = insert_lift(&tx, input, Some(last.id))?;
            tx.commit()?;
            self.events.emit(LiftEvent::Saved(lift.clone()));
            lift
        };

        tracing::info!(
            lift_id = %lift.id,
            previous_lift_id = %last_id,
            name = %lift.name,
            sets = lift.sets.len(),
            "Created next top-set lift"
        );
        Ok(lift)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            events: self.events.clone(),
        }
    }
}

fn default_path() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "liftlog")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("liftlog.db"))
}

fn query_lift(conn: &Connection, id: Uuid) -> Result<Option<Lift>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM lifts WHERE id = ?", LIFT_COLUMNS))?;
    let mut rows = stmt.query([id.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let mut lift = row_to_lift(row)?;
    lift.sets = query_sets(conn, id)?;
    Ok(Some(lift))
}

fn query_sets(conn: &Connection, lift_id: Uuid) -> Result<Vec<LiftSet>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM lift_sets WHERE lift_id = ? ORDER BY set_index",
        SET_COLUMNS
    ))?;
    let sets = stmt
        .query_map([lift_id.to_string()], row_to_set)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sets)
}

fn lift_exists(conn: &Connection, id: Uuid) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM lifts WHERE id = ?)",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn ensure_unique_name(conn: &Connection, name: &str, exclude: Option<Uuid>) -> Result<()> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM lifts
         WHERE name = ? AND previous_lift_id IS NULL AND id != ?)",
        (name, exclude.map(|id| id.to_string()).unwrap_or_default()),
        |row| row.get(0),
    )?;
    if taken {
        return Err(Error::DuplicateName(name.to_string()));
    }
    Ok(())
}

fn insert_lift(conn: &Connection, input: CreateLiftInput, previous: Option<Uuid>) -> Result<Lift> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    conn.execute(
        &format!(
            "INSERT INTO lifts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            LIFT_COLUMNS
        ),
        (
            id.to_string(),
            &input.name,
            input.equipment.map(|e| e.as_str()),
            input.weight_min,
            input.weight_max,
            input.weight_step,
            progression_json(input.top_set_progression.as_ref())?,
            previous.map(|p| p.to_string()),
            now.to_rfc3339(),
            now.to_rfc3339(),
        ),
    )?;

    let sets = input
        .sets
        .into_iter()
        .enumerate()
        .map(|(index, set)| {
            set.validate()?;
            insert_set(conn, id, index as u32, set)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Lift {
        id,
        name: input.name,
        equipment: input.equipment,
        weight_min: input.weight_min,
        weight_max: input.weight_max,
        weight_step: input.weight_step,
        top_set_progression: input.top_set_progression,
        previous_lift_id: previous,
        sets,
        created_at: now,
        updated_at: now,
    })
}

fn insert_set(
    conn: &Connection,
    lift_id: Uuid,
    set_index: u32,
    input: CreateSetInput,
) -> Result<LiftSet> {
    conn.execute(
        &format!(
            "INSERT INTO lift_sets ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
            SET_COLUMNS
        ),
        (
            lift_id.to_string(),
            set_index,
            input.target_min_reps,
            input.target_max_reps,
            input.target_weight,
            input.reps,
            input.weight,
        ),
    )?;

    Ok(LiftSet {
        lift_id,
        set_index,
        target_min_reps: input.target_min_reps,
        target_max_reps: input.target_max_reps,
        target_weight: input.target_weight,
        reps: input.reps,
        weight: input.weight,
    })
}

fn touch_lift(conn: &Connection, id: Uuid, now: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "UPDATE lifts SET updated_at = ? WHERE id = ?",
        (now.to_rfc3339(), id.to_string()),
    )?;
    Ok(())
}

fn progression_json(progression: Option<&TopSetProgression>) -> Result<Option<String>> {
    Ok(progression.map(serde_json::to_string).transpose()?)
}

fn row_to_lift(row: &Row<'_>) -> rusqlite::Result<Lift> {
    Ok(Lift {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        equipment: row
            .get::<_, Option<String>>(2)?
            .and_then(|s| EquipmentKind::from_str(&s)),
        weight_min: row.get(3)?,
        weight_max: row.get(4)?,
        weight_step: row.get(5)?,
        top_set_progression: row
            .get::<_, Option<String>>(6)?
            .and_then(|json| serde_json::from_str(&json).ok()),
        previous_lift_id: row.get::<_, Option<String>>(7)?.map(parse_uuid),
        sets: Vec::new(),
        created_at: parse_datetime(row.get::<_, String>(8)?),
        updated_at: parse_datetime(row.get::<_, String>(9)?),
    })
}

fn row_to_set(row: &Row<'_>) -> rusqlite::Result<LiftSet> {
    Ok(LiftSet {
        lift_id: parse_uuid(row.get::<_, String>(0)?),
        set_index: row.get(1)?,
        target_min_reps: row.get(2)?,
        target_max_reps: row.get(3)?,
        target_weight: row.get(4)?,
        reps: row.get(5)?,
        weight: row.get(6)?,
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
