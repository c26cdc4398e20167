use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Row, ToSql};

use crate::db::{
    helpers::{format_optional_datetime, parse_optional_datetime, parse_segment_kind, placeholders},
    models::{SegmentPatch, SegmentRecord},
    store::{SegmentSnapshot, SegmentStore},
    Database,
};
use crate::log_warn;

const ENABLE_LOGS: bool = true;

const SELECT_COLUMNS: &str = "id, person_id, name, flight_number, departure_time, type,
    checked_in, checked_out, check_in_time, check_out_time, overnight_hotel,
    photo_url, notes, held, hold_time, is_being_transported, transport_time";

/// A timestamp that does not parse is dropped; the rest of the row survives.
fn timestamp_or_none(row: &Row, id: &str, column: &str) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    match parse_optional_datetime(raw, column) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            log_warn!("Segment {id}: ignoring unreadable {column}: {err:#}");
            Ok(None)
        }
    }
}

fn row_to_record(row: &Row) -> Result<SegmentRecord> {
    let id: String = row.get("id")?;
    let decode = || -> Result<SegmentRecord> {
        let kind: String = row.get("type")?;

        Ok(SegmentRecord {
            id: id.clone(),
            person_id: row.get("person_id")?,
            name: row.get("name")?,
            flight_label: row.get("flight_number")?,
            time_label: row.get("departure_time")?,
            kind: parse_segment_kind(&kind)?,
            checked_in: row.get("checked_in")?,
            checked_out: row.get("checked_out")?,
            check_in_time: timestamp_or_none(row, &id, "check_in_time")?,
            check_out_time: timestamp_or_none(row, &id, "check_out_time")?,
            overnight_hotel: row.get("overnight_hotel")?,
            photo_url: row.get("photo_url")?,
            notes: row.get("notes")?,
            held: row.get("held")?,
            hold_time: timestamp_or_none(row, &id, "hold_time")?,
            is_being_transported: row.get("is_being_transported")?,
            transport_time: timestamp_or_none(row, &id, "transport_time")?,
        })
    };

    decode().with_context(|| format!("segment {id}"))
}

/// `SET` fragments and their bound values for a patch.
fn patch_assignments(patch: &SegmentPatch) -> (Vec<String>, Vec<Box<dyn ToSql>>) {
    let mut assignments = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    for (group, change) in patch.flag_changes() {
        let (flag_column, time_column) = group.columns();
        assignments.push(format!("{flag_column} = ?"));
        values.push(Box::new(change.flag()));
        assignments.push(format!("{time_column} = ?"));
        values.push(Box::new(format_optional_datetime(change.timestamp())));
    }
    if let Some(overnight_hotel) = patch.overnight_hotel {
        assignments.push("overnight_hotel = ?".to_string());
        values.push(Box::new(overnight_hotel));
    }
    if let Some(photo_url) = &patch.photo_url {
        assignments.push("photo_url = ?".to_string());
        values.push(Box::new(photo_url.clone()));
    }
    if let Some(notes) = &patch.notes {
        assignments.push("notes = ?".to_string());
        values.push(Box::new(notes.clone()));
    }

    (assignments, values)
}

impl SegmentStore for Database {
    async fn list_all_segments(&self) -> Result<SegmentSnapshot> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM travelers ORDER BY rowid ASC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut snapshot = SegmentSnapshot::default();
            while let Some(row) = rows.next()? {
                match row_to_record(row) {
                    Ok(record) => snapshot.records.push(record),
                    Err(err) => {
                        log_warn!("Skipping unreadable row: {err:#}");
                        snapshot.unreadable += 1;
                    }
                }
            }

            Ok(snapshot)
        })
        .await
    }

    async fn insert_segments(&self, records: &[SegmentRecord]) -> Result<()> {
        let records = records.to_vec();
        self.execute(move |conn| {
            let created_at = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;

            for record in &records {
                tx.execute(
                    "INSERT INTO travelers (
                        id,
                        person_id,
                        name,
                        flight_number,
                        departure_time,
                        type,
                        checked_in,
                        checked_out,
                        check_in_time,
                        check_out_time,
                        overnight_hotel,
                        photo_url,
                        notes,
                        held,
                        hold_time,
                        is_being_transported,
                        transport_time,
                        created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                    params![
                        record.id,
                        record.person_id,
                        record.name,
                        record.flight_label,
                        record.time_label,
                        record.kind.as_str(),
                        record.checked_in,
                        record.checked_out,
                        format_optional_datetime(record.check_in_time),
                        format_optional_datetime(record.check_out_time),
                        record.overnight_hotel,
                        record.photo_url,
                        record.notes,
                        record.held,
                        format_optional_datetime(record.hold_time),
                        record.is_being_transported,
                        format_optional_datetime(record.transport_time),
                        created_at,
                    ],
                )
                .with_context(|| format!("failed to insert segment {}", record.id))?;
            }

            tx.commit().context("failed to commit segment insert")?;
            Ok(())
        })
        .await
    }

    async fn update_segment_fields(&self, id: &str, patch: &SegmentPatch) -> Result<usize> {
        let id = id.to_string();
        let patch = patch.clone();
        self.execute(move |conn| {
            let (assignments, mut values) = patch_assignments(&patch);
            if assignments.is_empty() {
                bail!("No fields to update");
            }

            let query = format!(
                "UPDATE travelers SET {} WHERE id = ?",
                assignments.join(", ")
            );
            values.push(Box::new(id));

            let params_refs: Vec<&dyn ToSql> = values.iter().map(|b| b.as_ref()).collect();
            let rows_affected = conn
                .execute(&query, params_refs.as_slice())
                .context("failed to update segment")?;

            Ok(rows_affected)
        })
        .await
    }

    async fn update_segments_by_person_keys(
        &self,
        person_keys: &[String],
        patch: &SegmentPatch,
    ) -> Result<usize> {
        if person_keys.is_empty() {
            return Ok(0);
        }

        let person_keys = person_keys.to_vec();
        let patch = patch.clone();
        self.execute(move |conn| {
            let (assignments, mut values) = patch_assignments(&patch);
            if assignments.is_empty() {
                bail!("No fields to update");
            }

            let query = format!(
                "UPDATE travelers SET {} WHERE person_id IN ({})",
                assignments.join(", "),
                placeholders(person_keys.len())
            );
            for key in person_keys {
                values.push(Box::new(key));
            }

            let params_refs: Vec<&dyn ToSql> = values.iter().map(|b| b.as_ref()).collect();
            let rows_affected = conn
                .execute(&query, params_refs.as_slice())
                .context("failed to update person segments")?;

            Ok(rows_affected)
        })
        .await
    }

    async fn delete_segments_by_person_keys(&self, person_keys: &[String]) -> Result<usize> {
        if person_keys.is_empty() {
            return Ok(0);
        }

        let person_keys = person_keys.to_vec();
        self.execute(move |conn| {
            let query = format!(
                "DELETE FROM travelers WHERE person_id IN ({})",
                placeholders(person_keys.len())
            );
            let rows_affected = conn
                .execute(&query, params_from_iter(person_keys.iter()))
                .context("failed to delete person segments")?;

            Ok(rows_affected)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;
    use crate::db::models::{FlagGroup, SegmentKind};

    fn open() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("travelers.sqlite3")).unwrap();
        (dir, db)
    }

    fn pair(key: &str, name: &str) -> Vec<SegmentRecord> {
        vec![
            SegmentRecord::new(format!("{key}-a"), name, SegmentKind::Arrival, "AL66", "2024-08-10")
                .with_person_id(key),
            SegmentRecord::new(format!("{key}-d"), name, SegmentKind::Departure, "CA21", "2024-08-11")
                .with_person_id(key),
        ]
    }

    #[tokio::test]
    async fn insert_then_list_preserves_order_and_absent_columns() {
        let (_dir, db) = open();
        db.insert_segments(&pair("person-ana-lee", "Ana Lee")).await.unwrap();
        db.insert_segments(&pair("person-bo-chen", "Bo Chen")).await.unwrap();

        let records = db.list_all_segments().await.unwrap().records;
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["person-ana-lee-a", "person-ana-lee-d", "person-bo-chen-a", "person-bo-chen-d"]
        );
        assert_eq!(records[0].checked_in, None);
        assert_eq!(records[1].kind, SegmentKind::Departure);
    }

    #[tokio::test]
    async fn flag_update_writes_flag_and_timestamp_together() {
        let (_dir, db) = open();
        db.insert_segments(&pair("person-ana-lee", "Ana Lee")).await.unwrap();
        let at = Utc.with_ymd_and_hms(2024, 8, 10, 9, 15, 0).unwrap();

        let rows = db
            .update_segment_fields("person-ana-lee-a", &SegmentPatch::activate(FlagGroup::CheckIn, at))
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let records = db.list_all_segments().await.unwrap().records;
        assert_eq!(records[0].checked_in, Some(true));
        assert_eq!(records[0].check_in_time, Some(at));

        db.update_segment_fields("person-ana-lee-a", &SegmentPatch::deactivate(FlagGroup::CheckIn))
            .await
            .unwrap();
        let records = db.list_all_segments().await.unwrap().records;
        assert_eq!(records[0].checked_in, Some(false));
        assert_eq!(records[0].check_in_time, None);
    }

    #[tokio::test]
    async fn update_of_unknown_id_touches_nothing() {
        let (_dir, db) = open();
        let rows = db
            .update_segment_fields("missing", &SegmentPatch::deactivate(FlagGroup::Hold))
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let (_dir, db) = open();
        assert!(db
            .update_segment_fields("any", &SegmentPatch::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn person_level_update_and_delete_match_any_listed_key() {
        let (_dir, db) = open();
        db.insert_segments(&pair("jane-doe", "Jane Doe")).await.unwrap();
        db.insert_segments(&pair("person-bo-chen", "Bo Chen")).await.unwrap();

        let keys = vec!["person-jane-doe".to_string(), "jane-doe".to_string()];
        let rows = db
            .update_segments_by_person_keys(&keys, &SegmentPatch::photo("http://x/y.jpg"))
            .await
            .unwrap();
        assert_eq!(rows, 2);

        let records = db.list_all_segments().await.unwrap().records;
        assert!(records[..2].iter().all(|r| r.photo_url.as_deref() == Some("http://x/y.jpg")));
        assert!(records[2..].iter().all(|r| r.photo_url.is_none()));

        assert_eq!(db.delete_segments_by_person_keys(&keys).await.unwrap(), 2);
        assert_eq!(db.list_all_segments().await.unwrap().records.len(), 2);
        assert_eq!(db.delete_segments_by_person_keys(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_rows_do_not_sink_the_scan() {
        let (_dir, db) = open();
        db.insert_segments(&pair("person-ana-lee", "Ana Lee")).await.unwrap();
        db.insert_segments(&pair("person-bo-chen", "Bo Chen")).await.unwrap();
        db.execute(|conn| {
            conn.execute(
                "UPDATE travelers SET checked_in = 1, check_in_time = '2024-08-10 09:00:00+00'
                 WHERE id = 'person-ana-lee-a'",
                [],
            )?;
            conn.execute(
                "UPDATE travelers SET checked_out = 'yes' WHERE id = 'person-bo-chen-d'",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let snapshot = db.list_all_segments().await.unwrap();
        assert_eq!(snapshot.unreadable, 1);
        let ids: Vec<_> = snapshot.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["person-ana-lee-a", "person-ana-lee-d", "person-bo-chen-a"]);
        assert_eq!(snapshot.records[0].checked_in, Some(true));
        assert_eq!(snapshot.records[0].check_in_time, None);
    }

    #[tokio::test]
    async fn duplicate_insert_rolls_back_the_batch() {
        let (_dir, db) = open();
        let mut records = pair("person-ana-lee", "Ana Lee");
        records.push(records[0].clone());

        assert!(db.insert_segments(&records).await.is_err());
        assert!(db.list_all_segments().await.unwrap().records.is_empty());
    }
}
