//! [`SqliteStore`] — the SQLite implementation of [`CaseStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use expediente_core::{
  attention::{Attention, AttentionType, NewAttention},
  form::{FormInstance, FormPayload, FormType, FormWrite, NewFormInstance},
  store::CaseStore,
  subject::{NewSubject, Subject},
};

use crate::{
  Error, Result,
  encode::{
    FORM_COLUMNS, RawAttention, RawAttentionType, RawFormInstance, RawSubject,
    SUBJECT_COLUMNS, encode_date, encode_dt, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A case-file store backed by a single SQLite file.
///
/// Clones share one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory store, used by tests.
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
    Ok(())
  }

  /// Close the underlying connection, flushing pending work.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn get_form(&self, form_id: Uuid) -> Result<Option<FormInstance>> {
    let id_str = encode_uuid(form_id);
    let raw: Option<RawFormInstance> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {FORM_COLUMNS} FROM form_instances WHERE form_id = ?1"),
              rusqlite::params![id_str],
              RawFormInstance::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawFormInstance::into_instance).transpose()
  }

  async fn insert_form(
    &self,
    form:      NewFormInstance,
    attention: Option<NewAttention>,
  ) -> Result<FormInstance> {
    let now = now();
    let encoded = form.payload.encode()?;
    let attention_id = attention.as_ref().map(|_| Uuid::new_v4());

    let instance = FormInstance {
      form_id: Uuid::new_v4(),
      subject_id: form.subject_id,
      form_type: encoded.form_type,
      payload: form.payload,
      created_at: now,
      updated_at: now,
      attention_id,
    };

    let attention_row = match (attention, attention_id) {
      (Some(a), Some(id)) => Some((
        encode_uuid(id),
        encode_uuid(a.subject_id),
        encode_uuid(a.attention_type_id),
        a.professional,
        encode_dt(now),
        a.reason,
        a.status.to_string(),
      )),
      _ => None,
    };

    let form_id_str      = encode_uuid(instance.form_id);
    let subject_id_str   = encode_uuid(instance.subject_id);
    let form_type_str    = encoded.form_type.to_string();
    let schema_version   = encoded.schema_version;
    let payload_json     = encoded.data.to_string();
    let at_str           = encode_dt(now);
    let attention_id_str = attention_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(row) = attention_row {
          tx.execute(
            "INSERT INTO attentions (
               attention_id, subject_id, attention_type_id, professional,
               occurred_at, reason, status
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![row.0, row.1, row.2, row.3, row.4, row.5, row.6],
          )?;
        }
        tx.execute(
          "INSERT INTO form_instances (
             form_id, subject_id, form_type, schema_version, payload_json,
             created_at, updated_at, attention_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7)",
          rusqlite::params![
            form_id_str,
            subject_id_str,
            form_type_str,
            schema_version,
            payload_json,
            at_str,
            attention_id_str,
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(form_id = %instance.form_id, form_type = %instance.form_type, "inserted form instance");
    Ok(instance)
  }

  async fn update_form(
    &self,
    form_id: Uuid,
    payload: FormPayload,
  ) -> Result<FormInstance> {
    let encoded = payload.encode()?;

    let id_str         = encode_uuid(form_id);
    let form_type_str  = encoded.form_type.to_string();
    let schema_version = encoded.schema_version;
    let payload_json   = encoded.data.to_string();
    let at_str         = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE form_instances
              SET schema_version = ?1, payload_json = ?2, updated_at = ?3
            WHERE form_id = ?4 AND form_type = ?5",
          rusqlite::params![schema_version, payload_json, at_str, id_str, form_type_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::FormNotFound(form_id));
    }
    self.get_form(form_id).await?.ok_or(Error::FormNotFound(form_id))
  }
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteStore {
  type Error = Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let subject = Subject {
      subject_id:                 Uuid::new_v4(),
      given_names:                input.given_names,
      surnames:                   input.surnames,
      birth_date:                 input.birth_date,
      birthplace:                 input.birthplace,
      address:                    input.address,
      intake_date:                input.intake_date,
      administrative_case_number: input.administrative_case_number,
      judicial_case_number:       input.judicial_case_number,
      center:                     input.center,
      active:                     input.active,
      created_at:                 now(),
    };

    let s = subject.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (
             subject_id, given_names, surnames, birth_date, birthplace, address,
             intake_date, administrative_case_number, judicial_case_number,
             center, active, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            encode_uuid(s.subject_id),
            s.given_names,
            s.surnames,
            s.birth_date.map(encode_date),
            s.birthplace,
            s.address,
            s.intake_date.map(encode_date),
            s.administrative_case_number,
            s.judicial_case_number,
            s.center,
            s.active,
            encode_dt(s.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
              rusqlite::params![id_str],
              RawSubject::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_active_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects
            WHERE active = 1
            ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  // ── Attention types ───────────────────────────────────────────────────────

  async fn add_attention_type(&self, role: String, name: String) -> Result<AttentionType> {
    let kind = AttentionType { attention_type_id: Uuid::new_v4(), role, name };

    let id_str = encode_uuid(kind.attention_type_id);
    let role   = kind.role.clone();
    let name   = kind.name.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO attention_types (attention_type_id, role, name)
           VALUES (?1, ?2, ?3)
           ON CONFLICT(role) DO NOTHING",
          rusqlite::params![id_str, role, name],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::DuplicateRole(kind.role));
    }
    Ok(kind)
  }

  async fn find_attention_type<'a>(&'a self, role: &'a str) -> Result<Option<AttentionType>> {
    let role = role.to_owned();

    let raw: Option<RawAttentionType> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT attention_type_id, role, name FROM attention_types WHERE role = ?1",
              rusqlite::params![role],
              |row| {
                Ok(RawAttentionType {
                  attention_type_id: row.get(0)?,
                  role:              row.get(1)?,
                  name:              row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAttentionType::into_attention_type).transpose()
  }

  async fn get_attention(&self, id: Uuid) -> Result<Option<Attention>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAttention> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT attention_id, subject_id, attention_type_id, professional,
                      occurred_at, reason, status
                 FROM attentions WHERE attention_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawAttention {
                  attention_id:      row.get(0)?,
                  subject_id:        row.get(1)?,
                  attention_type_id: row.get(2)?,
                  professional:      row.get(3)?,
                  occurred_at:       row.get(4)?,
                  reason:            row.get(5)?,
                  status:            row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAttention::into_attention).transpose()
  }

  // ── Form instances ────────────────────────────────────────────────────────

  async fn latest_form(
    &self,
    subject_id: Uuid,
    form_type:  FormType,
  ) -> Result<Option<FormInstance>> {
    let subject_id_str = encode_uuid(subject_id);
    let form_type_str  = form_type.to_string();

    let raw: Option<RawFormInstance> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {FORM_COLUMNS} FROM form_instances
                  WHERE subject_id = ?1 AND form_type = ?2
                  ORDER BY created_at DESC, rowid DESC
                  LIMIT 1"
              ),
              rusqlite::params![subject_id_str, form_type_str],
              RawFormInstance::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFormInstance::into_instance).transpose()
  }

  async fn list_forms(&self, subject_id: Uuid) -> Result<Vec<FormInstance>> {
    let subject_id_str = encode_uuid(subject_id);

    let raws: Vec<RawFormInstance> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FORM_COLUMNS} FROM form_instances
            WHERE subject_id = ?1
            ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![subject_id_str], RawFormInstance::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFormInstance::into_instance).collect()
  }

  async fn write_form(&self, write: FormWrite) -> Result<FormInstance> {
    match write {
      FormWrite::Insert { form, attention } => self.insert_form(form, attention).await,
      FormWrite::Update { form_id, payload } => self.update_form(form_id, payload).await,
    }
  }
}
