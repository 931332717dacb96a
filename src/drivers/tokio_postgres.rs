use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use super::pg_types::{PgNumeric, PgText, RawValue};
use crate::descriptor::redact;
use crate::error::{PgPatternsError, Result};
use crate::traits::{DatabaseDriver, DriverConnection};
use crate::types::{RawQueryResult, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres.
/// Every `connect` opens a fresh connection; nothing is pooled.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPostgresDriver;

impl TokioPostgresDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    async fn connect(&self, descriptor: &str) -> Result<Box<dyn DriverConnection>> {
        let (client, connection) = tokio_postgres::connect(descriptor, NoTls)
            .await
            .map_err(PgPatternsError::statement)?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("PostgreSQL connection error: {}", e);
            }
        });

        debug!("Opened connection to {}", redact(descriptor));
        Ok(Box::new(TokioPostgresConnection {
            client: Some(client),
        }))
    }
}

/// One open tokio-postgres connection.
pub struct TokioPostgresConnection {
    client: Option<Client>,
}

#[async_trait]
impl DriverConnection for TokioPostgresConnection {
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        let client = self.client.as_ref().ok_or_else(|| {
            PgPatternsError::statement(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "connection already closed",
            ))
        })?;

        let statement = client
            .prepare(sql)
            .await
            .map_err(PgPatternsError::statement)?;

        let converted_params = convert_params(params, statement.params())?;
        let param_refs: Vec<&(dyn ToSql + Sync)> = converted_params
            .iter()
            .map(|b| b.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = client
            .query(&statement, &param_refs)
            .await
            .map_err(PgPatternsError::statement)?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let result_rows = rows
            .iter()
            .map(row_values)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(PgPatternsError::statement)?;

        Ok(RawQueryResult::new(columns, result_rows))
    }

    fn close(&mut self) {
        // Dropping the client ends the connection task once pending requests are flushed.
        if self.client.take().is_some() {
            debug!("Closed connection");
        }
    }
}

impl Drop for TokioPostgresConnection {
    fn drop(&mut self) {
        self.close();
    }
}

type BoxedParam = Box<dyn ToSql + Sync + Send>;

/// Convert bound values to the types the server inferred for each placeholder.
fn convert_params(params: &[SqlValue], types: &[Type]) -> Result<Vec<BoxedParam>> {
    if params.len() != types.len() {
        return Err(PgPatternsError::ParameterCount {
            expected: types.len(),
            actual: params.len(),
        });
    }

    params
        .iter()
        .zip(types)
        .enumerate()
        .map(|(idx, (value, ty))| {
            sql_value_to_tosql(value, ty).map_err(|message| PgPatternsError::InvalidParameter {
                position: idx + 1,
                message,
            })
        })
        .collect()
}

/// Convert a SqlValue to a boxed ToSql trait object matching the parameter type.
/// Numbers are narrowed or widened to fit and text is parsed into the slot's type.
/// Values that cannot be represented keep their own type and are rejected by the driver.
fn sql_value_to_tosql(value: &SqlValue, ty: &Type) -> std::result::Result<BoxedParam, String> {
    let param = match value {
        SqlValue::Null => null_of(ty),
        SqlValue::Bool(b) => boxed(*b),
        SqlValue::Int16(_) | SqlValue::Int32(_) | SqlValue::Int64(_) => {
            integer_to_tosql(value.as_i64().unwrap_or_default(), ty)
        }
        SqlValue::Float32(f) => match *ty {
            Type::FLOAT4 => boxed(*f),
            _ => float_to_tosql(f64::from(*f), ty),
        },
        SqlValue::Float64(f) => float_to_tosql(*f, ty),
        SqlValue::Numeric(n) => match *ty {
            Type::NUMERIC => boxed(PgNumeric::parse(n).map_err(|e| e.to_string())?),
            _ => text_to_tosql(n, ty)?,
        },
        SqlValue::Text(s) => text_to_tosql(s, ty)?,
        SqlValue::Bytes(b) => boxed(b.clone()),
        SqlValue::Timestamp(t) => match *ty {
            Type::TIMESTAMPTZ => boxed(Utc.from_utc_datetime(t)),
            Type::DATE => boxed(t.date()),
            _ => boxed(*t),
        },
        SqlValue::TimestampTz(t) => match *ty {
            Type::TIMESTAMP => boxed(t.naive_utc()),
            _ => boxed(*t),
        },
        SqlValue::Date(d) => match *ty {
            Type::TIMESTAMP => d.and_hms_opt(0, 0, 0).map_or_else(|| boxed(*d), boxed),
            _ => boxed(*d),
        },
        SqlValue::Time(t) => boxed(*t),
        SqlValue::Uuid(u) => boxed(*u),
        SqlValue::Json(j) => boxed(j.clone()),
        SqlValue::Other { bytes, .. } => boxed(RawValue(bytes.clone())),
    };
    Ok(param)
}

fn integer_to_tosql(i: i64, ty: &Type) -> BoxedParam {
    match *ty {
        Type::INT2 => i16::try_from(i).map_or_else(|_| boxed(i), boxed),
        Type::INT4 => i32::try_from(i).map_or_else(|_| boxed(i), boxed),
        Type::OID => u32::try_from(i).map_or_else(|_| boxed(i), boxed),
        Type::FLOAT4 => boxed(i as f32),
        Type::FLOAT8 => boxed(i as f64),
        Type::NUMERIC => boxed(PgNumeric::from_i64(i)),
        _ => boxed(i),
    }
}

fn float_to_tosql(f: f64, ty: &Type) -> BoxedParam {
    match *ty {
        Type::FLOAT4 => boxed(f as f32),
        Type::NUMERIC => boxed(PgNumeric::from_f64(f)),
        _ => boxed(f),
    }
}

/// Parse text into the slot's type, the way the server would parse an untyped literal.
fn text_to_tosql(text: &str, ty: &Type) -> std::result::Result<BoxedParam, String> {
    let param = match *ty {
        Type::BOOL => boxed(parse_bool(text)?),
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
            let i = text
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid integer {text:?}: {e}"))?;
            integer_to_tosql(i, ty)
        }
        Type::FLOAT4 | Type::FLOAT8 => {
            let f = text
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid float {text:?}: {e}"))?;
            float_to_tosql(f, ty)
        }
        Type::NUMERIC => boxed(PgNumeric::parse(text).map_err(|e| e.to_string())?),
        Type::TIMESTAMP => boxed(parse_timestamp(text)?),
        Type::TIMESTAMPTZ => boxed(parse_timestamptz(text)?),
        Type::DATE => boxed(
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .map_err(|e| format!("invalid date {text:?}: {e}"))?,
        ),
        Type::TIME => boxed(parse_time(text)?),
        Type::UUID => boxed(
            Uuid::parse_str(text.trim()).map_err(|e| format!("invalid uuid {text:?}: {e}"))?,
        ),
        Type::JSON | Type::JSONB => boxed(
            serde_json::from_str::<serde_json::Value>(text)
                .map_err(|e| format!("invalid json: {e}"))?,
        ),
        Type::BYTEA => boxed(text.as_bytes().to_vec()),
        _ if PgText::is_text_like(ty) => boxed(PgText(text.to_string())),
        _ => boxed(text.to_string()),
    };
    Ok(param)
}

fn parse_bool(text: &str) -> std::result::Result<bool, String> {
    match text.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Ok(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Ok(false),
        _ => Err(format!("invalid boolean {text:?}")),
    }
}

fn parse_timestamp(text: &str) -> std::result::Result<NaiveDateTime, String> {
    const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    let text = text.trim();
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("invalid timestamp {text:?}"))
}

/// Timestamps with an offset are converted to UTC; without one they are taken as UTC.
fn parse_timestamptz(text: &str) -> std::result::Result<DateTime<Utc>, String> {
    let trimmed = text.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map(|at| at.with_timezone(&Utc))
        .or_else(|_| parse_timestamp(trimmed).map(|naive| Utc.from_utc_datetime(&naive)))
        .map_err(|_| format!("invalid timestamp with time zone {text:?}"))
}

fn parse_time(text: &str) -> std::result::Result<NaiveTime, String> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|e| format!("invalid time {text:?}: {e}"))
}

fn boxed<T: ToSql + Sync + Send + 'static>(value: T) -> BoxedParam {
    Box::new(value)
}

fn null_of(ty: &Type) -> BoxedParam {
    match *ty {
        Type::BOOL => boxed(None::<bool>),
        Type::INT2 => boxed(None::<i16>),
        Type::INT4 => boxed(None::<i32>),
        Type::INT8 => boxed(None::<i64>),
        Type::OID => boxed(None::<u32>),
        Type::FLOAT4 => boxed(None::<f32>),
        Type::FLOAT8 => boxed(None::<f64>),
        Type::NUMERIC => boxed(None::<PgNumeric>),
        Type::BYTEA => boxed(None::<Vec<u8>>),
        Type::TIMESTAMP => boxed(None::<NaiveDateTime>),
        Type::TIMESTAMPTZ => boxed(None::<DateTime<Utc>>),
        Type::DATE => boxed(None::<NaiveDate>),
        Type::TIME => boxed(None::<NaiveTime>),
        Type::UUID => boxed(None::<Uuid>),
        Type::JSON | Type::JSONB => boxed(None::<serde_json::Value>),
        _ if PgText::is_text_like(ty) => boxed(None::<PgText>),
        _ => boxed(None::<RawValue>),
    }
}

/// Convert every column of a row according to its declared type.
fn row_values(row: &Row) -> std::result::Result<Vec<SqlValue>, tokio_postgres::Error> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| column_value(row, idx, col.type_()))
        .collect()
}

/// Types without a dedicated variant come back as `SqlValue::Other` in binary form.
fn column_value(
    row: &Row,
    idx: usize,
    ty: &Type,
) -> std::result::Result<SqlValue, tokio_postgres::Error> {
    let value: SqlValue = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.into(),
        Type::CHAR => row.try_get::<_, Option<i8>>(idx)?.map(i16::from).into(),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.into(),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.into(),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.into(),
        Type::OID => row.try_get::<_, Option<u32>>(idx)?.map(i64::from).into(),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.into(),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.into(),
        Type::NUMERIC => row
            .try_get::<_, Option<PgNumeric>>(idx)?
            .map_or(SqlValue::Null, |n| SqlValue::Numeric(n.0)),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.into(),
        Type::TIMESTAMP => row.try_get::<_, Option<NaiveDateTime>>(idx)?.into(),
        Type::TIMESTAMPTZ => row.try_get::<_, Option<DateTime<Utc>>>(idx)?.into(),
        Type::DATE => row.try_get::<_, Option<NaiveDate>>(idx)?.into(),
        Type::TIME => row.try_get::<_, Option<NaiveTime>>(idx)?.into(),
        Type::UUID => row.try_get::<_, Option<Uuid>>(idx)?.into(),
        Type::JSON | Type::JSONB => row.try_get::<_, Option<serde_json::Value>>(idx)?.into(),
        _ if PgText::is_text_like(ty) => row
            .try_get::<_, Option<PgText>>(idx)?
            .map_or(SqlValue::Null, |t| SqlValue::Text(t.0)),
        _ => row
            .try_get::<_, Option<RawValue>>(idx)?
            .map_or(SqlValue::Null, |raw| SqlValue::Other {
                type_name: ty.name().to_string(),
                bytes: raw.0,
            }),
    };
    Ok(value)
}
