use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use super::{ExportError, Exporter};
use crate::dns::{QueryRecord, Record, ResponseRecord};

/// Consecutive write failures tolerated before the store is declared
/// unavailable. Sustained storage failure ends the process instead of
/// buffering records without bound.
const FAILURE_THRESHOLD: u32 = 5;

const CREATE_QUERY_LOGS: &str = "\
CREATE TABLE IF NOT EXISTS query_logs (
    received_at   TIMESTAMPTZ NOT NULL,
    src_ip        TEXT NOT NULL,
    dst_ip        TEXT NOT NULL,
    src_port      INTEGER NOT NULL,
    dst_port      INTEGER NOT NULL,
    tcp_transport BOOLEAN NOT NULL,
    query_string  TEXT NOT NULL,
    query_type    TEXT NOT NULL
)";

const CREATE_RESPONSE_LOGS: &str = "\
CREATE TABLE IF NOT EXISTS response_logs (
    received_at   TIMESTAMPTZ NOT NULL,
    src_ip        TEXT NOT NULL,
    dst_ip        TEXT NOT NULL,
    src_port      INTEGER NOT NULL,
    dst_port      INTEGER NOT NULL,
    tcp_transport BOOLEAN NOT NULL,
    query_string  TEXT NOT NULL,
    query_type    TEXT NOT NULL,
    answer_ip     TEXT,
    ipv6_ready    BOOLEAN NOT NULL
)";

/// Consecutive-failure accounting for the durable sink. Owned by the sink,
/// reset by any successful write.
#[derive(Debug)]
struct FailureGate {
    consecutive: u32,
    threshold: u32,
}

impl FailureGate {
    fn new(threshold: u32) -> Self {
        Self {
            consecutive: 0,
            threshold,
        }
    }

    fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Returns the length of the failure run once it exceeds the threshold.
    fn record_failure(&mut self) -> Option<u32> {
        self.consecutive += 1;
        (self.consecutive > self.threshold).then_some(self.consecutive)
    }
}

/// Durable sink: one row per record. Failed writes are not retried; the
/// failure gate decides when the store counts as gone for good.
pub struct PostgresExporter {
    pool: PgPool,
    gate: FailureGate,
}

impl PostgresExporter {
    /// Connects and provisions the two record tables. Provisioning is
    /// idempotent; the insert path assumes the tables exist.
    pub async fn connect(addr: &str, user: &str, password: &str, database: &str) -> Result<Self> {
        let (host, port) = match addr.split_once(':') {
            Some((host, port)) => (host, port.parse()?),
            None => (addr, 5432),
        };
        let options = PgConnectOptions::new()
            .host(host)
            .port(port)
            .username(user)
            .password(password)
            .database(database);
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_QUERY_LOGS).execute(&pool).await?;
        sqlx::query(CREATE_RESPONSE_LOGS).execute(&pool).await?;

        Ok(Self {
            pool,
            gate: FailureGate::new(FAILURE_THRESHOLD),
        })
    }

    async fn insert(&self, record: &Record) -> sqlx::Result<()> {
        match record {
            Record::Query(q) => self.insert_query(q).await,
            Record::Response(r) => self.insert_response(r).await,
        }
    }

    async fn insert_query(&self, q: &QueryRecord) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO query_logs \
             (received_at, src_ip, dst_ip, src_port, dst_port, tcp_transport, \
              query_string, query_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(q.meta.timestamp)
        .bind(q.meta.src_ip.to_string())
        .bind(q.meta.dst_ip.to_string())
        .bind(i32::from(q.meta.src_port))
        .bind(i32::from(q.meta.dst_port))
        .bind(q.meta.stream_transport)
        .bind(&q.qname)
        .bind(&q.qtype)
        .execute(&self.pool)
        .await
        .map(|_| ())
    }

    async fn insert_response(&self, r: &ResponseRecord) -> sqlx::Result<()> {
        let q = &r.query;
        sqlx::query(
            "INSERT INTO response_logs \
             (received_at, src_ip, dst_ip, src_port, dst_port, tcp_transport, \
              query_string, query_type, answer_ip, ipv6_ready) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(q.meta.timestamp)
        .bind(q.meta.src_ip.to_string())
        .bind(q.meta.dst_ip.to_string())
        .bind(i32::from(q.meta.src_port))
        .bind(i32::from(q.meta.dst_port))
        .bind(q.meta.stream_transport)
        .bind(&q.qname)
        .bind(&q.qtype)
        .bind(r.answer_ip.map(|ip| ip.to_string()))
        .bind(r.ipv6_ready)
        .execute(&self.pool)
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl Exporter for PostgresExporter {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn export(&mut self, record: &Record) -> Result<(), ExportError> {
        match self.insert(record).await {
            Ok(()) => {
                self.gate.record_success();
                Ok(())
            }
            Err(e) => match self.gate.record_failure() {
                Some(failures) => Err(ExportError::StorageUnavailable {
                    failures,
                    last: Box::new(e),
                }),
                None => Err(ExportError::Write(Box::new(e))),
            },
        }
    }
}
