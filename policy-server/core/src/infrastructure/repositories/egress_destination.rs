// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Egress Destination Table
//!
//! Owns the `ip_ranges` rows (network match criteria keyed by destination
//! terminal) and reassembles full destinations by joining terminals, IP
//! ranges and metadata.
//!
//! Reads use a LEFT JOIN on `destination_metadatas`: destinations created
//! before the metadata table existed have no name or description.

use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::Row;

use crate::domain::destination::{EgressDestination, IpRange, PortRange, Protocol, ICMP_DEFAULT};
use crate::domain::repository::{EgressDestinationRepository, IpRangeRecord, Tx};
use crate::infrastructure::db::{execute_insert, insert_sql, placeholders, rebind, Dialect};
use crate::infrastructure::repositories::{decode_error, row_exists};

const SELECT_DESTINATIONS: &str = r#"
    SELECT
        t.guid, d.name, d.description,
        ip.protocol, ip.start_ip, ip.end_ip,
        ip.start_port, ip.end_port, ip.icmp_type, ip.icmp_code
    FROM ip_ranges ip
    JOIN terminals t ON ip.terminal_guid = t.guid
    LEFT OUTER JOIN destination_metadatas d ON d.terminal_guid = t.guid
"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct EgressDestinationTable;

impl EgressDestinationTable {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EgressDestinationRepository for EgressDestinationTable {
    async fn all(&self, tx: &mut Tx) -> Result<Vec<EgressDestination>, sqlx::Error> {
        let sql = format!("{} ORDER BY t.id DESC", SELECT_DESTINATIONS);
        let rows = sqlx::query(&sql).fetch_all(&mut **tx).await?;

        rows.iter().map(parse_destination_row).collect()
    }

    async fn create_ip_range(&self, tx: &mut Tx, record: &IpRangeRecord) -> Result<i64, sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let sql = insert_sql(
            dialect,
            r#"INSERT INTO ip_ranges
                (protocol, start_ip, end_ip, terminal_guid, start_port, end_port, icmp_type, icmp_code)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        );

        let query = sqlx::query(&sql)
            .bind(&record.protocol)
            .bind(&record.start_ip)
            .bind(&record.end_ip)
            .bind(&record.terminal_guid)
            .bind(record.start_port)
            .bind(record.end_port)
            .bind(record.icmp_type)
            .bind(record.icmp_code);

        execute_insert(tx, dialect, query).await
    }

    async fn update_ip_range(&self, tx: &mut Tx, record: &IpRangeRecord) -> Result<(), sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        let result = sqlx::query(&rebind(
            dialect,
            r#"UPDATE ip_ranges
                SET protocol = ?, start_ip = ?, end_ip = ?, start_port = ?, end_port = ?,
                    icmp_type = ?, icmp_code = ?
                WHERE terminal_guid = ?"#,
        ))
        .bind(&record.protocol)
        .bind(&record.start_ip)
        .bind(&record.end_ip)
        .bind(record.start_port)
        .bind(record.end_port)
        .bind(record.icmp_type)
        .bind(record.icmp_code)
        .bind(&record.terminal_guid)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0
            && !row_exists(tx, dialect, "ip_ranges", "terminal_guid", &record.terminal_guid).await?
        {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_by_guid(
        &self,
        tx: &mut Tx,
        guids: &[String],
    ) -> Result<Vec<EgressDestination>, sqlx::Error> {
        if guids.is_empty() {
            return Ok(Vec::new());
        }

        let dialect = Dialect::of(tx)?;
        let sql = format!(
            "{} WHERE t.guid IN ({}) ORDER BY t.id DESC",
            SELECT_DESTINATIONS,
            placeholders(guids.len())
        );
        let sql = rebind(dialect, &sql);

        let mut query = sqlx::query(&sql);
        for guid in guids {
            query = query.bind(guid);
        }
        let rows = query.fetch_all(&mut **tx).await?;

        rows.iter().map(parse_destination_row).collect()
    }

    async fn delete(&self, tx: &mut Tx, terminal_guid: &str) -> Result<(), sqlx::Error> {
        let dialect = Dialect::of(tx)?;
        sqlx::query(&rebind(dialect, "DELETE FROM ip_ranges WHERE terminal_guid = ?"))
            .bind(terminal_guid)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

/// Parse an egress destination from a joined row
fn parse_destination_row(row: &AnyRow) -> Result<EgressDestination, sqlx::Error> {
    let guid: String = row.try_get("guid")?;
    let name: Option<String> = row.try_get("name")?;
    let description: Option<String> = row.try_get("description")?;
    let protocol: String = row.try_get("protocol")?;
    let start_ip: String = row.try_get("start_ip")?;
    let end_ip: String = row.try_get("end_ip")?;
    let start_port: Option<i64> = row.try_get("start_port")?;
    let end_port: Option<i64> = row.try_get("end_port")?;
    let icmp_type: Option<i64> = row.try_get("icmp_type")?;
    let icmp_code: Option<i64> = row.try_get("icmp_code")?;

    let protocol: Protocol = protocol
        .parse()
        .map_err(|e| decode_error(format!("destination {}: {}", guid, e)))?;

    let ports = match (start_port.unwrap_or(0), end_port.unwrap_or(0)) {
        (0, 0) => Vec::new(),
        (start, end) => vec![PortRange {
            start: to_port(&guid, start)?,
            end: to_port(&guid, end)?,
        }],
    };

    Ok(EgressDestination {
        name: name.unwrap_or_default(),
        description: description.unwrap_or_default(),
        protocol,
        ip_ranges: vec![IpRange::new(start_ip, end_ip)],
        ports,
        icmp_type: to_icmp(&guid, icmp_type)?,
        icmp_code: to_icmp(&guid, icmp_code)?,
        guid,
    })
}

fn to_port(guid: &str, value: i64) -> Result<u16, sqlx::Error> {
    u16::try_from(value)
        .map_err(|_| decode_error(format!("destination {}: port {} out of range", guid, value)))
}

fn to_icmp(guid: &str, value: Option<i64>) -> Result<i32, sqlx::Error> {
    match value {
        None => Ok(ICMP_DEFAULT),
        Some(v) => i32::try_from(v)
            .map_err(|_| decode_error(format!("destination {}: icmp value {} out of range", guid, v))),
    }
}
