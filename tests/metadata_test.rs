//! Metadata normalization, materialized-view probing, and DDL retrieval.

mod common;

use std::sync::Arc;

use common::{listing_rows, test_config, text_row, MockDriver, Reply};
use sqlbridge::dialect::{DorisDialect, MySqlDialect, RedshiftDialect, StarRocksDialect};
use sqlbridge::{
    ConnectionConfig, Connector, MetadataRecord, Namespace, ObjectKind, Row, TableType, Value,
};

fn connector_for(dialect: &str, driver: &MockDriver, config: ConnectionConfig) -> Connector {
    Connector::with_driver(dialect, Arc::new(driver.clone()), config).unwrap()
}

fn doris(driver: &MockDriver) -> Connector {
    Connector::new(
        Box::new(DorisDialect),
        Arc::new(driver.clone()),
        test_config(),
    )
    .unwrap()
}

const ASYNC_MV_REFUSAL: &str = "errCode = 2, detailMessage = Table sales.daily_mv is not support \
     async materialized view, please use show create materialized view";

#[tokio::test]
async fn listing_normalizes_records() {
    let driver = MockDriver::new();
    driver.on(
        "information_schema.TABLES",
        Reply::Rows(listing_rows(&[("sales", "orders"), ("sales", "items")])),
    );
    driver.on("SHOW CREATE TABLE", Reply::Rows(Vec::new()));
    let mut connector = doris(&driver);
    let records = connector
        .list_objects(ObjectKind::Table, &Namespace::default())
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    let first = &records[0];
    assert_eq!(first.catalog_name, "internal");
    assert_eq!(first.database_name, "sales");
    assert_eq!(first.schema_name, "");
    assert_eq!(first.table_name, "orders");
    assert_eq!(first.table_type, TableType::Table);
    assert_eq!(first.identifier, "`internal`.`sales`.`orders`");
}

#[tokio::test]
async fn doris_probe_separates_tables_and_materialized_views() {
    let driver = MockDriver::new();
    driver.on(
        "information_schema.TABLES",
        Reply::Rows(listing_rows(&[("sales", "orders"), ("sales", "daily_mv")])),
    );
    driver.on(
        "SHOW CREATE TABLE `internal`.`sales`.`daily_mv`",
        Reply::Error(ASYNC_MV_REFUSAL.into()),
    );
    driver.on(
        "SHOW CREATE TABLE `internal`.`sales`.`orders`",
        Reply::Rows(vec![text_row(
            &["Table", "Create Table"],
            &["orders", "CREATE TABLE orders (id INT)"],
        )]),
    );
    let mut connector = doris(&driver);

    let tables = connector
        .list_objects(ObjectKind::Table, &Namespace::default())
        .await
        .unwrap();
    let mvs = connector
        .list_objects(ObjectKind::MaterializedView, &Namespace::default())
        .await
        .unwrap();

    let table_names: Vec<&str> = tables.iter().map(|r| r.table_name.as_str()).collect();
    let mv_names: Vec<&str> = mvs.iter().map(|r| r.table_name.as_str()).collect();
    assert_eq!(table_names, vec!["orders"]);
    assert_eq!(mv_names, vec!["daily_mv"]);
    assert_eq!(mvs[0].table_type, TableType::MaterializedView);
    // Disjoint: no name appears in both.
    assert!(table_names.iter().all(|n| !mv_names.contains(n)));
}

#[tokio::test]
async fn doris_probe_failure_degrades_to_table() {
    let driver = MockDriver::new();
    driver.on(
        "information_schema.TABLES",
        Reply::Rows(listing_rows(&[("sales", "odd")])),
    );
    driver.on(
        "SHOW CREATE TABLE `internal`.`sales`.`odd`",
        Reply::Error("some unrelated failure".into()),
    );
    let mut connector = doris(&driver);
    let tables = connector
        .list_objects(ObjectKind::Table, &Namespace::default())
        .await
        .unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].table_type, TableType::Table);
}

#[tokio::test]
async fn ddl_fallback_retries_exactly_once() {
    let driver = MockDriver::new();
    driver.on(
        "SHOW CREATE TABLE `internal`.`sales`.`daily_mv`",
        Reply::Error(ASYNC_MV_REFUSAL.into()),
    );
    driver.on(
        "SHOW CREATE MATERIALIZED VIEW `internal`.`sales`.`daily_mv`",
        Reply::Rows(vec![text_row(
            &["Materialized View", "Create Materialized View"],
            &["daily_mv", "CREATE MATERIALIZED VIEW daily_mv AS SELECT 1"],
        )]),
    );
    let mut connector = doris(&driver);
    let record = MetadataRecord {
        catalog_name: "internal".into(),
        database_name: "sales".into(),
        schema_name: String::new(),
        table_name: "daily_mv".into(),
        table_type: TableType::MaterializedView,
        identifier: "`internal`.`sales`.`daily_mv`".into(),
        definition: None,
    };
    let ddl = connector.get_ddl(&record).await;
    assert_eq!(ddl, "CREATE MATERIALIZED VIEW daily_mv AS SELECT 1");
    assert_eq!(driver.count_matching("SHOW CREATE TABLE"), 1);
    assert_eq!(driver.count_matching("SHOW CREATE MATERIALIZED VIEW"), 1);
}

#[tokio::test]
async fn unrelated_ddl_error_yields_placeholder_without_retry() {
    let driver = MockDriver::new();
    driver.on(
        "SHOW CREATE TABLE",
        Reply::Error("Unknown table 'sales.gone'".into()),
    );
    let mut connector = doris(&driver);
    let record = MetadataRecord {
        catalog_name: "internal".into(),
        database_name: "sales".into(),
        schema_name: String::new(),
        table_name: "gone".into(),
        table_type: TableType::Table,
        identifier: "`internal`.`sales`.`gone`".into(),
        definition: None,
    };
    let ddl = connector.get_ddl(&record).await;
    assert!(ddl.starts_with("-- DDL not available for `internal`.`sales`.`gone`:"));
    assert!(ddl.contains("Unknown table"));
    assert_eq!(driver.count_matching("SHOW CREATE MATERIALIZED VIEW"), 0);
}

#[tokio::test]
async fn starrocks_mv_definitions_come_from_the_listing() {
    let driver = MockDriver::new();
    driver.on(
        "information_schema.materialized_views",
        Reply::Rows(vec![Row::new(
            vec![
                "database_name".into(),
                "table_name".into(),
                "definition".into(),
            ],
            vec![
                Value::String("sales".into()),
                Value::String("daily".into()),
                Value::String("SELECT day, sum(v) FROM t GROUP BY day".into()),
            ],
        )]),
    );
    let config = ConnectionConfig::new("sr.test", 9030, "app").with_database("sales");
    let mut connector = Connector::new(
        Box::new(StarRocksDialect),
        Arc::new(driver.clone()),
        config,
    )
    .unwrap();

    let records = connector
        .list_objects_with_ddl(ObjectKind::MaterializedView, &Namespace::default(), None)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].definition.as_deref(),
        Some("SELECT day, sum(v) FROM t GROUP BY day")
    );
    // The definition came from the listing; no SHOW CREATE ran.
    assert_eq!(driver.count_matching("SHOW CREATE"), 0);
}

#[tokio::test]
async fn redshift_view_ddl_is_wrapped() {
    let driver = MockDriver::new();
    driver.on(
        "pg_get_viewdef",
        Reply::Rows(vec![text_row(&["definition"], &["SELECT day FROM t"])]),
    );
    let config = ConnectionConfig::new("rs.test", 5439, "app").with_database("dev");
    let mut connector = Connector::new(
        Box::new(RedshiftDialect),
        Arc::new(driver.clone()),
        config,
    )
    .unwrap();

    let view = MetadataRecord {
        catalog_name: String::new(),
        database_name: "dev".into(),
        schema_name: "public".into(),
        table_name: "daily".into(),
        table_type: TableType::View,
        identifier: r#""dev"."public"."daily""#.into(),
        definition: None,
    };
    assert_eq!(
        connector.get_ddl(&view).await,
        "CREATE VIEW public.daily AS\nSELECT day FROM t"
    );

    let mv = MetadataRecord {
        table_type: TableType::MaterializedView,
        ..view.clone()
    };
    assert_eq!(
        connector.get_ddl(&mv).await,
        "CREATE MATERIALIZED VIEW public.daily AS\nSELECT day FROM t"
    );

    // Table DDL is not retrievable on Redshift.
    let table = MetadataRecord {
        table_type: TableType::Table,
        ..view
    };
    let ddl = connector.get_ddl(&table).await;
    assert!(ddl.starts_with("-- DDL not available for"));
}

#[tokio::test]
async fn all_kind_unions_and_degrades_views() {
    let driver = MockDriver::new();
    driver.on(
        "information_schema.TABLES",
        Reply::Rows(listing_rows(&[("sales", "orders")])),
    );
    driver.on(
        "information_schema.VIEWS",
        Reply::Error("permission denied for information_schema.VIEWS".into()),
    );
    let config = ConnectionConfig::new("my.test", 3306, "app").with_database("sales");
    let mut connector = Connector::new(
        Box::new(MySqlDialect),
        Arc::new(driver.clone()),
        config,
    )
    .unwrap();
    // View listing fails but the union still returns the tables; MySQL has
    // no materialized views so that leg is skipped entirely.
    let records = connector
        .list_objects(ObjectKind::All, &Namespace::default())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].table_name, "orders");
}

#[tokio::test]
async fn mv_listing_is_unsupported_on_mysql() {
    let driver = MockDriver::new();
    let config = ConnectionConfig::new("my.test", 3306, "app");
    let mut connector =
        Connector::new(Box::new(MySqlDialect), Arc::new(driver.clone()), config).unwrap();
    assert!(connector
        .list_objects(ObjectKind::MaterializedView, &Namespace::default())
        .await
        .is_err());
}

#[tokio::test]
async fn columns_map_in_ordinal_order() {
    let driver = MockDriver::new();
    driver.on(
        "information_schema.COLUMNS",
        Reply::Rows(vec![
            Row::new(
                vec![
                    "name".into(),
                    "data_type".into(),
                    "nullable".into(),
                    "default_value".into(),
                    "is_pk".into(),
                ],
                vec![
                    Value::String("id".into()),
                    Value::String("bigint(20)".into()),
                    Value::String("NO".into()),
                    Value::Null,
                    Value::Int64(1),
                ],
            ),
            Row::new(
                vec![
                    "name".into(),
                    "data_type".into(),
                    "nullable".into(),
                    "default_value".into(),
                    "is_pk".into(),
                ],
                vec![
                    Value::String("note".into()),
                    Value::String("varchar(255)".into()),
                    Value::String("YES".into()),
                    Value::String("''".into()),
                    Value::Int64(0),
                ],
            ),
        ]),
    );
    let mut connector = doris(&driver);
    let columns = connector
        .get_columns(&Namespace::default(), "orders")
        .await
        .unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].ordinal, 0);
    assert_eq!(columns[0].name, "id");
    assert!(!columns[0].nullable);
    assert!(columns[0].primary_key);
    assert_eq!(columns[1].ordinal, 1);
    assert!(columns[1].nullable);
    assert!(!columns[1].primary_key);
    assert_eq!(columns[1].default_value.as_deref(), Some("''"));
}

#[tokio::test]
async fn sample_rows_render_csv_and_skip_failures() {
    let driver = MockDriver::new();
    driver.on(
        "information_schema.TABLES",
        Reply::Rows(listing_rows(&[("sales", "orders"), ("sales", "locked")])),
    );
    driver.on("SHOW CREATE TABLE", Reply::Rows(Vec::new()));
    driver.on(
        "SELECT * FROM `internal`.`sales`.`orders` LIMIT 2",
        Reply::Rows(vec![
            Row::new(vec!["id".into()], vec![Value::Int64(1)]),
            Row::new(vec!["id".into()], vec![Value::Int64(2)]),
        ]),
    );
    driver.on(
        "SELECT * FROM `internal`.`sales`.`locked`",
        Reply::Error("permission denied for table locked".into()),
    );
    let mut connector = doris(&driver);
    let samples = connector
        .sample_rows(ObjectKind::Table, &Namespace::default(), None, 2)
        .await
        .unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].record.table_name, "orders");
    assert_eq!(samples[0].rows, "id\n1\n2\n");
}

#[tokio::test]
async fn database_listing_hides_system_namespaces() {
    let driver = MockDriver::new();
    driver.on(
        "information_schema.SCHEMATA",
        Reply::Rows(
            ["information_schema", "mysql", "sales", "staging"]
                .iter()
                .map(|name| text_row(&["database_name"], &[name]))
                .collect(),
        ),
    );
    let config = ConnectionConfig::new("my.test", 3306, "app");
    let mut connector =
        Connector::new(Box::new(MySqlDialect), Arc::new(driver.clone()), config).unwrap();
    let databases = connector.list_databases(false).await.unwrap();
    assert_eq!(databases, vec!["sales", "staging"]);
    let all = connector.list_databases(true).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn catalog_listing_reads_show_catalogs() {
    let driver = MockDriver::new();
    driver.on(
        "SHOW CATALOGS",
        Reply::Rows(vec![
            text_row(&["CatalogId", "CatalogName", "Type"], &["0", "internal", "internal"]),
            text_row(&["CatalogId", "CatalogName", "Type"], &["1", "hive", "hms"]),
        ]),
    );
    let mut connector = doris(&driver);
    let catalogs = connector.list_catalogs().await.unwrap();
    assert_eq!(catalogs, vec!["internal", "hive"]);
}

#[tokio::test]
async fn names_filter_is_case_insensitive() {
    let driver = MockDriver::new();
    driver.on(
        "information_schema.TABLES",
        Reply::Rows(listing_rows(&[("sales", "orders"), ("sales", "items")])),
    );
    driver.on(
        "SHOW CREATE TABLE",
        Reply::Rows(vec![text_row(
            &["Table", "Create Table"],
            &["orders", "CREATE TABLE orders (id INT)"],
        )]),
    );
    let mut connector = connector_for("doris", &driver, test_config());
    let records = connector
        .list_objects_with_ddl(
            ObjectKind::Table,
            &Namespace::default(),
            Some(&["ORDERS".to_owned()]),
        )
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].table_name, "orders");
    assert_eq!(
        records[0].definition.as_deref(),
        Some("CREATE TABLE orders (id INT)")
    );
}
