//! End-to-end sharing reads against the in-memory catalog and a scripted loader.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use tidepool_core::model::{
    GcsProperties, SharedTable, StorageProperties, StorageType, TableFormat, TableReference,
};
use tidepool_core::{CatalogStore, Clock};
use tidepool_core::pagination::PageLimits;
use tidepool_sharing::{QueryRequest, SharingError};
use tidepool_test_utils::{
    LoaderOp, SEEDED_COMMITS, TestCatalog, delta_table, init_test_logging, provider, s3_storage,
    schema, share, shared_table, test_principal,
};

fn date_equals(date: &str) -> String {
    format!(
        r#"{{"op":"equal","children":[
            {{"op":"column","name":"date","valueType":"date"}},
            {{"op":"literal","value":"{date}","valueType":"date"}}]}}"#
    )
}

#[tokio::test]
async fn empty_query_returns_current_snapshot_with_signed_files() {
    init_test_logging();
    let catalog = TestCatalog::new();
    catalog.seed_shared_delta_table().await;
    let sharing = catalog.sharing_service();

    let result = sharing
        .query_table("sh1", "sc1", "t1", &QueryRequest::current())
        .await
        .unwrap()
        .expect("table is shared");

    assert_eq!(result.version, 1);
    assert_eq!(result.protocol.effective_min_reader_version(), 1);
    assert_eq!(result.metadata.id, "t1-id");
    assert_eq!(result.metadata.partition_columns, vec!["date".to_string()]);

    let ids: Vec<_> = result.files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["f0", "f1"]);
    let now = catalog.clock.now_millis();
    for file in &result.files {
        assert!(file.url.starts_with("https://bucket.s3.amazonaws.com/t1/"));
        assert!(file.url.contains("X-Amz-Signature="));
        assert!(file.expiration_timestamp > now);
        assert_eq!(file.expiration_timestamp, now + 3_600_000);
    }
}

#[tokio::test]
async fn version_and_timestamp_select_history() {
    let catalog = TestCatalog::new();
    catalog.seed_shared_delta_table().await;
    let sharing = catalog.sharing_service();

    let v0 = sharing
        .query_table(
            "sh1",
            "sc1",
            "t1",
            &QueryRequest {
                version: Some(0),
                ..QueryRequest::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(v0.version, 0);
    assert_eq!(v0.files.len(), 1);

    let as_of_first_day = sharing
        .query_table(
            "sh1",
            "sc1",
            "t1",
            &QueryRequest {
                timestamp: Some("2023-10-01T18:00:00Z".to_string()),
                ..QueryRequest::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(as_of_first_day.version, 0);

    let missing_version = sharing
        .query_table(
            "sh1",
            "sc1",
            "t1",
            &QueryRequest {
                version: Some(9),
                ..QueryRequest::default()
            },
        )
        .await
        .unwrap();
    assert!(missing_version.is_none());
}

#[tokio::test]
async fn table_version_follows_timestamp_semantics() {
    let catalog = TestCatalog::new();
    catalog.seed_shared_delta_table().await;
    let sharing = catalog.sharing_service();

    assert_eq!(
        sharing.get_table_version("sh1", "sc1", "t1", None).await.unwrap(),
        Some(1)
    );
    assert_eq!(
        sharing
            .get_table_version("sh1", "sc1", "t1", Some(SEEDED_COMMITS[0]))
            .await
            .unwrap(),
        Some(0)
    );
    assert_eq!(
        sharing
            .get_table_version("sh1", "sc1", "t1", Some("2023-09-01T00:00:00Z"))
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        sharing
            .get_table_version("sh1", "sc1", "t1", Some("2024-01-01T00:00Z"))
            .await
            .unwrap(),
        None
    );
    assert!(matches!(
        sharing
            .get_table_version("sh1", "sc1", "t1", Some("not-a-time"))
            .await,
        Err(SharingError::MalformedTimestamp { .. })
    ));
    assert_eq!(
        sharing.get_table_version("sh1", "sc1", "nope", None).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn table_metadata_is_read_at_resolved_version() {
    let catalog = TestCatalog::new();
    catalog.seed_shared_delta_table().await;
    let sharing = catalog.sharing_service();

    let current = sharing
        .get_table_metadata("sh1", "sc1", "t1", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.version, 1);
    assert_eq!(current.metadata.version, Some(1));

    let first = sharing
        .get_table_metadata("sh1", "sc1", "t1", Some(SEEDED_COMMITS[0]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.version, 0);

    assert!(
        sharing
            .get_table_metadata("sh1", "sc1", "t1", Some("2020-01-01T00:00:00Z"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn predicate_hint_prunes_files_and_keeps_order() {
    let catalog = TestCatalog::new();
    catalog.seed_shared_delta_table().await;
    let sharing = catalog.sharing_service();

    let request = QueryRequest {
        json_predicate_hints: Some(date_equals("2023-10-01")),
        ..QueryRequest::default()
    };
    let result = sharing
        .query_table("sh1", "sc1", "t1", &request)
        .await
        .unwrap()
        .unwrap();
    let ids: Vec<_> = result.files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["f1"]);

    let stats_filter = QueryRequest {
        json_predicate_hints: Some(
            r#"{"op":"greaterThan","children":[
                {"op":"column","name":"id","valueType":"long"},
                {"op":"literal","value":"100","valueType":"long"}]}"#
                .to_string(),
        ),
        ..QueryRequest::default()
    };
    let result = sharing
        .query_table("sh1", "sc1", "t1", &stats_filter)
        .await
        .unwrap()
        .unwrap();
    assert!(result.files.is_empty());
}

#[tokio::test]
async fn invalid_requests_never_reach_the_loader() {
    let catalog = TestCatalog::new();
    catalog.seed_shared_delta_table().await;
    let sharing = catalog.sharing_service();
    catalog.loader.clear_ops();

    let both = QueryRequest {
        version: Some(1),
        timestamp: Some(SEEDED_COMMITS[0].to_string()),
        ..QueryRequest::default()
    };
    assert!(matches!(
        sharing.query_table("sh1", "sc1", "t1", &both).await,
        Err(SharingError::BadRequest { .. })
    ));

    let malformed_predicate = QueryRequest {
        json_predicate_hints: Some(r#"{"op":"equal","children":[]}"#.to_string()),
        ..QueryRequest::default()
    };
    assert!(matches!(
        sharing
            .query_table("sh1", "sc1", "t1", &malformed_predicate)
            .await,
        Err(SharingError::Predicate(_))
    ));

    let range = QueryRequest {
        starting_version: Some(0),
        ..QueryRequest::default()
    };
    assert!(matches!(
        sharing.query_table("sh1", "sc1", "t1", &range).await,
        Err(SharingError::NotImplemented { .. })
    ));

    assert!(catalog.loader.ops().is_empty());
}

#[tokio::test]
async fn limit_hint_is_passed_to_the_loader() {
    let catalog = TestCatalog::new();
    let reference = catalog.seed_shared_delta_table().await;
    let sharing = catalog.sharing_service();
    catalog.loader.clear_ops();

    let request = QueryRequest {
        limit_hint: Some(5),
        ..QueryRequest::default()
    };
    sharing
        .query_table("sh1", "sc1", "t1", &request)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        catalog.loader.ops(),
        vec![
            LoaderOp::History {
                table: reference.clone()
            },
            LoaderOp::Snapshot {
                table: reference,
                version: 1,
                limit_hint: Some(5),
            },
        ]
    );
}

#[tokio::test]
async fn loader_failures_surface_as_upstream_errors() {
    let catalog = TestCatalog::new();
    catalog.seed_shared_delta_table().await;
    let sharing = catalog.sharing_service();
    catalog.loader.fail_with("delta log unreadable");

    let err = sharing
        .query_table("sh1", "sc1", "t1", &QueryRequest::current())
        .await
        .unwrap_err();
    assert!(matches!(err, SharingError::Upstream { .. }));
    assert!(err.to_string().contains("delta log unreadable"));
}

#[tokio::test]
async fn unknown_names_read_as_absent() {
    let catalog = TestCatalog::new();
    catalog.seed_shared_delta_table().await;
    let sharing = catalog.sharing_service();
    let current = QueryRequest::current();

    assert!(sharing.query_table("nope", "sc1", "t1", &current).await.unwrap().is_none());
    assert!(sharing.query_table("sh1", "nope", "t1", &current).await.unwrap().is_none());
    assert!(sharing.query_table("sh1", "sc1", "nope", &current).await.unwrap().is_none());
    assert!(sharing.get_share("nope").await.unwrap().is_none());
    assert!(sharing.list_schemas("nope", None, None).await.unwrap().is_none());
    assert!(sharing.list_tables("sh1", "nope", None, None).await.unwrap().is_none());
    assert!(sharing.list_tables_of_share("nope", None, None).await.unwrap().is_none());
}

#[tokio::test]
async fn unsupported_storage_and_format_are_reported() {
    let catalog = TestCatalog::new();
    let principal = test_principal();
    let services = &catalog.services;

    let mut gcs = s3_storage("gcs");
    gcs.storage_type = StorageType::Gcs;
    gcs.uri = "gs://bucket".to_string();
    gcs.properties = StorageProperties::Gcs(GcsProperties {
        service_account_key: "{}".to_string(),
    });
    services.storages.create_storage(gcs, &principal).await.unwrap();
    services
        .providers
        .create_provider(provider("gp", "gcs"), &principal)
        .await
        .unwrap();
    services
        .tables
        .create_internal_table("gp", delta_table("t", "gs://bucket/t"), &principal)
        .await
        .unwrap();
    services.shares.create_share(share("s"), &principal).await.unwrap();
    services
        .shares
        .create_schema("s", schema("d"), &principal)
        .await
        .unwrap();
    services
        .shares
        .add_table_to_schema("s", "d", shared_table("t", "gp", "t"), &principal)
        .await
        .unwrap();

    let sharing = catalog.sharing_service();
    assert!(matches!(
        sharing.query_table("s", "d", "t", &QueryRequest::current()).await,
        Err(SharingError::UnsupportedStorage {
            storage_type: StorageType::Gcs
        })
    ));
    assert!(catalog.loader.ops().is_empty());

    // A registry without a Delta loader cannot serve Delta tables.
    let bare = tidepool_sharing::DeltaSharesService::new(
        catalog.services.clone(),
        tidepool_sharing::TableLoaders::new(),
        Arc::new(tidepool_sharing::StorageFileSignerFactory::with_default_ttl(
            Arc::clone(&catalog.clock) as tidepool_core::SharedClock,
        )),
        PageLimits::default(),
    );
    assert!(matches!(
        bare.get_table_version("s", "d", "t", None).await,
        Err(SharingError::UnsupportedTableFormat {
            format: TableFormat::Delta
        })
    ));
}

#[tokio::test]
async fn listings_page_through_every_item_in_order() {
    let catalog = TestCatalog::new();
    catalog.seed_shared_delta_table().await;
    let principal = test_principal();
    for name in ["sh2", "sh3", "sh4"] {
        catalog
            .services
            .shares
            .create_share(share(name), &principal)
            .await
            .unwrap();
    }
    let sharing = catalog.sharing_service_with_limits(PageLimits {
        default_max_results: 2,
        max_page_size: 3,
    });

    let mut names = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = sharing.list_shares(token.as_deref(), None).await.unwrap();
        assert!(page.content.len() <= 2);
        names.extend(page.content.into_iter().map(|s| s.name));
        match page.token {
            Some(next) => token = Some(next.encode()),
            None => break,
        }
    }
    assert_eq!(names, ["sh1", "sh2", "sh3", "sh4"]);

    let clamped = sharing.list_shares(None, Some(50)).await.unwrap();
    assert_eq!(clamped.content.len(), 3);
    assert!(clamped.token.is_some());

    assert!(matches!(
        sharing.list_shares(Some("garbage"), None).await,
        Err(SharingError::Core(tidepool_core::Error::InvalidPageToken { .. }))
    ));

    let tables = sharing
        .list_tables_of_share("sh1", None, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tables.content.len(), 1);
    assert_eq!(tables.content[0].table, TableReference::new("p1", "t1"));
    assert!(tables.token.is_none());
}

#[tokio::test]
async fn dangling_catalog_references_are_internal_errors() {
    let catalog = TestCatalog::new();
    catalog.seed_shared_delta_table().await;
    for (name, reference) in [
        ("ghost_table", TableReference::new("p1", "missing")),
        ("ghost_provider", TableReference::new("p9", "t1")),
    ] {
        catalog
            .store
            .insert_shared_table(SharedTable {
                name: name.to_string(),
                schema: "sc1".to_string(),
                share: "sh1".to_string(),
                table: reference,
            })
            .await
            .unwrap();
    }
    let sharing = catalog.sharing_service();

    let err = sharing
        .query_table("sh1", "sc1", "ghost_table", &QueryRequest::current())
        .await
        .unwrap_err();
    assert!(
        matches!(&err, SharingError::Internal { message } if message.contains("table p1.missing")),
        "{err}"
    );

    let err = sharing
        .get_table_version("sh1", "sc1", "ghost_provider", None)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, SharingError::Internal { message } if message.contains("provider p9")),
        "{err}"
    );
    assert!(catalog.loader.ops().is_empty());
}
