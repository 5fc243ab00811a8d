//! Catalog service behavior against the in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::DateTime;
use tidepool_catalog::{
    AddSharedTable, CatalogError, CatalogServices, CreateInternalTable, CreateMetastore,
    CreateProvider, CreateSchema, CreateShare, CreateStorage,
};
use tidepool_core::model::{
    AbfsProperties, AwsCredentials, InternalTableProperties, MetastoreProperties, MetastoreType, Principal,
    S3Properties, SimpleAwsCredentials, StorageProperties, StorageType,
};
use tidepool_core::{FixedClock, MemoryCatalogStore};

fn services() -> CatalogServices {
    CatalogServices::new(
        Arc::new(MemoryCatalogStore::new()),
        Arc::new(FixedClock::from_millis(9)),
    )
}

fn fox() -> Principal {
    Principal::new("Mr. Fox").unwrap()
}

fn empty_creds() -> AwsCredentials {
    AwsCredentials::Simple(SimpleAwsCredentials::new("", "", ""))
}

fn create_storage(name: &str) -> CreateStorage {
    CreateStorage {
        name: name.to_string(),
        comment: None,
        storage_type: StorageType::S3,
        uri: "s3://bucket/warehouse".to_string(),
        properties: StorageProperties::S3(S3Properties {
            credentials: empty_creds(),
            endpoint: None,
        }),
        skip_validation: false,
    }
}

fn create_glue(name: &str) -> CreateMetastore {
    CreateMetastore {
        name: name.to_string(),
        comment: None,
        metastore_type: MetastoreType::Glue,
        properties: MetastoreProperties::Glue {
            catalog_id: String::new(),
            credentials: empty_creds(),
        },
        skip_validation: false,
    }
}

fn delta_table(name: &str) -> CreateInternalTable {
    CreateInternalTable {
        name: name.to_string(),
        comment: None,
        properties: InternalTableProperties::Delta {
            location: format!("s3://bucket/warehouse/{name}"),
        },
        skip_validation: false,
    }
}

fn iceberg_table(name: &str, skip_validation: bool) -> CreateInternalTable {
    CreateInternalTable {
        name: name.to_string(),
        comment: None,
        properties: InternalTableProperties::Iceberg {
            database_name: "db".to_string(),
            table_name: name.to_string(),
        },
        skip_validation,
    }
}

async fn provider(services: &CatalogServices, name: &str, metastore: Option<&str>) {
    services
        .providers
        .create_provider(
            CreateProvider {
                name: name.to_string(),
                comment: None,
                storage_name: "s3store".to_string(),
                metastore_name: metastore.map(str::to_string),
            },
            &fox(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn storage_is_stamped_with_clock_and_principal() {
    let services = services();
    let storage = services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();

    let at = DateTime::from_timestamp_millis(9).unwrap();
    assert_eq!(storage.validated_at, Some(at));
    assert_eq!(storage.audit.created_at, at);
    assert_eq!(storage.owner, fox());
    assert_eq!(storage.audit.created_by, fox());
    assert_eq!(
        services.storages.get_storage("s3store").await.unwrap(),
        Some(storage)
    );
    assert_eq!(services.storages.get_storage("nope").await.unwrap(), None);
}

#[test]
fn storage_request_reads_camel_case_json() {
    let request: CreateStorage = serde_json::from_value(serde_json::json!({
        "name": "s3store",
        "type": "s3",
        "uri": "s3://bucket/warehouse",
        "properties": {
            "type": "s3",
            "credentials": {
                "credentialsType": "simple",
                "awsAccessKeyId": "",
                "awsSecretAccessKey": "",
                "region": ""
            }
        }
    }))
    .unwrap();
    assert_eq!(request, create_storage("s3store"));

    let shared: AddSharedTable = serde_json::from_str(
        r#"{"name":"t1","providerName":"p1","tableName":"orders"}"#,
    )
    .unwrap();
    assert_eq!(shared.provider_name, "p1");
    assert_eq!(shared.table_name, "orders");
}

#[tokio::test]
async fn storage_rejects_mismatched_properties_and_duplicates() {
    let services = services();
    let mut mismatched = create_storage("gcs-with-s3-props");
    mismatched.storage_type = StorageType::Gcs;
    mismatched.uri = "gs://bucket".to_string();
    assert!(matches!(
        services.storages.create_storage(mismatched, &fox()).await,
        Err(CatalogError::Validation { .. })
    ));

    let mut wrong_scheme = create_storage("s3-at-gs");
    wrong_scheme.uri = "gs://bucket".to_string();
    assert!(matches!(
        services
            .storages
            .create_storage(wrong_scheme.clone(), &fox())
            .await,
        Err(CatalogError::Validation { .. })
    ));
    wrong_scheme.skip_validation = true;
    assert!(
        services
            .storages
            .create_storage(wrong_scheme, &fox())
            .await
            .is_ok()
    );

    services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();
    assert!(matches!(
        services
            .storages
            .create_storage(create_storage("s3store"), &fox())
            .await,
        Err(CatalogError::AlreadyExists {
            resource_type: "storage",
            ..
        })
    ));
}

#[tokio::test]
async fn metastore_is_validated_on_creation() {
    let services = services();
    let metastore = services
        .metastores
        .create_metastore(create_glue("glue"), &fox())
        .await
        .unwrap();
    assert_eq!(
        metastore.validated_at,
        Some(DateTime::from_timestamp_millis(9).unwrap())
    );

    let mut mismatched = create_glue("hadoop-with-glue-props");
    mismatched.metastore_type = MetastoreType::Hadoop;
    assert!(matches!(
        services.metastores.create_metastore(mismatched, &fox()).await,
        Err(CatalogError::Validation { .. })
    ));
    assert!(matches!(
        services
            .metastores
            .create_metastore(create_glue("glue"), &fox())
            .await,
        Err(CatalogError::AlreadyExists { .. })
    ));
}

#[tokio::test]
async fn provider_references_must_resolve() {
    let services = services();
    let request = CreateProvider {
        name: "p1".to_string(),
        comment: None,
        storage_name: "s3store".to_string(),
        metastore_name: None,
    };
    assert!(matches!(
        services
            .providers
            .create_provider(request.clone(), &fox())
            .await,
        Err(CatalogError::StorageNotFound { name }) if name == "s3store"
    ));

    services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();
    let with_missing_metastore = CreateProvider {
        metastore_name: Some("glue".to_string()),
        ..request.clone()
    };
    assert!(matches!(
        services
            .providers
            .create_provider(with_missing_metastore, &fox())
            .await,
        Err(CatalogError::MetastoreNotFound { name }) if name == "glue"
    ));

    let created = services
        .providers
        .create_provider(request.clone(), &fox())
        .await
        .unwrap();
    assert_eq!(created.storage_name, "s3store");
    assert!(matches!(
        services.providers.create_provider(request, &fox()).await,
        Err(CatalogError::AlreadyExists { .. })
    ));
}

#[tokio::test]
async fn delta_table_is_created_and_validated() {
    let services = services();
    services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();
    provider(&services, "p1", None).await;

    let table = services
        .tables
        .create_internal_table("p1", delta_table("t1"), &fox())
        .await
        .unwrap();
    assert_eq!(
        table.validated_at,
        Some(DateTime::from_timestamp_millis(9).unwrap())
    );
    assert_eq!(table.provider_name, "p1");
    assert_eq!(
        services.tables.get_internal_table("p1", "t1").await.unwrap(),
        Some(table)
    );
}

#[tokio::test]
async fn iceberg_table_needs_metastore_unless_skipped() {
    let services = services();
    services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();
    provider(&services, "p1", None).await;

    assert!(matches!(
        services
            .tables
            .create_internal_table("p1", iceberg_table("ice", false), &fox())
            .await,
        Err(CatalogError::Validation { .. })
    ));
    let skipped = services
        .tables
        .create_internal_table("p1", iceberg_table("ice", true), &fox())
        .await
        .unwrap();
    assert!(skipped.validated_at.is_some());

    services
        .metastores
        .create_metastore(create_glue("glue"), &fox())
        .await
        .unwrap();
    provider(&services, "p2", Some("glue")).await;
    assert!(
        services
            .tables
            .create_internal_table("p2", iceberg_table("ice", false), &fox())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn duplicate_table_in_provider_is_rejected() {
    let services = services();
    services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();
    provider(&services, "p1", None).await;
    provider(&services, "p2", None).await;

    services
        .tables
        .create_internal_table("p1", delta_table("t1"), &fox())
        .await
        .unwrap();
    assert!(matches!(
        services
            .tables
            .create_internal_table("p1", delta_table("t1"), &fox())
            .await,
        Err(CatalogError::AlreadyExists { .. })
    ));
    assert!(
        services
            .tables
            .create_internal_table("p2", delta_table("t1"), &fox())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn missing_provider_and_missing_table_are_distinguished() {
    let services = services();
    assert!(matches!(
        services
            .tables
            .create_internal_table("ghost", delta_table("t1"), &fox())
            .await,
        Err(CatalogError::ProviderNotFound { .. })
    ));
    assert!(matches!(
        services.tables.get_internal_table("ghost", "t1").await,
        Err(CatalogError::ProviderNotFound { .. })
    ));

    services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();
    provider(&services, "p1", None).await;
    assert_eq!(
        services.tables.get_internal_table("p1", "t1").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn share_hierarchy_requires_existing_parents_and_tables() {
    let services = services();
    services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();
    provider(&services, "p1", None).await;
    services
        .tables
        .create_internal_table("p1", delta_table("t1"), &fox())
        .await
        .unwrap();

    let add = AddSharedTable {
        name: "t1".to_string(),
        provider_name: "p1".to_string(),
        table_name: "t1".to_string(),
    };

    assert!(matches!(
        services
            .shares
            .create_schema("sh1", CreateSchema { name: "sc1".to_string() }, &fox())
            .await,
        Err(CatalogError::ShareNotFound { .. })
    ));
    assert!(matches!(
        services
            .shares
            .add_table_to_schema("sh1", "sc1", add.clone(), &fox())
            .await,
        Err(CatalogError::ShareNotFound { .. })
    ));

    let share = services
        .shares
        .create_share(
            CreateShare {
                name: "sh1".to_string(),
                comment: None,
                recipients: [Principal::new("recipient").unwrap()].into(),
            },
            &fox(),
        )
        .await
        .unwrap();
    assert_eq!(services.shares.get_share("sh1").await.unwrap(), Some(share));

    assert!(matches!(
        services
            .shares
            .add_table_to_schema("sh1", "sc1", add.clone(), &fox())
            .await,
        Err(CatalogError::SchemaNotFound { .. })
    ));
    services
        .shares
        .create_schema("sh1", CreateSchema { name: "sc1".to_string() }, &fox())
        .await
        .unwrap();

    let missing_table = AddSharedTable {
        table_name: "nope".to_string(),
        ..add.clone()
    };
    assert!(matches!(
        services
            .shares
            .add_table_to_schema("sh1", "sc1", missing_table, &fox())
            .await,
        Err(CatalogError::TableNotFound { .. })
    ));

    let shared = services
        .shares
        .add_table_to_schema("sh1", "sc1", add.clone(), &fox())
        .await
        .unwrap();
    assert_eq!(shared.table.provider_name, "p1");
    assert!(matches!(
        services
            .shares
            .add_table_to_schema("sh1", "sc1", add, &fox())
            .await,
        Err(CatalogError::AlreadyExists { .. })
    ));
}

#[tokio::test]
async fn concurrent_provider_creation_admits_one_winner() {
    let services = services();
    services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let providers = services.providers.clone();
            tokio::spawn(async move {
                providers
                    .create_provider(
                        CreateProvider {
                            name: "p1".to_string(),
                            comment: None,
                            storage_name: "s3store".to_string(),
                            metastore_name: None,
                        },
                        &fox(),
                    )
                    .await
            })
        })
        .collect();

    assert_eq!(count_created(attempts).await, 1);
}

async fn count_created<T>(
    attempts: Vec<tokio::task::JoinHandle<Result<T, CatalogError>>>,
) -> usize {
    let mut created = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => created += 1,
            Err(CatalogError::AlreadyExists { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    created
}

#[tokio::test]
async fn concurrent_metastore_creation_admits_one_winner() {
    let services = services();
    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let metastores = services.metastores.clone();
            tokio::spawn(async move { metastores.create_metastore(create_glue("glue"), &fox()).await })
        })
        .collect();

    assert_eq!(count_created(attempts).await, 1);
    assert!(services.metastores.get_metastore("glue").await.unwrap().is_some());
}

#[tokio::test]
async fn concurrent_table_creation_in_one_provider_admits_one_winner() {
    let services = services();
    services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();
    provider(&services, "p1", None).await;
    provider(&services, "p2", None).await;

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let tables = services.tables.clone();
            tokio::spawn(async move {
                tables
                    .create_internal_table("p1", delta_table("t1"), &fox())
                    .await
            })
        })
        .collect();
    assert_eq!(count_created(attempts).await, 1);

    // The same name under another provider is a different table.
    services
        .tables
        .create_internal_table("p2", delta_table("t1"), &fox())
        .await
        .unwrap();
}

#[tokio::test]
async fn delta_location_must_match_provider_storage() {
    let services = services();
    services
        .storages
        .create_storage(
            CreateStorage {
                name: "lake".to_string(),
                comment: None,
                storage_type: StorageType::Abfs,
                uri: "abfss://data@acct.dfs.core.windows.net/".to_string(),
                properties: StorageProperties::Abfs(AbfsProperties {
                    account_name: "acct".to_string(),
                    account_key: "key".to_string(),
                }),
                skip_validation: false,
            },
            &fox(),
        )
        .await
        .unwrap();
    services
        .providers
        .create_provider(
            CreateProvider {
                name: "azure".to_string(),
                comment: None,
                storage_name: "lake".to_string(),
                metastore_name: None,
            },
            &fox(),
        )
        .await
        .unwrap();

    let err = services
        .tables
        .create_internal_table("azure", delta_table("t1"), &fox())
        .await
        .unwrap_err();
    assert!(matches!(&err, CatalogError::Validation { .. }), "{err}");
    assert!(err.to_string().contains("delta table location"));

    let mut skipped = delta_table("t1");
    skipped.skip_validation = true;
    assert!(
        services
            .tables
            .create_internal_table("azure", skipped, &fox())
            .await
            .is_ok()
    );

    let matching = CreateInternalTable {
        properties: InternalTableProperties::Delta {
            location: "abfss://data@acct.dfs.core.windows.net/t2".to_string(),
        },
        ..delta_table("t2")
    };
    assert!(
        services
            .tables
            .create_internal_table("azure", matching, &fox())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn share_listings_read_through_the_share_service() {
    let services = services();
    services
        .storages
        .create_storage(create_storage("s3store"), &fox())
        .await
        .unwrap();
    provider(&services, "p1", None).await;
    services
        .tables
        .create_internal_table("p1", delta_table("t1"), &fox())
        .await
        .unwrap();
    for name in ["sh1", "sh2"] {
        services
            .shares
            .create_share(
                CreateShare {
                    name: name.to_string(),
                    comment: None,
                    recipients: Default::default(),
                },
                &fox(),
            )
            .await
            .unwrap();
    }
    services
        .shares
        .create_schema("sh1", CreateSchema { name: "sc1".to_string() }, &fox())
        .await
        .unwrap();
    services
        .shares
        .add_table_to_schema(
            "sh1",
            "sc1",
            AddSharedTable {
                name: "orders".to_string(),
                provider_name: "p1".to_string(),
                table_name: "t1".to_string(),
            },
            &fox(),
        )
        .await
        .unwrap();

    let shares = services.shares.list_shares().await.unwrap();
    let names: Vec<_> = shares.iter().map(|share| share.name.as_str()).collect();
    assert_eq!(names, ["sh1", "sh2"]);
    assert_eq!(services.shares.list_schemas("sh1").await.unwrap().unwrap().len(), 1);
    assert_eq!(services.shares.list_schemas("nope").await.unwrap(), None);
    assert_eq!(services.shares.list_tables("sh1", "sc1").await.unwrap().unwrap().len(), 1);
    assert_eq!(services.shares.list_tables("sh1", "nope").await.unwrap(), None);
    assert_eq!(services.shares.list_tables_of_share("sh2").await.unwrap(), Some(vec![]));

    let shared = services
        .shares
        .get_shared_table("sh1", "sc1", "orders")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shared.table.to_string(), "p1.t1");
    assert_eq!(
        services.shares.get_shared_table("sh1", "sc1", "t1").await.unwrap(),
        None
    );
}
