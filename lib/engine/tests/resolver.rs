//! End-to-end resolver tests against an in-memory query client that counts
//! every remote call.

use async_trait::async_trait;
use formula_resolver_engine::{
    new_session, CancelHandle, ClientError, ColumnValueRecord, DeepMirrorRecord, LinkedItemRef,
    QueryClient, RawColumnValue, ResolverSession, SessionOptions,
};
use formula_resolver_model::{
    BoardId, ColumnDef, ColumnId, ColumnKind, ColumnSettings, ItemId, LinkedColumnTarget,
    MirrorFunction, ResolveError, Scalar,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type ValueKey = (u64, u64, String);

#[derive(Default)]
struct Counters {
    schema: AtomicUsize,
    display_value: AtomicUsize,
    display_values: AtomicUsize,
    deep_mirror: AtomicUsize,
    item_columns: AtomicUsize,
}

#[derive(Default)]
struct MockClient {
    boards: HashMap<u64, Vec<ColumnDef>>,
    records: HashMap<ValueKey, ColumnValueRecord>,
    mirrors: HashMap<ValueKey, DeepMirrorRecord>,
    raw: HashMap<ValueKey, RawColumnValue>,
    counters: Counters,
    batched_columns: Mutex<Vec<Vec<String>>>,
    fail_display_value: bool,
}

impl MockClient {
    fn with_board(mut self, board: u64, columns: Vec<ColumnDef>) -> Self {
        self.boards.insert(board, columns);
        self
    }

    fn with_record(mut self, board: u64, item: u64, column: &str, record: ColumnValueRecord) -> Self {
        self.records.insert((board, item, column.to_owned()), record);
        self
    }

    fn with_mirror(mut self, board: u64, item: u64, column: &str, record: DeepMirrorRecord) -> Self {
        self.mirrors.insert((board, item, column.to_owned()), record);
        self
    }

    fn with_raw(mut self, board: u64, item: u64, column: &str, value: RawColumnValue) -> Self {
        self.raw.insert((board, item, column.to_owned()), value);
        self
    }

    fn remote_calls(&self) -> usize {
        self.counters.schema.load(Ordering::SeqCst)
            + self.counters.display_value.load(Ordering::SeqCst)
            + self.counters.display_values.load(Ordering::SeqCst)
            + self.counters.deep_mirror.load(Ordering::SeqCst)
            + self.counters.item_columns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryClient for MockClient {
    async fn board_schema(&self, board: BoardId) -> Result<Vec<ColumnDef>, ClientError> {
        self.counters.schema.fetch_add(1, Ordering::SeqCst);
        Ok(self.boards.get(&board.as_u64()).cloned().unwrap_or_default())
    }

    async fn display_value(
        &self,
        board: BoardId,
        item: ItemId,
        column: &ColumnId,
    ) -> Result<ColumnValueRecord, ClientError> {
        self.counters.display_value.fetch_add(1, Ordering::SeqCst);
        if self.fail_display_value {
            return Err("platform is down".into());
        }
        Ok(self
            .records
            .get(&(board.as_u64(), item.as_u64(), column.as_str().to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    async fn display_values(
        &self,
        board: BoardId,
        items: &[ItemId],
        column: &ColumnId,
    ) -> Result<HashMap<ItemId, ColumnValueRecord>, ClientError> {
        self.counters.display_values.fetch_add(1, Ordering::SeqCst);
        Ok(items
            .iter()
            .filter_map(|item| {
                self.records
                    .get(&(board.as_u64(), item.as_u64(), column.as_str().to_owned()))
                    .map(|record| (*item, record.clone()))
            })
            .collect())
    }

    async fn deep_mirror(
        &self,
        board: BoardId,
        item: ItemId,
        column: &ColumnId,
    ) -> Result<DeepMirrorRecord, ClientError> {
        self.counters.deep_mirror.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .mirrors
            .get(&(board.as_u64(), item.as_u64(), column.as_str().to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    async fn item_columns(
        &self,
        board: BoardId,
        item: ItemId,
        columns: &[ColumnId],
    ) -> Result<HashMap<ColumnId, RawColumnValue>, ClientError> {
        self.counters.item_columns.fetch_add(1, Ordering::SeqCst);
        self.batched_columns
            .lock()
            .unwrap()
            .push(columns.iter().map(|c| c.as_str().to_owned()).collect());
        Ok(columns
            .iter()
            .filter_map(|column| {
                self.raw
                    .get(&(board.as_u64(), item.as_u64(), column.as_str().to_owned()))
                    .map(|value| (column.clone(), value.clone()))
            })
            .collect())
    }
}

fn number_column(id: &str) -> ColumnDef {
    ColumnDef::new(id, id, ColumnKind::Number)
}

fn formula_column(id: &str, formula: &str) -> ColumnDef {
    ColumnDef::new(id, id, ColumnKind::Formula).with_settings(ColumnSettings {
        formula: Some(formula.to_owned()),
        ..ColumnSettings::default()
    })
}

fn mirror_column(id: &str, function: MirrorFunction, target_board: u64, target: &str) -> ColumnDef {
    ColumnDef::new(id, id, ColumnKind::Mirror).with_settings(ColumnSettings {
        function,
        displayed_linked_columns: vec![LinkedColumnTarget {
            board_id: BoardId::new(target_board),
            column_ids: vec![ColumnId::new(target)],
        }],
        relation_column: Some(ColumnId::new("connect_boards")),
        ..ColumnSettings::default()
    })
}

fn number_record(n: f64) -> ColumnValueRecord {
    ColumnValueRecord {
        kind: ColumnKind::Number,
        number: Some(n),
        ..ColumnValueRecord::default()
    }
}

fn text_record(text: &str) -> ColumnValueRecord {
    ColumnValueRecord {
        kind: ColumnKind::Text,
        text: Some(text.to_owned()),
        ..ColumnValueRecord::default()
    }
}

fn session(client: MockClient) -> (ResolverSession, Arc<MockClient>) {
    let client = Arc::new(client);
    let options = SessionOptions {
        batch_window: Duration::from_millis(1),
        ..SessionOptions::default()
    };
    (new_session(client.clone(), options), client)
}

async fn resolve(session: &ResolverSession, board: u64, column: &str, item: u64) -> Scalar {
    session
        .resolve(BoardId::new(board), ColumnId::new(column), ItemId::new(item))
        .await
        .unwrap()
}

#[tokio::test]
async fn leaf_number_fast_path() {
    let client = MockClient::default()
        .with_board(123, vec![number_column("numbers1")])
        .with_record(123, 100, "numbers1", number_record(42.0));
    let (session, client) = session(client);

    assert_eq!(resolve(&session, 123, "numbers1", 100).await, Scalar::Number(42.0));
    assert_eq!(client.counters.schema.load(Ordering::SeqCst), 1);
    assert_eq!(client.counters.display_value.load(Ordering::SeqCst), 1);
    assert_eq!(client.remote_calls(), 2);
}

#[tokio::test]
async fn formula_over_simple_dependency() {
    let client = MockClient::default()
        .with_board(
            123,
            vec![number_column("numbers1"), formula_column("formula1", "{numbers1} * 2")],
        )
        .with_raw(
            123,
            100,
            "numbers1",
            RawColumnValue::Number {
                number: Some(25.0),
                text: None,
            },
        );
    let (session, client) = session(client);

    assert_eq!(resolve(&session, 123, "formula1", 100).await, Scalar::Number(50.0));
    // The probe ran (simple dependency), came back empty, and the dependency
    // went through the coordinator.
    assert_eq!(client.counters.display_value.load(Ordering::SeqCst), 1);
    assert_eq!(client.counters.item_columns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn formula_display_value_wins_when_numeric() {
    let client = MockClient::default()
        .with_board(
            123,
            vec![number_column("numbers1"), formula_column("formula1", "{numbers1} * 2")],
        )
        .with_record(
            123,
            100,
            "formula1",
            ColumnValueRecord {
                kind: ColumnKind::Formula,
                display_value: Some("50".to_owned()),
                ..ColumnValueRecord::default()
            },
        );
    let (session, client) = session(client);

    assert_eq!(resolve(&session, 123, "formula1", 100).await, Scalar::Number(50.0));
    // The cached display value made dependency work unnecessary.
    assert_eq!(client.counters.item_columns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn formula_without_references_needs_only_the_schema() {
    let client = MockClient::default()
        .with_board(123, vec![formula_column("formula1", "1 + 2 * 3")]);
    let (session, client) = session(client);

    assert_eq!(resolve(&session, 123, "formula1", 100).await, Scalar::Number(7.0));
    assert_eq!(client.remote_calls(), 1);
    assert_eq!(client.counters.schema.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn coordinator_batches_sibling_dependencies() {
    let client = MockClient::default()
        .with_board(
            123,
            vec![
                number_column("a"),
                number_column("b"),
                formula_column("formula1", "{a} + {b}"),
            ],
        )
        .with_raw(123, 100, "a", RawColumnValue::Number { number: Some(1.0), text: None })
        .with_raw(123, 100, "b", RawColumnValue::Number { number: Some(2.0), text: None });
    let (session, client) = session(client);

    assert_eq!(resolve(&session, 123, "formula1", 100).await, Scalar::Number(3.0));
    assert_eq!(client.counters.item_columns.load(Ordering::SeqCst), 1);
    let batches = client.batched_columns.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
}

#[tokio::test]
async fn mirror_sum_over_display_value() {
    let client = MockClient::default()
        .with_board(123, vec![mirror_column("mirror1", MirrorFunction::Sum, 456, "numbers1")])
        .with_mirror(
            123,
            100,
            "mirror1",
            DeepMirrorRecord {
                display_value: Some("10, 20, 30".to_owned()),
                mirrored_items: Vec::new(),
            },
        );
    let (session, client) = session(client);

    assert_eq!(resolve(&session, 123, "mirror1", 100).await, Scalar::Number(60.0));
    assert_eq!(client.counters.schema.load(Ordering::SeqCst), 1);
    assert_eq!(client.counters.deep_mirror.load(Ordering::SeqCst), 1);
    assert_eq!(client.remote_calls(), 2);
}

#[tokio::test]
async fn mirror_text_aggregation_recurses_into_linked_items() {
    let client = MockClient::default()
        .with_board(123, vec![mirror_column("mirror1", MirrorFunction::None, 456, "text1")])
        .with_board(456, vec![ColumnDef::new("text1", "text1", ColumnKind::Text)])
        .with_mirror(
            123,
            100,
            "mirror1",
            DeepMirrorRecord {
                display_value: None,
                mirrored_items: vec![
                    LinkedItemRef {
                        board: BoardId::new(456),
                        item: ItemId::new(201),
                        name: "Project A".to_owned(),
                    },
                    LinkedItemRef {
                        board: BoardId::new(456),
                        item: ItemId::new(202),
                        name: "Project B".to_owned(),
                    },
                ],
            },
        )
        .with_record(456, 201, "text1", text_record("Project A"))
        .with_record(456, 202, "text1", text_record("Project B"));
    let (session, client) = session(client);

    assert_eq!(
        resolve(&session, 123, "mirror1", 100).await,
        Scalar::text("Project A, Project B")
    );
    // The linked items resolved through one batched display-value query.
    assert_eq!(client.counters.display_values.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cycles_terminate_with_numeric_defaults() {
    let client = MockClient::default().with_board(
        123,
        vec![
            formula_column("formula_a", "{formula_b} + 1"),
            formula_column("formula_b", "{formula_a} + 1"),
        ],
    );
    let (session, client) = session(client);

    // The inner re-entry of formula_a breaks to 0, formula_b evaluates to 1,
    // and the outer formula_a to 2. Each node applies its increment once.
    assert_eq!(resolve(&session, 123, "formula_a", 100).await, Scalar::Number(2.0));
    // Complex-only dependencies: no display-value probes anywhere.
    assert_eq!(client.counters.display_value.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolved_keys_are_stable_and_cached() {
    let client = MockClient::default()
        .with_board(123, vec![number_column("numbers1")])
        .with_record(123, 100, "numbers1", number_record(42.0));
    let (session, client) = session(client);

    let first = resolve(&session, 123, "numbers1", 100).await;
    let calls_after_first = client.remote_calls();
    for _ in 0..3 {
        assert_eq!(resolve(&session, 123, "numbers1", 100).await, first);
    }
    assert_eq!(client.remote_calls(), calls_after_first);
}

#[tokio::test]
async fn concurrent_resolves_deduplicate_in_flight_work() {
    let client = MockClient::default()
        .with_board(123, vec![number_column("numbers1")])
        .with_record(123, 100, "numbers1", number_record(42.0));
    let (session, client) = session(client);

    let (a, b) = tokio::join!(
        session.resolve(BoardId::new(123), ColumnId::new("numbers1"), ItemId::new(100)),
        session.resolve(BoardId::new(123), ColumnId::new("numbers1"), ItemId::new(100)),
    );
    assert_eq!(a.unwrap(), Scalar::Number(42.0));
    assert_eq!(b.unwrap(), Scalar::Number(42.0));
    assert_eq!(client.counters.display_value.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn batch_resolves_through_one_query() {
    let client = MockClient::default()
        .with_board(123, vec![number_column("numbers1")])
        .with_record(123, 100, "numbers1", number_record(10.0))
        .with_record(123, 200, "numbers1", number_record(20.0))
        .with_record(123, 300, "numbers1", number_record(30.0));
    let (session, client) = session(client);

    let values = session
        .resolve_batch(
            BoardId::new(123),
            ColumnId::new("numbers1"),
            &[ItemId::new(100), ItemId::new(200), ItemId::new(300)],
        )
        .await
        .unwrap();
    assert_eq!(values[&ItemId::new(100)], Scalar::Number(10.0));
    assert_eq!(values[&ItemId::new(200)], Scalar::Number(20.0));
    assert_eq!(values[&ItemId::new(300)], Scalar::Number(30.0));
    assert_eq!(client.counters.display_values.load(Ordering::SeqCst), 1);
    assert_eq!(client.counters.display_value.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn mirror_batch_skips_probe_for_complex_targets() {
    let client = MockClient::default()
        .with_board(
            123,
            vec![mirror_column("mirror1", MirrorFunction::Sum, 456, "formula_total")],
        )
        .with_board(456, vec![formula_column("formula_total", "2 + 3")])
        .with_mirror(123, 100, "mirror1", DeepMirrorRecord::default())
        .with_mirror(123, 200, "mirror1", DeepMirrorRecord::default());
    let (session, client) = session(client);

    let values = session
        .resolve_batch(
            BoardId::new(123),
            ColumnId::new("mirror1"),
            &[ItemId::new(100), ItemId::new(200)],
        )
        .await
        .unwrap();
    // Empty mirrors under a numeric aggregation settle to the numeric
    // default.
    assert_eq!(values[&ItemId::new(100)], Scalar::Number(0.0));
    // The target column id carries the formula prefix, so the probe was
    // suppressed entirely.
    assert_eq!(client.counters.display_values.load(Ordering::SeqCst), 0);
    assert_eq!(client.counters.deep_mirror.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_board_and_column_degrade_to_empty() {
    let client = MockClient::default().with_board(123, vec![number_column("numbers1")]);
    let (session, _client) = session(client);

    assert_eq!(resolve(&session, 999, "numbers1", 100).await, Scalar::Empty);
    assert_eq!(resolve(&session, 123, "ghost", 100).await, Scalar::Empty);
}

#[tokio::test]
async fn remote_errors_escape_the_core() {
    let client = MockClient {
        fail_display_value: true,
        ..MockClient::default()
    }
    .with_board(123, vec![number_column("numbers1")]);
    let (session, _client) = session(client);

    let result = session
        .resolve(BoardId::new(123), ColumnId::new("numbers1"), ItemId::new(100))
        .await;
    assert!(matches!(result, Err(ResolveError::Remote(_))));
}

#[tokio::test]
async fn cancellation_rejects_resolves() {
    let (handle, signal) = CancelHandle::new();
    let client = MockClient::default()
        .with_board(123, vec![number_column("numbers1")])
        .with_record(123, 100, "numbers1", number_record(42.0));
    let options = SessionOptions {
        cancel: Some(signal),
        ..SessionOptions::default()
    };
    let session = new_session(Arc::new(client), options);

    handle.cancel();
    let result = session
        .resolve(BoardId::new(123), ColumnId::new("numbers1"), ItemId::new(100))
        .await;
    assert!(matches!(result, Err(ResolveError::Cancelled)));
}

#[tokio::test]
async fn numeric_leaf_second_chance_fetch() {
    // The display-value record is empty, but the raw numbers payload has the
    // value.
    let client = MockClient::default()
        .with_board(123, vec![number_column("numbers1")])
        .with_raw(
            123,
            100,
            "numbers1",
            RawColumnValue::Number {
                number: Some(7.0),
                text: None,
            },
        );
    let (session, client) = session(client);

    assert_eq!(resolve(&session, 123, "numbers1", 100).await, Scalar::Number(7.0));
    assert_eq!(client.counters.display_value.load(Ordering::SeqCst), 1);
    assert_eq!(client.counters.item_columns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mirror_single_number_display_value_passes_through() {
    // A single number is the platform's already-aggregated result, even for
    // COUNT.
    let client = MockClient::default()
        .with_board(123, vec![mirror_column("mirror1", MirrorFunction::Count, 456, "numbers1")])
        .with_mirror(
            123,
            100,
            "mirror1",
            DeepMirrorRecord {
                display_value: Some("5".to_owned()),
                mirrored_items: Vec::new(),
            },
        );
    let (session, _client) = session(client);

    assert_eq!(resolve(&session, 123, "mirror1", 100).await, Scalar::Number(5.0));
}

#[tokio::test]
async fn mirror_numeric_recursion_aggregates_children() {
    let client = MockClient::default()
        .with_board(123, vec![mirror_column("mirror1", MirrorFunction::Sum, 456, "numbers1")])
        .with_board(456, vec![number_column("numbers1")])
        .with_mirror(
            123,
            100,
            "mirror1",
            DeepMirrorRecord {
                display_value: None,
                mirrored_items: vec![
                    LinkedItemRef {
                        board: BoardId::new(456),
                        item: ItemId::new(201),
                        name: "A".to_owned(),
                    },
                    LinkedItemRef {
                        board: BoardId::new(456),
                        item: ItemId::new(202),
                        name: "B".to_owned(),
                    },
                ],
            },
        )
        .with_record(456, 201, "numbers1", number_record(4.0))
        .with_record(456, 202, "numbers1", number_record(6.0));
    let (session, _client) = session(client);

    assert_eq!(resolve(&session, 123, "mirror1", 100).await, Scalar::Number(10.0));
}

#[tokio::test]
async fn flush_forces_pending_batches() {
    let client = Arc::new(
        MockClient::default()
            .with_board(
                123,
                vec![number_column("a"), formula_column("formula1", "{a} * 3")],
            )
            .with_raw(123, 100, "a", RawColumnValue::Number { number: Some(5.0), text: None }),
    );
    // A window far beyond the test's lifetime: only flush can close it.
    let options = SessionOptions {
        batch_window: Duration::from_secs(60),
        ..SessionOptions::default()
    };
    let session = Arc::new(new_session(client.clone(), options));

    let resolving = tokio::spawn({
        let session = Arc::clone(&session);
        async move { resolve(&session, 123, "formula1", 100).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(client.counters.item_columns.load(Ordering::SeqCst), 0);

    session.flush().await;
    assert_eq!(resolving.await.unwrap(), Scalar::Number(15.0));
    assert_eq!(client.counters.item_columns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn close_flushes_and_releases() {
    let client = MockClient::default()
        .with_board(123, vec![number_column("numbers1")])
        .with_record(123, 100, "numbers1", number_record(42.0));
    let (session, _client) = session(client);

    resolve(&session, 123, "numbers1", 100).await;
    session.close().await;
}
