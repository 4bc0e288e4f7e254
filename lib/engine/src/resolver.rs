//! The recursive resolver: kind dispatch, fast paths, dependency fan-out,
//! mirror recursion and cycle termination.

use crate::cancel::race_cancel;
use crate::client::LinkedItemRef;
use crate::columns::{extract_scalar, parse_numeric_list, record_scalar};
use crate::eval::{evaluate, Environment};
use crate::session::SessionInner;
use crate::strategy;
use formula_resolver_language as language;
use formula_resolver_language::Token;
use formula_resolver_model::{
    BoardId, ColumnDef, ColumnId, ColumnKind, ItemId, MirrorFunction, ResolutionKey,
    ResolveResult, Scalar,
};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The keys on the current resolution path. Threaded as an explicit
/// parameter: each recursion branch carries its own copy, so sibling branches
/// never observe each other's path.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallStack(FxHashSet<ResolutionKey>);

impl CallStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn contains(&self, key: &ResolutionKey) -> bool {
        self.0.contains(key)
    }

    fn with(&self, key: ResolutionKey) -> Self {
        let mut next = self.clone();
        next.0.insert(key);
        next
    }

    fn with_all(&self, keys: impl IntoIterator<Item = ResolutionKey>) -> Self {
        let mut next = self.clone();
        next.0.extend(keys);
        next
    }
}

/// What a re-entered key resolves to: the configured numeric default under a
/// numeric aggregation context, empty otherwise. Passed through explicitly,
/// never inferred globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CycleDefault {
    Numeric,
    Text,
}

fn cycle_break(inner: &SessionInner, default: CycleDefault) -> Scalar {
    match default {
        CycleDefault::Numeric => Scalar::Number(inner.options.cycle_break_numeric_default),
        CycleDefault::Text => Scalar::Empty,
    }
}

/// Resolves one key: cycle check, value cache, in-flight dedup, then the
/// actual computation. Boxed because the resolution of formulas and mirrors
/// recurses back into it.
pub(crate) fn resolve_key(
    inner: Arc<SessionInner>,
    key: ResolutionKey,
    stack: CallStack,
    default: CycleDefault,
) -> BoxFuture<'static, ResolveResult<Scalar>> {
    async move {
        if stack.contains(&key) {
            debug!(key = %key, "cycle detected");
            return Ok(cycle_break(&inner, default));
        }
        if let Some(hit) = inner.values.get(&key) {
            return Ok(hit);
        }
        let computation = inner.inflight.get_or_insert(&key, || {
            compute_value(Arc::clone(&inner), key.clone(), stack.with(key.clone()))
                .boxed()
                .shared()
        });
        let result = computation.await;
        if let Ok(value) = &result {
            inner.values.insert(key.clone(), value.clone());
        }
        inner.inflight.remove(&key);
        result
    }
    .boxed()
}

async fn compute_value(
    inner: Arc<SessionInner>,
    key: ResolutionKey,
    stack: CallStack,
) -> ResolveResult<Scalar> {
    let schema = match inner
        .schemas
        .board_schema(&inner.client, &inner.cancel, key.board)
        .await
    {
        Ok(schema) => schema,
        Err(error) if error.is_fatal() => return Err(error),
        Err(error) => {
            warn!(key = %key, %error, "board schema unavailable");
            return Ok(Scalar::Empty);
        }
    };
    let Some(def) = schema.column(&key.column).cloned() else {
        warn!(key = %key, "column not on board");
        return Ok(Scalar::Empty);
    };

    let value = match def.kind {
        ColumnKind::Formula => resolve_formula(&inner, &key, &def, &schema, &stack).await?,
        ColumnKind::Mirror => {
            let mut values =
                resolve_mirrors(&inner, key.board, &def, vec![key.item], &stack).await?;
            values.remove(&key.item).unwrap_or(Scalar::Empty)
        }
        _ => resolve_leaf(&inner, &key, &def).await?,
    };
    if inner.options.debug_log {
        debug!(key = %key, kind = %def.kind, value = %value, "resolved");
    }
    Ok(value)
}

/// Leaf columns: the display-value fast path, with a second-chance fetch of
/// the raw numeric payload when a numeric column comes back empty.
async fn resolve_leaf(
    inner: &Arc<SessionInner>,
    key: &ResolutionKey,
    def: &ColumnDef,
) -> ResolveResult<Scalar> {
    let record = race_cancel(
        &inner.cancel,
        inner.client.display_value(key.board, key.item, &key.column),
    )
    .await?;
    let mut value = record_scalar(&def.kind, &record);
    if value.is_empty() && def.kind.is_numeric() {
        if let Some(raw) = Arc::clone(&inner.coordinator)
            .request(key.board, key.item, key.column.clone())
            .await?
        {
            value = extract_scalar(&def.kind, &raw, &def.settings);
        }
        if value.is_empty() {
            value = Scalar::Number(0.0);
        }
    }
    Ok(value)
}

async fn resolve_formula(
    inner: &Arc<SessionInner>,
    key: &ResolutionKey,
    def: &ColumnDef,
    schema: &crate::schema::BoardSchema,
    stack: &CallStack,
) -> ResolveResult<Scalar> {
    let Some(source) = def.settings.formula.as_deref() else {
        warn!(key = %key, "formula column without formula settings");
        return Ok(Scalar::Empty);
    };
    let tokens = language::tokenize(source);
    for warning in &tokens.warnings {
        warn!(key = %key, position = warning.position, message = %warning.message,
            "formula tokenizer recovered");
    }
    let expr = match language::parse_stream(&tokens) {
        Ok(expr) => expr,
        Err(error) => {
            warn!(key = %key, %error, "formula failed to parse");
            return Ok(Scalar::Empty);
        }
    };

    // Dependency inventory in token order.
    let dependencies: Vec<ColumnId> = tokens
        .tokens
        .iter()
        .filter_map(|spanned| match &spanned.token {
            Token::ColumnRef { column, .. } => Some(column.clone()),
            _ => None,
        })
        .unique()
        .collect();
    if dependencies.is_empty() {
        return Ok(evaluate(&expr, &Environment::new(), &inner.fn_ctx));
    }

    let plan = strategy::classify_dependencies(schema, &dependencies);
    if plan.probe_display_value() {
        let record = race_cancel(
            &inner.cancel,
            inner.client.display_value(key.board, key.item, &key.column),
        )
        .await?;
        if let Some(cached) = numeric_display_value(record.display_value.as_deref()) {
            debug!(key = %key, value = cached, "formula display-value fast path");
            return Ok(Scalar::Number(cached));
        }
    }

    // Fan out: simple dependencies through the coordinator, complex ones
    // through recursion, all in parallel.
    let mut lookups: Vec<BoxFuture<'static, ResolveResult<(ColumnId, Scalar)>>> = Vec::new();
    for column in plan.coordinated {
        let inner = Arc::clone(inner);
        let stack = stack.clone();
        let dep_def = schema.column(&column).cloned();
        let (board, item) = (key.board, key.item);
        lookups.push(
            async move {
                let raw = Arc::clone(&inner.coordinator)
                    .request(board, item, column.clone())
                    .await?;
                let mut value = match (&raw, &dep_def) {
                    (Some(raw), Some(def)) => extract_scalar(&def.kind, raw, &def.settings),
                    _ => Scalar::Empty,
                };
                if value.is_empty() {
                    // The coordinator came back empty; recursion is the
                    // authoritative fallback.
                    let dep_key = ResolutionKey::new(board, column.clone(), item);
                    value = resolve_key(inner, dep_key, stack, CycleDefault::Numeric).await?;
                }
                Ok((column, value))
            }
            .boxed(),
        );
    }
    for column in plan.recursive {
        let dep_key = ResolutionKey::new(key.board, column.clone(), key.item);
        lookups.push(
            resolve_key(
                Arc::clone(inner),
                dep_key,
                stack.clone(),
                CycleDefault::Numeric,
            )
            .map(move |result| result.map(|value| (column, value)))
            .boxed(),
        );
    }

    let mut env = Environment::new();
    for result in join_all(lookups).await {
        let (column, value) = result?;
        env.insert(column, value);
    }
    Ok(evaluate(&expr, &env, &inner.fn_ctx))
}

/// A display value that is a plain number after trimming.
fn numeric_display_value(display_value: Option<&str>) -> Option<f64> {
    let trimmed = display_value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// The mirror fast path over the platform's cached display value.
///
/// A comma-separated numeric list is the raw linked values, so the
/// aggregation applies; a single number is the platform's already-aggregated
/// result and passes through; any other non-empty text is a text mirror.
fn mirror_fast_path(function: MirrorFunction, display_value: Option<&str>) -> Option<Scalar> {
    let dv = display_value?.trim();
    if dv.is_empty() {
        return None;
    }
    if let Some(numbers) = parse_numeric_list(dv) {
        if numbers.len() > 1 {
            return Some(Scalar::Number(function.apply(&numbers)));
        }
        return Some(Scalar::Number(numbers[0]));
    }
    if function.is_numeric() {
        // Likely a data-quality edge: a numeric aggregation over a
        // non-numeric display value returns the text unchanged.
        warn!(?function, "non-numeric mirror display value under numeric aggregation");
    }
    Some(Scalar::text(dv.to_owned()))
}

fn aggregate_mirror(function: MirrorFunction, children: &[Scalar]) -> Scalar {
    let present: Vec<&Scalar> = children.iter().filter(|c| !c.is_empty()).collect();
    if present.is_empty() {
        return if function.is_numeric() {
            Scalar::Number(0.0)
        } else {
            Scalar::Empty
        };
    }
    if function.is_numeric() {
        let numbers: Option<Vec<f64>> = present.iter().map(|c| c.to_number()).collect();
        if let Some(numbers) = numbers {
            return Scalar::Number(function.apply(&numbers));
        }
    }
    Scalar::text(present.iter().map(|c| c.to_display()).join(", "))
}

/// Resolves a mirror column for a group of items: concurrent deep-mirror
/// fetches, the fast-path outcomes, then one nested batched resolution per
/// target board for whatever needs recursion.
async fn resolve_mirrors(
    inner: &Arc<SessionInner>,
    board: BoardId,
    def: &ColumnDef,
    items: Vec<ItemId>,
    stack: &CallStack,
) -> ResolveResult<HashMap<ItemId, Scalar>> {
    let function = def.settings.function;
    let records = join_all(items.iter().map(|&item| {
        let inner = Arc::clone(inner);
        let column = def.id.clone();
        async move {
            race_cancel(
                &inner.cancel,
                inner.client.deep_mirror(board, item, &column),
            )
            .await
            .map(|record| (item, record))
        }
    }))
    .await;

    let mut out = HashMap::new();
    let mut recursive: Vec<(ItemId, Vec<LinkedItemRef>)> = Vec::new();
    for record in records {
        let (item, record) = record?;
        match mirror_fast_path(function, record.display_value.as_deref()) {
            Some(value) => {
                out.insert(item, value);
            }
            None => recursive.push((item, record.mirrored_items)),
        }
    }
    if recursive.is_empty() {
        return Ok(out);
    }

    let Some(target_column) = def.settings.primary_target_column().cloned() else {
        warn!(column = %def.id, "mirror without a displayed linked column");
        for (item, _) in recursive {
            out.insert(item, aggregate_mirror(function, &[]));
        }
        return Ok(out);
    };

    let child_default = if function.is_numeric() {
        CycleDefault::Numeric
    } else {
        CycleDefault::Text
    };
    // The whole group recurses under the union of its parent keys; a target
    // key colliding with one of them is a self-referential mirror.
    let nested_stack = stack.with_all(
        recursive
            .iter()
            .map(|(item, _)| ResolutionKey::new(board, def.id.clone(), *item)),
    );

    let mut groups: HashMap<BoardId, Vec<ItemId>> = HashMap::new();
    for (_, linked) in &recursive {
        for link in linked {
            let ids = groups.entry(link.board).or_default();
            if !ids.contains(&link.item) {
                ids.push(link.item);
            }
        }
    }

    let group_results = join_all(groups.into_iter().map(|(target_board, ids)| {
        let inner = Arc::clone(inner);
        let column = target_column.clone();
        let nested_stack = nested_stack.clone();
        async move {
            resolve_batch(inner, target_board, column, ids, nested_stack, child_default)
                .await
                .map(|values| (target_board, values))
        }
    }))
    .await;

    let mut resolved: HashMap<(BoardId, ItemId), Scalar> = HashMap::new();
    for result in group_results {
        let (target_board, values) = result?;
        for (item, value) in values {
            resolved.insert((target_board, item), value);
        }
    }

    // Text aggregation preserves the upstream linked-item order.
    for (item, linked) in recursive {
        let children: Vec<Scalar> = linked
            .iter()
            .map(|link| {
                resolved
                    .get(&(link.board, link.item))
                    .cloned()
                    .unwrap_or(Scalar::Empty)
            })
            .collect();
        out.insert(item, aggregate_mirror(function, &children));
    }
    Ok(out)
}

/// Resolves one column across many items: value-cache and cycle settlement,
/// a batched display-value probe where the strategy allows one, then the
/// single-item algorithm over the residual set (grouped, for mirrors).
pub(crate) fn resolve_batch(
    inner: Arc<SessionInner>,
    board: BoardId,
    column: ColumnId,
    items: Vec<ItemId>,
    stack: CallStack,
    default: CycleDefault,
) -> BoxFuture<'static, ResolveResult<HashMap<ItemId, Scalar>>> {
    async move {
        let mut out = HashMap::new();
        let mut residual: Vec<ItemId> = Vec::new();
        let mut seen = FxHashSet::default();
        for item in items {
            if !seen.insert(item) {
                continue;
            }
            let key = ResolutionKey::new(board, column.clone(), item);
            if stack.contains(&key) {
                out.insert(item, cycle_break(&inner, default));
            } else if let Some(hit) = inner.values.get(&key) {
                out.insert(item, hit);
            } else {
                residual.push(item);
            }
        }
        if residual.is_empty() {
            return Ok(out);
        }

        let schema = match inner
            .schemas
            .board_schema(&inner.client, &inner.cancel, board)
            .await
        {
            Ok(schema) => schema,
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                warn!(%board, %error, "board schema unavailable");
                for item in residual {
                    out.insert(item, Scalar::Empty);
                }
                return Ok(out);
            }
        };
        let Some(def) = schema.column(&column).cloned() else {
            warn!(%board, %column, "column not on board");
            for item in residual {
                out.insert(item, Scalar::Empty);
            }
            return Ok(out);
        };

        let probe = match def.kind {
            ColumnKind::Formula => def
                .settings
                .formula
                .as_deref()
                .map(language::extract_column_ids)
                .is_some_and(|deps| {
                    !deps.is_empty()
                        && strategy::classify_dependencies(&schema, &deps).probe_display_value()
                }),
            ColumnKind::Mirror => {
                let target_schema = def
                    .settings
                    .primary_target()
                    .and_then(|target| inner.schemas.peek(target.board_id));
                strategy::mirror_probe_useful(&def, target_schema.as_deref())
            }
            _ => true,
        };

        if probe {
            for chunk in residual.chunks(100) {
                let records = race_cancel(
                    &inner.cancel,
                    inner.client.display_values(board, chunk, &column),
                )
                .await?;
                for &item in chunk {
                    let Some(record) = records.get(&item) else {
                        continue;
                    };
                    let value = match def.kind {
                        ColumnKind::Formula => {
                            numeric_display_value(record.display_value.as_deref())
                                .map(Scalar::Number)
                        }
                        ColumnKind::Mirror => {
                            mirror_fast_path(def.settings.function, record.display_value.as_deref())
                        }
                        _ => {
                            let value = record_scalar(&def.kind, record);
                            (!value.is_empty()).then_some(value)
                        }
                    };
                    if let Some(value) = value {
                        inner
                            .values
                            .insert(ResolutionKey::new(board, column.clone(), item), value.clone());
                        out.insert(item, value);
                    }
                }
            }
            residual.retain(|item| !out.contains_key(item));
            if residual.is_empty() {
                return Ok(out);
            }
        }

        if def.kind == ColumnKind::Mirror {
            let resolved = resolve_mirrors(&inner, board, &def, residual, &stack).await?;
            for (item, value) in resolved {
                inner
                    .values
                    .insert(ResolutionKey::new(board, column.clone(), item), value.clone());
                out.insert(item, value);
            }
        } else {
            let results = join_all(residual.iter().map(|&item| {
                resolve_key(
                    Arc::clone(&inner),
                    ResolutionKey::new(board, column.clone(), item),
                    stack.clone(),
                    default,
                )
                .map(move |result| result.map(|value| (item, value)))
            }))
            .await;
            for result in results {
                let (item, value) = result?;
                out.insert(item, value);
            }
        }
        Ok(out)
    }
    .boxed()
}
