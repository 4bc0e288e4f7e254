//! The strategy selector: a pure function over schema metadata that decides
//! which fetches are worth issuing. It only ever suppresses fetches whose
//! results the resolver would discard by contract, so it can change the
//! number of round-trips taken to reach an outcome but never the outcome.

use crate::schema::BoardSchema;
use formula_resolver_model::{ColumnDef, ColumnId};

/// How a formula's dependencies will be obtained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyPlan {
    /// Simple kinds, served by the request coordinator's multi-column query.
    pub coordinated: Vec<ColumnId>,
    /// Complex kinds (formula / mirror / lookup), requiring recursion.
    pub recursive: Vec<ColumnId>,
}

impl DependencyPlan {
    /// The platform's cached display value for the formula itself is worth
    /// probing as long as at least one dependency is simple; when every
    /// dependency is complex the platform cannot have computed it either.
    pub fn probe_display_value(&self) -> bool {
        !self.coordinated.is_empty()
    }
}

/// Splits a formula's dependencies into coordinator-served and recursive
/// sets. Dependencies missing from the schema stay with the coordinator,
/// which reports them as valueless; the resolver then degrades them to the
/// empty scalar.
pub fn classify_dependencies<'a>(
    schema: &BoardSchema,
    dependencies: impl IntoIterator<Item = &'a ColumnId>,
) -> DependencyPlan {
    let mut plan = DependencyPlan::default();
    for column in dependencies {
        let complex = schema
            .column(column)
            .is_some_and(|def| def.kind.is_complex());
        if complex {
            plan.recursive.push(column.clone());
        } else {
            plan.coordinated.push(column.clone());
        }
    }
    plan
}

/// Whether a mirror's display-value probe can return anything useful.
///
/// When the target column is itself a formula, mirror or lookup the platform
/// leaves the cached display value empty, so the probe is skipped outright.
/// Without the target board's schema the column-id prefix stands in as a
/// heuristic; the schema lookup the resolver performs later stays
/// authoritative.
pub fn mirror_probe_useful(mirror: &ColumnDef, target_schema: Option<&BoardSchema>) -> bool {
    let Some(target_column) = mirror.settings.primary_target_column() else {
        return true;
    };
    match target_schema.and_then(|schema| schema.column(target_column)) {
        Some(def) => !def.kind.is_complex(),
        None => !target_column.has_complex_prefix(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_resolver_model::{BoardId, ColumnKind, ColumnSettings, LinkedColumnTarget};

    fn schema() -> BoardSchema {
        BoardSchema::new(vec![
            ColumnDef::new("numbers1", "Numbers", ColumnKind::Number),
            ColumnDef::new("text1", "Text", ColumnKind::Text),
            ColumnDef::new("formula1", "Formula", ColumnKind::Formula),
            ColumnDef::new("mirror1", "Mirror", ColumnKind::Mirror),
        ])
    }

    fn mirror_def(target: &str) -> ColumnDef {
        ColumnDef::new("mirror1", "Mirror", ColumnKind::Mirror).with_settings(ColumnSettings {
            displayed_linked_columns: vec![LinkedColumnTarget {
                board_id: BoardId::new(456),
                column_ids: vec![ColumnId::new(target)],
            }],
            ..ColumnSettings::default()
        })
    }

    #[test]
    fn mixed_dependencies_split() {
        let schema = schema();
        let deps = [
            ColumnId::new("numbers1"),
            ColumnId::new("formula1"),
            ColumnId::new("text1"),
        ];
        let plan = classify_dependencies(&schema, &deps);
        assert_eq!(
            plan.coordinated,
            vec![ColumnId::new("numbers1"), ColumnId::new("text1")]
        );
        assert_eq!(plan.recursive, vec![ColumnId::new("formula1")]);
        assert!(plan.probe_display_value());
    }

    #[test]
    fn all_complex_skips_the_probe() {
        let schema = schema();
        let deps = [ColumnId::new("formula1"), ColumnId::new("mirror1")];
        let plan = classify_dependencies(&schema, &deps);
        assert!(plan.coordinated.is_empty());
        assert!(!plan.probe_display_value());
    }

    #[test]
    fn unknown_dependencies_stay_with_the_coordinator() {
        let schema = schema();
        let deps = [ColumnId::new("missing")];
        let plan = classify_dependencies(&schema, &deps);
        assert_eq!(plan.coordinated, vec![ColumnId::new("missing")]);
    }

    #[test]
    fn mirror_probe_uses_schema_when_available() {
        let schema = schema();
        assert!(mirror_probe_useful(&mirror_def("numbers1"), Some(&schema)));
        assert!(!mirror_probe_useful(&mirror_def("formula1"), Some(&schema)));
    }

    #[test]
    fn mirror_probe_falls_back_to_prefix_heuristic() {
        assert!(mirror_probe_useful(&mirror_def("numbers1"), None));
        assert!(!mirror_probe_useful(&mirror_def("formula_total"), None));
        assert!(!mirror_probe_useful(&mirror_def("lookup_2"), None));
    }
}
