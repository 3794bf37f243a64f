//! The collaborator contract and fault-folding collection.
//!
//! Real data-model extraction happens in an external library; this crate
//! only defines the seam. A [`DataModelProvider`] exposes one call per
//! category, each independently fallible, and [`collect_bundle`] drives all
//! six calls, trading each failure for a [`RunIssue`] and an empty
//! category. A broken model section must never abort UI extraction.

use pbix_extract_core::{IssueKind, RunIssue};

use crate::bundle::{
    CalculatedColumn, CalculatedTable, DataModelBundle, Measure, Relationship, SourceQuery,
    TableInfo,
};
use crate::error::Result;

/// One call per data-model category; every call may fail on its own.
///
/// Default implementations return empty results, so a provider only
/// implements the categories its backing library can produce.
pub trait DataModelProvider {
    /// Model tables.
    fn tables(&self) -> Result<Vec<TableInfo>> {
        Ok(Vec::new())
    }

    /// Calculated (DAX) measures.
    fn measures(&self) -> Result<Vec<Measure>> {
        Ok(Vec::new())
    }

    /// Calculated (DAX) columns.
    fn calculated_columns(&self) -> Result<Vec<CalculatedColumn>> {
        Ok(Vec::new())
    }

    /// Calculated (DAX) tables.
    fn calculated_tables(&self) -> Result<Vec<CalculatedTable>> {
        Ok(Vec::new())
    }

    /// Relationships between model tables.
    fn relationships(&self) -> Result<Vec<Relationship>> {
        Ok(Vec::new())
    }

    /// Transformation-query (M) source expressions.
    fn source_queries(&self) -> Result<Vec<SourceQuery>> {
        Ok(Vec::new())
    }
}

/// An already-loaded bundle acts as its own (infallible) provider.
impl DataModelProvider for DataModelBundle {
    fn tables(&self) -> Result<Vec<TableInfo>> {
        Ok(self.tables.clone())
    }

    fn measures(&self) -> Result<Vec<Measure>> {
        Ok(self.measures.clone())
    }

    fn calculated_columns(&self) -> Result<Vec<CalculatedColumn>> {
        Ok(self.calculated_columns.clone())
    }

    fn calculated_tables(&self) -> Result<Vec<CalculatedTable>> {
        Ok(self.calculated_tables.clone())
    }

    fn relationships(&self) -> Result<Vec<Relationship>> {
        Ok(self.relationships.clone())
    }

    fn source_queries(&self) -> Result<Vec<SourceQuery>> {
        Ok(self.source_queries.clone())
    }
}

/// Drives every provider call, folding failures into issues.
///
/// A failed call leaves its category empty and records one
/// [`IssueKind::CollaboratorFailure`] issue; successful categories are
/// unaffected.
///
/// # Examples
///
/// ```
/// use pbix_extract_datamodel::{DataModelBundle, collect_bundle};
///
/// let (bundle, issues) = collect_bundle(&DataModelBundle::default());
/// assert!(bundle.is_empty());
/// assert!(issues.is_empty());
/// ```
pub fn collect_bundle(provider: &dyn DataModelProvider) -> (DataModelBundle, Vec<RunIssue>) {
    let mut bundle = DataModelBundle::default();
    let mut issues = Vec::new();

    let mut fold = |category: &str, outcome: std::result::Result<(), String>| {
        if let Err(detail) = outcome {
            issues.push(RunIssue::new(
                category,
                IssueKind::CollaboratorFailure,
                &detail,
            ));
        }
    };

    fold(
        "tables",
        provider
            .tables()
            .map(|rows| bundle.tables = rows)
            .map_err(|e| e.to_string()),
    );
    fold(
        "measures",
        provider
            .measures()
            .map(|rows| bundle.measures = rows)
            .map_err(|e| e.to_string()),
    );
    fold(
        "calculated_columns",
        provider
            .calculated_columns()
            .map(|rows| bundle.calculated_columns = rows)
            .map_err(|e| e.to_string()),
    );
    fold(
        "calculated_tables",
        provider
            .calculated_tables()
            .map(|rows| bundle.calculated_tables = rows)
            .map_err(|e| e.to_string()),
    );
    fold(
        "relationships",
        provider
            .relationships()
            .map(|rows| bundle.relationships = rows)
            .map_err(|e| e.to_string()),
    );
    fold(
        "source_queries",
        provider
            .source_queries()
            .map(|rows| bundle.source_queries = rows)
            .map_err(|e| e.to_string()),
    );

    (bundle, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataModelError;

    /// Fails the measure call only; everything else succeeds.
    struct FlakyProvider;

    impl DataModelProvider for FlakyProvider {
        fn tables(&self) -> Result<Vec<TableInfo>> {
            Ok(vec![TableInfo { name: "Sales".into() }])
        }

        fn measures(&self) -> Result<Vec<Measure>> {
            Err(DataModelError::ProviderFailure {
                category: "measures",
                detail: "model section unreadable".into(),
            })
        }

        fn relationships(&self) -> Result<Vec<Relationship>> {
            Ok(vec![Relationship {
                from_table: "Sales".into(),
                from_column: "ProductId".into(),
                to_table: "Products".into(),
                to_column: "Id".into(),
                cardinality: None,
                is_active: true,
            }])
        }
    }

    #[test]
    fn test_collect_folds_failures_into_issues() {
        let (bundle, issues) = collect_bundle(&FlakyProvider);

        assert_eq!(bundle.tables.len(), 1);
        assert_eq!(bundle.relationships.len(), 1);
        assert!(bundle.measures.is_empty());

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CollaboratorFailure);
        assert_eq!(issues[0].member, "measures");
        assert!(issues[0].detail.contains("unreadable"));
    }

    #[test]
    fn test_bundle_is_its_own_provider() {
        let mut source = DataModelBundle::default();
        source.tables.push(TableInfo { name: "Dates".into() });

        let (bundle, issues) = collect_bundle(&source);
        assert_eq!(bundle, source);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_default_provider_yields_empty_bundle() {
        struct Inert;
        impl DataModelProvider for Inert {}

        let (bundle, issues) = collect_bundle(&Inert);
        assert!(bundle.is_empty());
        assert!(issues.is_empty());
    }
}
