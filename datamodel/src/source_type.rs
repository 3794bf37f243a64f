//! Source classification for transformation-query expressions.

/// Buckets an M expression by the first connector fingerprint it contains.
///
/// The rules are ordered; the first substring hit wins and anything
/// unrecognised lands in `"Other"`.
///
/// # Examples
///
/// ```
/// use pbix_extract_datamodel::classify_source_expression;
///
/// let m = r#"let Source = Sql.Database("srv", "db") in Source"#;
/// assert_eq!(classify_source_expression(m), "SQL Database");
/// assert_eq!(classify_source_expression("1 + 1"), "Other");
/// ```
pub fn classify_source_expression(expression: &str) -> &'static str {
    const RULES: &[(&str, &str)] = &[
        ("Excel.Workbook", "Excel"),
        ("AzureStorage.BlobContents", "Azure Blob Storage"),
        ("Table.FromRows", "Embedded Table"),
        ("Sql.Database", "SQL Database"),
        ("Web.Contents", "Web Source"),
    ];

    for (needle, label) in RULES {
        if expression.contains(needle) {
            return label;
        }
    }
    "Other"
}
