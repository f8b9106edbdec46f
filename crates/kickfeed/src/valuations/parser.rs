use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use super::types::{ColumnRole, ResolvedColumns};
use crate::table::{RawTable, elem_text, normalize_whitespace};
use crate::types::DataTable;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no tabular data found in document")]
    NoTableFound,
    #[error("selected table has {0} column(s), need at least 3 for the positional club fallback")]
    MissingClubColumn(usize),
}

static RE_EURO_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)€\s*([0-9]*\.?[0-9]+)\s*([mb])").expect("invalid regex: euro amount")
});

static RE_VALUE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Value \d{2}/\d{2}/\d{4}$").expect("invalid regex: value date")
});

const FOOTER_MARKER: &str = "total value of all clubs";

const TITLE_SNIPPET_CHARS: usize = 120;

/// Full extraction pass over a parsed document: pick the valuation table,
/// drop the totals footer, resolve column roles and derive numeric euro
/// columns from the currency-formatted string fields.
pub fn extract_club_values(tables: &[RawTable]) -> Result<DataTable, ExtractError> {
    let selected = select_table(tables)?;
    let data = strip_footer_rows(selected);
    let resolved = resolve_columns(&data)?;

    let mut columns: Vec<String> = Vec::new();
    let mut source_indexes: Vec<usize> = Vec::new();
    for (role, label) in resolved.in_order() {
        if let Some(idx) = data.column_index(label) {
            columns.push(role.as_str().to_string());
            source_indexes.push(idx);
        }
    }

    let mut derived: Vec<(&str, usize)> = Vec::new();
    if let Some(label) = &resolved.current_value
        && let Some(idx) = data.column_index(label)
    {
        derived.push(("current_value_eur", idx));
    }
    if let Some(label) = &resolved.value_on_date
        && let Some(idx) = data.column_index(label)
    {
        derived.push(("value_on_date_eur", idx));
    }
    columns.extend(derived.iter().map(|(name, _)| name.to_string()));

    let rows = data
        .rows
        .iter()
        .map(|row| {
            let mut cells: Vec<Value> = source_indexes
                .iter()
                .map(|&idx| match row.get(idx) {
                    Some(Some(text)) => Value::String(text.clone()),
                    _ => Value::Null,
                })
                .collect();
            for (_, idx) in &derived {
                let amount = row
                    .get(*idx)
                    .and_then(|cell| cell.as_deref())
                    .and_then(euro_to_number);
                cells.push(match amount {
                    Some(amount) => Value::from(amount),
                    None => Value::Null,
                });
            }
            cells
        })
        .collect();

    Ok(DataTable { columns, rows })
}

/// Pick the one table holding current club valuations.
///
/// Primary criterion: a column labeled "current value" (trimmed,
/// case-insensitive). Fallback: the table with the most cells, first
/// occurrence winning ties, since the source sometimes reorders its tables.
pub fn select_table(tables: &[RawTable]) -> Result<&RawTable, ExtractError> {
    if tables.is_empty() {
        return Err(ExtractError::NoTableFound);
    }

    if let Some(table) = tables.iter().find(|t| has_current_value_column(t)) {
        log::debug!("table selected by current-value column");
        return Ok(table);
    }

    let mut best = &tables[0];
    for table in &tables[1..] {
        if table.size() > best.size() {
            best = table;
        }
    }
    log::debug!("table selected by size fallback ({} cells)", best.size());
    Ok(best)
}

fn has_current_value_column(table: &RawTable) -> bool {
    table
        .headers
        .iter()
        .any(|h| h.trim().eq_ignore_ascii_case("current value"))
}

/// Remove the totals footer. Conservative on purpose: only rows carrying the
/// footer marker go, so no legitimate club row is ever lost.
pub fn strip_footer_rows(table: &RawTable) -> RawTable {
    let rows = table
        .rows
        .iter()
        .filter(|row| {
            !row.iter()
                .flatten()
                .any(|cell| cell.to_lowercase().contains(FOOTER_MARKER))
        })
        .cloned()
        .collect();

    RawTable {
        headers: table.headers.clone(),
        rows,
    }
}

/// Map raw header labels onto the stable roles. Each role is resolved by its
/// own ordered strategy list, independent of the others.
pub fn resolve_columns(table: &RawTable) -> Result<ResolvedColumns, ExtractError> {
    Ok(ResolvedColumns {
        club: resolve_club(table)?,
        league: resolve_league(table),
        value_on_date: resolve_value_on_date(table),
        current_value: resolve_current_value(table),
        pct_change: resolve_pct_change(table),
    })
}

fn resolve_club(table: &RawTable) -> Result<String, ExtractError> {
    if let Some(label) = table.headers.iter().find(|h| *h == "Club") {
        log::debug!("club column resolved by exact label");
        return Ok(label.clone());
    }

    // Structural fallback for label drift: the source lays rows out as
    // crest, rank, club name, so the third column is taken on faith.
    if table.width() < 3 {
        return Err(ExtractError::MissingClubColumn(table.width()));
    }
    log::debug!("club column resolved by positional fallback (index 2)");
    Ok(table.headers[2].clone())
}

fn resolve_league(table: &RawTable) -> Option<String> {
    // "Club.1" is only trusted when its contents vote for it; the suffix
    // convention gets reused by unrelated duplicate columns.
    if let Some(idx) = table.column_index("Club.1") {
        let cells: Vec<&str> = table.column(idx).flatten().collect();
        let hits = cells
            .iter()
            .filter(|cell| cell.contains("Premier League"))
            .count();
        if !cells.is_empty() && hits * 2 > cells.len() {
            log::debug!(
                "league column resolved by Club.1 content vote ({hits}/{} cells)",
                cells.len()
            );
            return Some("Club.1".to_string());
        }
    }

    let fallback = table.headers.iter().find(|h| *h == "League").cloned();
    if fallback.is_some() {
        log::debug!("league column resolved by exact label");
    }
    fallback
}

fn resolve_value_on_date(table: &RawTable) -> Option<String> {
    let found = table
        .headers
        .iter()
        .find(|h| RE_VALUE_DATE.is_match(h))
        .cloned();
    if let Some(label) = &found {
        log::debug!("value_on_date column resolved by date pattern: {label}");
    }
    found
}

fn resolve_current_value(table: &RawTable) -> Option<String> {
    let found = table
        .headers
        .iter()
        .find(|h| h.trim().eq_ignore_ascii_case("current value"))
        .cloned();
    if found.is_some() {
        log::debug!("current_value column resolved by case-insensitive label");
    }
    found
}

fn resolve_pct_change(table: &RawTable) -> Option<String> {
    let found = table.headers.iter().find(|h| h.trim() == "%").cloned();
    if found.is_some() {
        log::debug!("pct_change column resolved by exact label");
    }
    found
}

/// Convert a locale-formatted euro string to a plain amount, e.g.
/// "€1.25m" → 1_250_000.0. Anything off-grammar is `None`, never an error:
/// absence of a parseable value must not be conflated with zero, and the
/// upstream format carries no guarantees.
pub fn euro_to_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }

    let s = s.replace(',', "");
    let caps = RE_EURO_AMOUNT.captures(&s)?;
    let amount: f64 = caps[1].parse().ok()?;

    match caps[2].to_ascii_lowercase().as_str() {
        "m" => Some(amount * 1_000_000.0),
        "b" => Some(amount * 1_000_000_000.0),
        _ => None,
    }
}

/// `<title>` text, whitespace-normalized and clipped for the metadata file.
pub fn parse_page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_sel = Selector::parse("title").unwrap();

    let title = normalize_whitespace(&elem_text(document.select(&title_sel).next()?));
    (!title.is_empty()).then(|| title.chars().take(TITLE_SNIPPET_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_tables;
    use serde_json::json;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                        .collect()
                })
                .collect(),
        }
    }

    #[test]
    fn test_euro_to_number_millions() {
        assert_eq!(euro_to_number("€1.25m"), Some(1_250_000.0));
    }

    #[test]
    fn test_euro_to_number_billions() {
        assert_eq!(euro_to_number("€2b"), Some(2_000_000_000.0));
    }

    #[test]
    fn test_euro_to_number_strips_thousands_separators() {
        assert_eq!(euro_to_number("€1,234.5m"), Some(1_234_500_000.0));
    }

    #[test]
    fn test_euro_to_number_is_case_insensitive_and_trims() {
        assert_eq!(euro_to_number("  €3.5M "), Some(3_500_000.0));
        assert_eq!(euro_to_number("€ 2 B"), Some(2_000_000_000.0));
    }

    #[test]
    fn test_euro_to_number_rejects_missing_values() {
        assert_eq!(euro_to_number("-"), None);
        assert_eq!(euro_to_number(""), None);
        assert_eq!(euro_to_number("   "), None);
    }

    #[test]
    fn test_euro_to_number_requires_magnitude_suffix() {
        // A bare amount has no suffix and is out of grammar, not zero.
        assert_eq!(euro_to_number("€900,000"), None);
    }

    #[test]
    fn test_euro_to_number_requires_euro_sign() {
        assert_eq!(euro_to_number("1.2m"), None);
        assert_eq!(euro_to_number("£1.2m"), None);
    }

    #[test]
    fn test_select_table_prefers_current_value_column() {
        let big = table(
            &["A", "B", "C"],
            &[&["1", "2", "3"], &["4", "5", "6"], &["7", "8", "9"]],
        );
        let small = table(&["Club", "Current value"], &[&["Arsenal", "€1.2b"]]);
        let tables = vec![big, small];

        let selected = select_table(&tables).expect("Should select a table");
        assert_eq!(
            selected, &tables[1],
            "The current-value column beats raw size"
        );
    }

    #[test]
    fn test_select_table_falls_back_to_largest() {
        let small = table(&["A"], &[&["1"]]);
        let big = table(&["A", "B"], &[&["1", "2"], &["3", "4"]]);
        let tables = vec![small, big];

        let selected = select_table(&tables).expect("Should select a table");
        assert_eq!(selected, &tables[1]);
    }

    #[test]
    fn test_select_table_ties_break_to_first_in_document_order() {
        let first = table(&["A", "B"], &[&["1", "2"]]);
        let second = table(&["C", "D"], &[&["3", "4"]]);
        let tables = vec![first, second];

        let selected = select_table(&tables).expect("Should select a table");
        assert_eq!(selected, &tables[0]);
    }

    #[test]
    fn test_select_table_with_no_tables_is_fatal() {
        assert!(matches!(
            select_table(&[]),
            Err(ExtractError::NoTableFound)
        ));
    }

    #[test]
    fn test_strip_footer_rows_drops_only_the_totals_row() {
        let input = table(
            &["Club", "Current value"],
            &[
                &["Arsenal", "€1.2b"],
                &["Total value of all clubs: €11b", ""],
                &["Chelsea", "€900.5m"],
            ],
        );

        let filtered = strip_footer_rows(&input);
        assert_eq!(filtered.rows.len(), 2);
        assert_eq!(filtered.rows[0][0], Some("Arsenal".to_string()));
        assert_eq!(filtered.rows[1][0], Some("Chelsea".to_string()));
    }

    #[test]
    fn test_strip_footer_rows_is_case_insensitive() {
        let input = table(
            &["Club"],
            &[&["TOTAL VALUE OF ALL CLUBS"], &["Arsenal"]],
        );

        assert_eq!(strip_footer_rows(&input).rows.len(), 1);
    }

    #[test]
    fn test_strip_footer_rows_keeps_everything_else() {
        let input = table(&["Club"], &[&["Arsenal"], &[""], &["Chelsea"]]);

        assert_eq!(
            strip_footer_rows(&input).rows.len(),
            3,
            "Only the totals footer is ever dropped"
        );
    }

    #[test]
    fn test_club_resolves_by_exact_label() {
        let input = table(&["Rank", "Club", "Current value"], &[]);
        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(resolved.club, "Club");
    }

    #[test]
    fn test_club_falls_back_to_third_column() {
        let input = table(&["0", "1", "2", "3"], &[]);
        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(resolved.club, "2");
    }

    #[test]
    fn test_club_fallback_needs_three_columns() {
        let input = table(&["A", "B"], &[]);
        assert!(matches!(
            resolve_columns(&input),
            Err(ExtractError::MissingClubColumn(2))
        ));
    }

    #[test]
    fn test_league_resolves_by_majority_vote() {
        let rows: Vec<&[&str]> = vec![
            &["x", "y", "Arsenal", "Premier League"],
            &["x", "y", "Chelsea", "Premier League"],
            &["x", "y", "Leeds United", "Premier League"],
            &["x", "y", "Burnley", "Premier League"],
            &["x", "y", "Sunderland", "Championship"],
        ];
        let input = table(&["0", "1", "Club", "Club.1"], &rows);

        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(resolved.league, Some("Club.1".to_string()));
    }

    #[test]
    fn test_league_vote_failure_falls_through() {
        let rows: Vec<&[&str]> = vec![
            &["x", "y", "Arsenal", "Premier League"],
            &["x", "y", "Chelsea", "1st"],
            &["x", "y", "Leeds United", "2nd"],
            &["x", "y", "Burnley", "3rd"],
            &["x", "y", "Sunderland", "4th"],
        ];
        let input = table(&["0", "1", "Club", "Club.1"], &rows);

        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(
            resolved.league, None,
            "A mislabeled duplicate column must not pass as the league"
        );
    }

    #[test]
    fn test_league_vote_over_half_is_strict() {
        // Exactly 50% must not pass.
        let rows: Vec<&[&str]> = vec![
            &["x", "y", "Arsenal", "Premier League"],
            &["x", "y", "Chelsea", "1st"],
        ];
        let input = table(&["0", "1", "Club", "Club.1"], &rows);

        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(resolved.league, None);
    }

    #[test]
    fn test_league_vote_ignores_null_cells() {
        let rows: Vec<&[&str]> = vec![
            &["x", "y", "Arsenal", "Premier League"],
            &["x", "y", "Chelsea", "Premier League"],
            &["x", "y", "Leeds United", ""],
            &["x", "y", "Burnley", ""],
            &["x", "y", "Sunderland", ""],
        ];
        let input = table(&["0", "1", "Club", "Club.1"], &rows);

        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(
            resolved.league,
            Some("Club.1".to_string()),
            "The vote runs over non-null cells only"
        );
    }

    #[test]
    fn test_league_falls_back_to_league_label() {
        let input = table(&["Rank", "Crest", "Club", "League"], &[]);
        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(resolved.league, Some("League".to_string()));
    }

    #[test]
    fn test_value_on_date_matches_date_pattern() {
        let input = table(&["Rank", "Crest", "Club", "Value 30/06/2025"], &[]);
        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(resolved.value_on_date, Some("Value 30/06/2025".to_string()));
    }

    #[test]
    fn test_value_on_date_rejects_near_misses() {
        let input = table(
            &["Rank", "Crest", "Club", "Value 3/06/2025", "Value history"],
            &[],
        );
        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(resolved.value_on_date, None, "Day must be two digits");
    }

    #[test]
    fn test_current_value_is_case_insensitive() {
        let input = table(&["Rank", "Crest", "Club", "CURRENT VALUE"], &[]);
        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(resolved.current_value, Some("CURRENT VALUE".to_string()));
    }

    #[test]
    fn test_pct_change_requires_exact_percent_label() {
        let input = table(&["Rank", "Crest", "Club", "%", "% change"], &[]);
        let resolved = resolve_columns(&input).expect("Should resolve");
        assert_eq!(resolved.pct_change, Some("%".to_string()));
    }

    #[test]
    fn test_extract_club_values_end_to_end() {
        let html = r#"
            <table>
                <tr>
                    <th>Rank</th><th>Crest</th><th>Club</th><th>Club</th>
                    <th>Value 30/06/2025</th><th>Current value</th><th>%</th>
                </tr>
                <tr>
                    <td>1</td><td></td><td>Arsenal</td><td>Premier League</td>
                    <td>€1.1b</td><td>€1.25b</td><td>+13.6%</td>
                </tr>
                <tr>
                    <td>2</td><td></td><td>Chelsea</td><td>Premier League</td>
                    <td>-</td><td>€980.5m</td><td>-</td>
                </tr>
                <tr>
                    <td colspan="7">Total value of all clubs: €11.2b</td>
                </tr>
            </table>
        "#;

        let tables = parse_tables(html);
        let clean = extract_club_values(&tables).expect("Extraction should succeed");

        assert_eq!(
            clean.columns,
            vec![
                "club",
                "league",
                "value_on_date",
                "current_value",
                "pct_change",
                "current_value_eur",
                "value_on_date_eur",
            ]
        );
        assert_eq!(clean.row_count(), 2, "The totals footer must be excluded");

        let records = clean.to_records();
        assert_eq!(records[0]["club"], json!("Arsenal"));
        assert_eq!(records[0]["league"], json!("Premier League"));
        assert_eq!(records[0]["current_value_eur"], json!(1_250_000_000.0));
        assert_eq!(records[0]["value_on_date_eur"], json!(1_100_000_000.0));

        assert_eq!(records[1]["current_value_eur"], json!(980_500_000.0));
        assert_eq!(
            records[1]["value_on_date"],
            json!("-"),
            "The raw string field keeps the source's missing marker"
        );
        assert_eq!(
            records[1]["value_on_date_eur"],
            serde_json::Value::Null,
            "An unreported value is null, not zero"
        );
    }

    #[test]
    fn test_extract_club_values_omits_unresolved_roles() {
        let html = r#"
            <table>
                <tr><th>Rank</th><th>Crest</th><th>Club</th><th>Current value</th></tr>
                <tr><td>1</td><td></td><td>Arsenal</td><td>€1.25b</td></tr>
            </table>
        "#;

        let tables = parse_tables(html);
        let clean = extract_club_values(&tables).expect("Extraction should succeed");

        assert_eq!(
            clean.columns,
            vec!["club", "current_value", "current_value_eur"],
            "Unresolved roles are absent table-wide"
        );
    }

    #[test]
    fn test_extract_club_values_without_tables_is_fatal() {
        assert!(matches!(
            extract_club_values(&[]),
            Err(ExtractError::NoTableFound)
        ));
    }

    #[test]
    fn test_parse_page_title_snippet() {
        let html = "<html><head><title>  Premier League \n club values </title></head></html>";
        assert_eq!(
            parse_page_title(html),
            Some("Premier League club values".to_string())
        );
    }

    #[test]
    fn test_parse_page_title_is_clipped() {
        let html = format!("<html><head><title>{}</title></head></html>", "x".repeat(300));
        let title = parse_page_title(&html).expect("Should find a title");
        assert_eq!(title.chars().count(), 120);
    }

    #[test]
    fn test_parse_page_title_missing() {
        assert_eq!(parse_page_title("<html><body></body></html>"), None);
    }
}
