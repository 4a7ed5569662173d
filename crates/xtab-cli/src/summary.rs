use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use xtab_common::format_numeric;
use xtab_core::{
    CategoricalSummary, CrosstabOutcome, Distribution, FormattedTable, NumericSummary,
    NumericVariableSummary, PercentageKind, SignificanceBand, StatisticsReport, VariableSummary,
};
use xtab_plan::AnalysisResponse;

use crate::commands::CommandOutput;

pub fn print_output(output: &CommandOutput) {
    match output {
        CommandOutput::Crosstab(outcome) => print_crosstab(outcome),
        CommandOutput::Plan(response) => print_plan(response),
        CommandOutput::Variable {
            variable,
            summary,
            distribution,
        } => print_variable(variable, summary, distribution.as_ref()),
        CommandOutput::NumericVariables(summaries) => print_numeric_variables(summaries),
    }
}

pub fn print_crosstab(outcome: &CrosstabOutcome) {
    println!("Counts");
    println!("{}", grid(&outcome.table, format_numeric));
    for (kind, table) in outcome.percentages.iter() {
        println!("{}", percentage_title(kind));
        println!("{}", grid(table, |value| format!("{}%", format_numeric(value))));
    }
    if outcome.dropped_zero_axes {
        println!("Empty rows or columns were removed.");
    }
    if let Some(table) = statistics_table(&outcome.statistics) {
        println!("Statistics");
        println!("{table}");
    }
}

pub fn print_plan(response: &AnalysisResponse) {
    let outcome = &response.outcome;
    println!(
        "Analysis: {} of {}",
        outcome.plan.analysis_type,
        outcome.plan.variables.join(", ")
    );
    if !outcome.dropped_tests.is_empty() {
        println!("Skipped tests: {}", outcome.dropped_tests.join(", "));
    }
    println!();
    println!("{}", response.explanation);
}

fn print_variable(variable: &str, summary: &VariableSummary, distribution: Option<&Distribution>) {
    println!("Variable: {variable}");
    let table = match summary {
        VariableSummary::Numeric(summary) => numeric_summary_table(summary),
        VariableSummary::Categorical(summary) => categorical_summary_table(summary),
    };
    println!("{table}");
    if let Some(distribution) = distribution {
        println!("{}", distribution_table(distribution));
    }
}

fn print_numeric_variables(summaries: &[NumericVariableSummary]) {
    if summaries.is_empty() {
        println!("No numeric variables.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Variable"),
        header_cell("Label"),
        header_cell("Min"),
        header_cell("Max"),
        header_cell("Mean"),
        header_cell("Std"),
        header_cell("Missing"),
    ]);
    apply_table_style(&mut table);
    for index in 2..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for summary in summaries {
        table.add_row(vec![
            Cell::new(&summary.name).add_attribute(Attribute::Bold),
            summary
                .label
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            number_cell(summary.min),
            number_cell(summary.max),
            number_cell(summary.mean),
            number_cell(summary.std),
            Cell::new(summary.missing),
        ]);
    }
    println!("{table}");
}

/// Renders a formatted table with its row axis as the first header.
fn grid(table: &FormattedTable, render: impl Fn(f64) -> String) -> Table {
    let columns: Vec<&str> = table.column_keys().collect();
    let mut header = vec![header_cell(&format!(
        "{} \\ {}",
        table.row_axis().join(" / "),
        table.column_axis().join(" / ")
    ))];
    header.extend(columns.iter().map(|column| header_cell(column)));

    let mut out = Table::new();
    out.set_header(header);
    apply_table_style(&mut out);
    for index in 1..=columns.len() {
        align_column(&mut out, index, CellAlignment::Right);
    }
    for (row, values) in table.rows() {
        let mut cells = vec![Cell::new(row).add_attribute(Attribute::Bold)];
        cells.extend(values.iter().map(|(_, value)| Cell::new(render(*value))));
        out.add_row(cells);
    }
    out
}

fn percentage_title(kind: PercentageKind) -> &'static str {
    match kind {
        PercentageKind::Row => "Row percentages",
        PercentageKind::Column => "Column percentages",
        PercentageKind::Total => "Total percentages",
    }
}

fn statistics_table(report: &StatisticsReport) -> Option<Table> {
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    if let Some(chi) = &report.chi_square {
        let name = if chi.continuity_correction {
            "Chi-square (Yates)"
        } else {
            "Chi-square"
        };
        rows.push(vec![
            Cell::new(name),
            Cell::new(format!("{:.4}", chi.statistic)),
            Cell::new(chi.dof),
            Cell::new(format!("{:.4}", chi.p_value)),
            band_cell(chi.significance),
        ]);
    }
    if let Some(association) = &report.association {
        if let Some(phi) = association.phi {
            rows.push(measure_row("Phi", phi));
        }
        if let Some(v) = association.cramers_v {
            rows.push(measure_row("Cramér's V", v));
        }
    }
    if let Some(c) = report.contingency_coefficient {
        rows.push(measure_row("Contingency coefficient", c));
    }
    if let Some(fisher) = &report.fisher {
        let odds = fisher
            .odds_ratio
            .map_or_else(|| dim_cell("inf"), |odds| Cell::new(format!("{odds:.4}")));
        rows.push(vec![
            Cell::new("Fisher exact (odds ratio)"),
            odds,
            dim_cell("-"),
            Cell::new(format!("{:.4}", fisher.p_value)),
            band_cell(fisher.significance),
        ]);
    }
    if rows.is_empty() {
        return None;
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Test"),
        header_cell("Value"),
        header_cell("df"),
        header_cell("p"),
        header_cell("Sig."),
    ]);
    apply_table_style(&mut table);
    for index in 1..=3 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 4, CellAlignment::Center);
    for row in rows {
        table.add_row(row);
    }
    Some(table)
}

fn measure_row(name: &str, value: f64) -> Vec<Cell> {
    vec![
        Cell::new(name),
        Cell::new(format!("{value:.4}")),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
    ]
}

fn numeric_summary_table(summary: &NumericSummary) -> Table {
    let mut rows = Vec::new();
    for (name, value) in [
        ("Mean", summary.mean),
        ("Std", summary.std),
        ("Min", summary.min),
        ("25%", summary.q1),
        ("50%", summary.median),
        ("75%", summary.q3),
        ("Max", summary.max),
    ] {
        rows.push(vec![Cell::new(name), number_cell(value)]);
    }
    rows.push(vec![Cell::new("Count"), Cell::new(summary.count)]);
    rows.push(vec![Cell::new("Missing"), Cell::new(summary.missing)]);
    key_value_table(rows)
}

fn categorical_summary_table(summary: &CategoricalSummary) -> Table {
    let top = summary
        .top
        .as_ref()
        .map_or_else(|| dim_cell("-"), Cell::new);
    key_value_table(vec![
        vec![Cell::new("Count"), Cell::new(summary.count)],
        vec![Cell::new("Unique"), Cell::new(summary.unique)],
        vec![Cell::new("Most common"), top],
        vec![Cell::new("Frequency"), Cell::new(summary.freq)],
        vec![Cell::new("Missing"), Cell::new(summary.missing)],
    ])
}

fn distribution_table(distribution: &Distribution) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell(distribution.label.as_deref().unwrap_or(&distribution.variable)),
        header_cell("Count"),
        header_cell("Percent"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for entry in &distribution.entries {
        let label = if entry.category.is_missing() {
            dim_cell(&entry.label)
        } else {
            Cell::new(&entry.label)
        };
        table.add_row(vec![
            label,
            Cell::new(entry.count),
            Cell::new(format!("{:.1}%", entry.percent)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(distribution.total).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    table
}

fn key_value_table(rows: Vec<Vec<Cell>>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(60);
    for row in rows {
        table.add_row(row);
    }
    // Columns exist only once a row is added.
    align_column(&mut table, 1, CellAlignment::Right);
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn band_cell(band: SignificanceBand) -> Cell {
    let cell = Cell::new(band.symbol());
    match band {
        SignificanceBand::Strong => cell.fg(Color::Green).add_attribute(Attribute::Bold),
        SignificanceBand::Significant => cell.fg(Color::Green),
        SignificanceBand::NotSignificant => cell.fg(Color::DarkGrey),
    }
}

fn number_cell(value: Option<f64>) -> Cell {
    match value {
        Some(value) => Cell::new(format!("{value:.2}")),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
