//! The [Report] struct is used by the histogram controller to structure the report printed at the end of execution
//!
//! Report contains several [StatSummary] rows for the global stats and a [TriggerBitSummary] row per relevant trigger bit.
use owo_colors::OwoColorize;
use tabled::{
    settings::{
        object::{Columns, Rows},
        Alignment, Format, Modify, Panel, Style,
    },
    Table, Tabled,
};

/// Describes the columns of the global stats table
#[derive(Tabled)]
pub struct StatSummary {
    /// Name of the statistic
    pub statistic: String,
    #[allow(missing_docs)]
    pub value: String,
    /// Optional explanation
    pub notes: String,
}

impl StatSummary {
    /// Create a new [StatSummary] row
    pub fn new(statistic: String, value: String, notes: Option<String>) -> Self {
        Self {
            statistic,
            value,
            notes: notes.unwrap_or_default(),
        }
    }
}

/// Describes the columns of the trigger bit table
#[derive(Tabled)]
pub struct TriggerBitSummary {
    #[tabled(rename = "bit")]
    bit: u8,
    #[tabled(rename = "events fired")]
    fired: u64,
    #[tabled(rename = "TAC entries")]
    tac_entries: String,
    #[tabled(rename = "PS entries")]
    ps_entries: String,
    #[tabled(rename = "mean TAC - RF [ns]")]
    mean_tac_rf: String,
}

impl TriggerBitSummary {
    /// Create a row, family entries are [None] when the family is not registered for the bit.
    pub fn new(
        bit: u8,
        fired: u64,
        tac_entries: Option<u64>,
        ps_entries: Option<u64>,
        mean_tac_rf: Option<f64>,
    ) -> Self {
        let or_dash = |entries: Option<u64>| entries.map_or_else(|| "-".to_string(), |e| e.to_string());
        Self {
            bit,
            fired,
            tac_entries: or_dash(tac_entries),
            ps_entries: or_dash(ps_entries),
            mean_tac_rf: mean_tac_rf.map_or_else(|| "-".to_string(), |m| format!("{m:.3}")),
        }
    }
}

/// The Report struct is used by the histogram controller to structure the report printed at the end of execution
pub struct Report {
    stats: Vec<StatSummary>,
    trigger_bits: Vec<TriggerBitSummary>,
    processing_time: std::time::Duration,
    fatal_error: Option<String>,
}

impl Report {
    #[allow(missing_docs)]
    pub fn new(processing_time: std::time::Duration) -> Self {
        Self {
            stats: Vec::new(),
            trigger_bits: Vec::new(),
            processing_time,
            fatal_error: None,
        }
    }

    #[allow(missing_docs)]
    pub fn add_stat(&mut self, stat: StatSummary) {
        self.stats.push(stat);
    }

    #[allow(missing_docs)]
    pub fn add_trigger_bit(&mut self, row: TriggerBitSummary) {
        self.trigger_bits.push(row);
    }

    #[allow(missing_docs)]
    pub fn add_fatal_error(&mut self, error: String) {
        self.fatal_error = Some(error);
    }

    /// Render the report tables
    pub fn render(&self) -> String {
        let mut global_table = Table::new(&self.stats);
        let _ = global_table
            .with(Style::rounded())
            .with(Modify::new(Columns::single(0)).with(Format::content(|s| s.bright_blue().to_string())))
            .with(Modify::new(Columns::single(1)).with(Format::content(|s| s.green().to_string())))
            .with(Panel::header("Report"))
            .with(
                Modify::new(Rows::single(0))
                    .with(Alignment::center())
                    .with(Format::content(|x| x.to_uppercase().green().to_string())),
            );

        let row_count = global_table.count_rows();
        let processing_time = self.processing_time;
        let _ = global_table
            .with(Panel::footer(format!("Processed in {processing_time:.02?}")))
            .with(
                Modify::new(Rows::single(row_count))
                    .with(Alignment::center())
                    .with(Format::content(|x| x.dimmed().to_string())),
            );

        if let Some(fatal_error) = &self.fatal_error {
            let _ = global_table
                .with(Panel::header(format!("FATAL ERROR - EARLY TERMINATION: {fatal_error}")))
                .with(
                    Modify::new(Rows::single(0))
                        .with(Alignment::center())
                        .with(Format::content(|x| x.red().to_string())),
                );
        }

        let mut rendered = global_table.to_string();
        if !self.trigger_bits.is_empty() {
            let mut bits_table = Table::new(&self.trigger_bits);
            let _ = bits_table
                .with(Style::rounded())
                .with(Panel::header("Trigger bits"))
                .with(
                    Modify::new(Rows::single(0))
                        .with(Alignment::center())
                        .with(Format::content(|x| x.to_uppercase().yellow().to_string())),
                );
            rendered.push('\n');
            rendered.push_str(&bits_table.to_string());
        }
        rendered
    }
}
