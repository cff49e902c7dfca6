use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::matcher::MatchTable;
use crate::model::combined::CombinedTable;
use crate::prune::{PruneOutcome, UNKNOWN_LABEL};
use crate::report::{ReportError, format_f32_6};

/// Per-cell annotation table: one row per cell with the winning reference
/// and label, the original and recomputed scores, the delta, and the pruned
/// label ("unknown" when the winning reference pruned the cell). Without
/// pruning, the pruned column repeats the label.
pub fn write_cell_table(
    path: &Path,
    table: &CombinedTable,
    prune: Option<&[PruneOutcome]>,
) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(
        w,
        "cell\treference\tlabel\tscore\trecomputed\tdelta\tpruned_label"
    )?;
    for (cell, result) in table.results.iter().enumerate() {
        let call = result.winning_call();
        let pruned_label = match prune {
            Some(outcomes) if outcomes[result.winner].kept[cell].is_none() => UNKNOWN_LABEL,
            _ => call.label.as_str(),
        };
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            table.cells[cell],
            call.reference,
            call.label,
            format_f32_6(call.score),
            format_f32_6(call.recomputed),
            format_f32_6(call.delta),
            pruned_label
        )?;
    }
    w.flush()?;
    tracing::info!(path = %path.display(), n_cells = table.n_cells(), "wrote cell table");
    Ok(())
}

/// Mutual-assignment probability matrix as TSV: rows are reference A labels,
/// columns are reference B labels.
pub fn write_match_table(path: &Path, table: &MatchTable) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mutual = table.mutual();
    let mut w = BufWriter::new(File::create(path)?);
    write!(w, "label")?;
    for label in &table.labels_b {
        write!(w, "\t{}", label)?;
    }
    writeln!(w)?;
    for (i, label) in table.labels_a.iter().enumerate() {
        write!(w, "{}", label)?;
        for j in 0..table.labels_b.len() {
            write!(w, "\t{}", format_f32_6(mutual[i][j]))?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    tracing::info!(path = %path.display(), "wrote match table");
    Ok(())
}
