use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::input::{ExprMatrix, InputError};

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(path.display().to_string()));
    }
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Reads a genes x samples TSV matrix: header row is `gene<TAB>sample...`,
/// each following row is a gene symbol and one value per sample. Duplicate
/// gene symbols keep the first occurrence; later rows are dropped with a
/// warning.
pub fn read_expr_tsv(path: &Path) -> Result<ExprMatrix, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();

    let read = reader.read_line(&mut buf)?;
    if read == 0 {
        return Err(InputError::Parse(format!(
            "{} is empty",
            path.display()
        )));
    }
    let header = buf.trim_end();
    let mut fields = header.split('\t');
    let _corner = fields.next();
    let samples: Vec<String> = fields.map(|s| s.to_string()).collect();
    if samples.is_empty() {
        return Err(InputError::Parse(format!(
            "{}: header has no sample columns",
            path.display()
        )));
    }

    let n_samples = samples.len();
    let mut genes: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut rows: Vec<Vec<f32>> = Vec::new();

    let mut line_no = 1usize;
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let gene = fields
            .next()
            .ok_or_else(|| InputError::Parse(format!("missing gene name at line {}", line_no)))?;
        let mut row = Vec::with_capacity(n_samples);
        for field in fields {
            let value: f32 = field.parse().map_err(|_| {
                InputError::Parse(format!(
                    "invalid value '{}' at line {} of {}",
                    field,
                    line_no,
                    path.display()
                ))
            })?;
            row.push(value);
        }
        if row.len() != n_samples {
            return Err(InputError::Parse(format!(
                "line {} has {} values, expected {}",
                line_no,
                row.len(),
                n_samples
            )));
        }
        if !seen.insert(gene.to_string()) {
            tracing::warn!(gene, line = line_no, "duplicate gene symbol; keeping first row");
            continue;
        }
        genes.push(gene.to_string());
        rows.push(row);
    }

    if genes.is_empty() {
        return Err(InputError::Parse(format!(
            "{} contains no gene rows",
            path.display()
        )));
    }

    // transpose to column-major
    let mut columns = vec![Vec::with_capacity(genes.len()); n_samples];
    for row in &rows {
        for (sample, &value) in row.iter().enumerate() {
            columns[sample].push(value);
        }
    }

    Ok(ExprMatrix {
        genes,
        samples,
        columns,
    })
}
