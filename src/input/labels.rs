use std::collections::HashMap;
use std::path::Path;

use crate::input::matrix::open_maybe_gz;
use crate::input::InputError;
use std::io::BufRead;

/// Reads one label per line, aligned to the reference sample columns. A line
/// may also be `sample<TAB>label`; when it is, the sample name must match the
/// column at that position.
pub fn read_labels(path: &Path, samples: &[String]) -> Result<Vec<String>, InputError> {
    let reader = open_maybe_gz(path)?;
    let mut labels = Vec::with_capacity(samples.len());
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let label = match line.split_once('\t') {
            Some((sample, label)) => {
                match samples.get(labels.len()) {
                    Some(expected) if expected == sample => {}
                    _ => {
                        return Err(InputError::InvalidInput(format!(
                            "label line {}: sample '{}' does not match column {}",
                            idx + 1,
                            sample,
                            labels.len()
                        )));
                    }
                }
                label
            }
            None => line,
        };
        labels.push(label.to_string());
    }
    if labels.len() != samples.len() {
        return Err(InputError::InvalidInput(format!(
            "{} labels for {} reference samples",
            labels.len(),
            samples.len()
        )));
    }
    Ok(labels)
}

/// Two-column TSV mapping raw reference labels to harmonized ontology terms.
pub fn read_label_map(path: &Path) -> Result<HashMap<String, String>, InputError> {
    let reader = open_maybe_gz(path)?;
    let mut map = HashMap::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let (raw, term) = line.split_once('\t').ok_or_else(|| {
            InputError::Parse(format!(
                "label map line {}: expected raw<TAB>term",
                idx + 1
            ))
        })?;
        map.insert(raw.to_string(), term.to_string());
    }
    if map.is_empty() {
        return Err(InputError::Parse(format!(
            "{} contains no label mappings",
            path.display()
        )));
    }
    Ok(map)
}

/// Replaces raw labels with harmonized terms. Every raw label must be mapped.
pub fn apply_label_map(
    reference: &str,
    labels: &[String],
    map: &HashMap<String, String>,
) -> Result<Vec<String>, InputError> {
    let mut out = Vec::with_capacity(labels.len());
    for label in labels {
        match map.get(label) {
            Some(term) => out.push(term.clone()),
            None => {
                return Err(InputError::InvalidInput(format!(
                    "reference {}: label '{}' has no harmonized term in the label map",
                    reference, label
                )));
            }
        }
    }
    Ok(out)
}
