use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnnotError {
    #[error("reference {reference} has {n} label(s); at least 2 are required")]
    TooFewLabels { reference: String, n: usize },
    #[error("no references supplied")]
    NoReferences,
    #[error(
        "reference {reference}: label '{label}' was assigned but has no marker genes recorded"
    )]
    MissingMarkers { reference: String, label: String },
    #[error(
        "reference {reference} vocabulary does not match the harmonized label space \
         (expected {expected} labels, found {found})"
    )]
    VocabularyMismatch {
        reference: String,
        expected: usize,
        found: usize,
    },
    #[error("score matrix has no labels for cell scoring")]
    EmptyScores,
}
