use super::*;
use crate::input::ExprMatrix;

fn expr(genes: usize, columns: Vec<Vec<f32>>) -> ExprMatrix {
    ExprMatrix {
        genes: (0..genes).map(|g| format!("g{g}")).collect(),
        samples: (0..columns.len()).map(|s| format!("s{s}")).collect(),
        columns,
    }
}

fn reference(name: &str, labels: &[&str], columns: Vec<Vec<f32>>) -> Reference {
    Reference::new(
        name.to_string(),
        expr(columns[0].len(), columns),
        labels.iter().map(|l| l.to_string()).collect(),
    )
    .unwrap()
}

#[test]
fn test_label_profiles_are_per_gene_medians() {
    let r = reference(
        "r",
        &["x", "x", "y"],
        vec![
            vec![1.0, 10.0],
            vec![3.0, 20.0],
            vec![5.0, 0.0],
        ],
    );
    let profiles = label_profiles(&r);
    // vocab order: x, y
    assert_eq!(profiles[0], vec![2.0, 15.0]);
    assert_eq!(profiles[1], vec![5.0, 0.0]);
}

#[test]
fn test_detect_classic_picks_positive_median_differences() {
    let r = reference(
        "r",
        &["x", "x", "y", "y"],
        vec![
            vec![5.0, 4.0, 1.0, 0.0],
            vec![4.0, 5.0, 0.0, 1.0],
            vec![0.0, 1.0, 4.0, 5.0],
            vec![1.0, 0.0, 5.0, 4.0],
        ],
    );
    let set = detect_classic(&r, 10);
    // x upregulates genes 0,1 against y; y upregulates 2,3 against x
    assert_eq!(set.pairwise[0][1], vec![0, 1]);
    assert_eq!(set.pairwise[1][0], vec![2, 3]);
    assert!(set.pairwise[0][0].is_empty());
}

#[test]
fn test_detect_classic_respects_per_pair_limit() {
    let r = reference(
        "r",
        &["x", "y"],
        vec![vec![5.0, 4.0, 3.0, 2.0], vec![0.0, 0.0, 0.0, 0.0]],
    );
    let set = detect_classic(&r, 2);
    // strongest differences first: genes 0 and 1
    assert_eq!(set.pairwise[0][1], vec![0, 1]);
}

#[test]
fn test_detect_consistent_prefers_recurring_genes() {
    // gene 0 marks x in both references; genes 1 and 2 only in one each
    let r1 = reference(
        "r1",
        &["x", "y"],
        vec![vec![5.0, 4.0, 0.0], vec![0.0, 0.0, 0.0]],
    );
    let r2 = reference(
        "r2",
        &["x", "y"],
        vec![vec![5.0, 0.0, 4.0], vec![0.0, 0.0, 0.0]],
    );
    let set = detect_consistent(&[r1, r2], 1).unwrap();
    assert_eq!(set.pairwise[0][1], vec![0]);
}

#[test]
fn test_detect_consistent_requires_shared_vocabulary() {
    let r1 = reference("r1", &["x", "y"], vec![vec![1.0], vec![0.0]]);
    let r2 = reference("r2", &["x", "z"], vec![vec![1.0], vec![0.0]]);
    assert!(matches!(
        detect_consistent(&[r1, r2], 5),
        Err(AnnotError::VocabularyMismatch { .. })
    ));
}

#[test]
fn test_detect_consistent_no_references() {
    assert!(matches!(
        detect_consistent(&[], 5),
        Err(AnnotError::NoReferences)
    ));
}
