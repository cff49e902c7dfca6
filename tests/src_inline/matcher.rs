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

/// Two references with corresponding populations: x ~ p on genes 0,1 and
/// y ~ q on genes 2,3.
fn corresponding_pair() -> (Reference, Reference) {
    let a = reference(
        "a",
        &["x", "x", "y", "y"],
        vec![
            vec![5.0, 4.0, 1.0, 0.0],
            vec![4.0, 5.0, 0.0, 1.0],
            vec![0.0, 1.0, 4.0, 5.0],
            vec![1.0, 0.0, 5.0, 4.0],
        ],
    );
    let b = reference(
        "b",
        &["p", "p", "q", "q"],
        vec![
            vec![4.0, 5.0, 1.0, 0.0],
            vec![5.0, 4.0, 0.0, 1.0],
            vec![1.0, 0.0, 4.0, 5.0],
            vec![0.0, 1.0, 5.0, 4.0],
        ],
    );
    (a, b)
}

#[test]
fn test_cross_match_recovers_one_to_one_correspondence() {
    let (a, b) = corresponding_pair();
    let table = cross_match(&a, &b, &ScoreParams::default()).unwrap();
    // vocab order: labels_a = [x, y], labels_b = [p, q]
    assert_eq!(table.labels_a, vec!["x", "y"]);
    assert_eq!(table.labels_b, vec!["p", "q"]);
    assert_eq!(table.a_to_b, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    assert_eq!(table.b_to_a, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

    let mutual = table.mutual();
    assert_eq!(mutual[0], vec![1.0, 0.0]);
    assert_eq!(mutual[1], vec![0.0, 1.0]);
}

#[test]
fn test_directed_rows_sum_to_one() {
    let (a, b) = corresponding_pair();
    let table = cross_match(&a, &b, &ScoreParams::default()).unwrap();
    for row in &table.a_to_b {
        let sum: f32 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }
    // b_to_a is tabulated [a][b]; columns sum to 1 per B label
    for j in 0..table.labels_b.len() {
        let sum: f32 = (0..table.labels_a.len()).map(|i| table.b_to_a[i][j]).sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_mutual_is_elementwise_min() {
    let table = MatchTable {
        reference_a: "a".to_string(),
        reference_b: "b".to_string(),
        labels_a: vec!["x".to_string()],
        labels_b: vec!["p".to_string(), "q".to_string()],
        a_to_b: vec![vec![0.9, 0.1]],
        b_to_a: vec![vec![0.4, 0.6]],
    };
    assert_eq!(table.mutual(), vec![vec![0.4, 0.1]]);
}

#[test]
fn test_reference_unique_label_has_low_row() {
    // y in A has no counterpart in B: B only contains p-like samples
    let a = reference(
        "a",
        &["x", "x", "y", "y"],
        vec![
            vec![5.0, 4.0, 1.0, 0.0],
            vec![4.0, 5.0, 0.0, 1.0],
            vec![0.0, 1.0, 4.0, 5.0],
            vec![1.0, 0.0, 5.0, 4.0],
        ],
    );
    let b = reference(
        "b",
        &["p", "p", "r", "r"],
        vec![
            vec![4.0, 5.0, 1.0, 0.0],
            vec![5.0, 4.0, 0.0, 1.0],
            vec![5.0, 4.0, 1.0, 1.0],
            vec![4.0, 5.0, 1.0, 0.5],
        ],
    );
    let table = cross_match(&a, &b, &ScoreParams::default()).unwrap();
    // every B sample resembles A's x, so nothing maps back to y
    let y_idx = table.labels_a.iter().position(|l| l == "y").unwrap();
    for j in 0..table.labels_b.len() {
        assert_eq!(table.b_to_a[y_idx][j], 0.0);
    }
}

#[test]
fn test_cross_match_no_shared_genes_is_fatal() {
    let a = reference("a", &["x", "y"], vec![vec![1.0], vec![0.0]]);
    let mut b = reference("b", &["p", "q"], vec![vec![1.0], vec![0.0]]);
    b.expr.genes = vec!["other".to_string()];
    assert!(matches!(
        cross_match(&a, &b, &ScoreParams::default()),
        Err(MatchError::Input(InputError::NoSharedGenes { .. }))
    ));
}
