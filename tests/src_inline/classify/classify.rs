use super::*;
use crate::markers::detect_classic;
use crate::stats::median;

fn expr(genes: usize, columns: Vec<Vec<f32>>) -> crate::input::ExprMatrix {
    crate::input::ExprMatrix {
        genes: (0..genes).map(|g| format!("g{g}")).collect(),
        samples: (0..columns.len()).map(|s| format!("s{s}")).collect(),
        columns,
    }
}

fn two_label_reference() -> Reference {
    Reference::new(
        "r".to_string(),
        expr(
            4,
            vec![
                vec![5.0, 4.0, 1.0, 0.0],
                vec![4.0, 5.0, 0.0, 1.0],
                vec![0.0, 1.0, 4.0, 5.0],
                vec![1.0, 0.0, 5.0, 4.0],
            ],
        ),
        vec![
            "x".to_string(),
            "x".to_string(),
            "y".to_string(),
            "y".to_string(),
        ],
    )
    .unwrap()
}

fn test_cells() -> Dataset {
    Dataset {
        id: "t".to_string(),
        expr: expr(
            4,
            vec![vec![5.0, 4.0, 1.0, 0.0], vec![0.0, 1.0, 4.0, 5.0]],
        ),
    }
}

#[test]
fn test_classify_assigns_expected_labels() {
    let reference = two_label_reference();
    let markers = detect_classic(&reference, 10);
    let result = classify(&test_cells(), &reference, &markers, &ScoreParams::default()).unwrap();
    assert_eq!(result.assigned_label(0), "x");
    assert_eq!(result.assigned_label(1), "y");
}

#[test]
fn test_score_matrix_labels_equal_reference_vocabulary() {
    let reference = two_label_reference();
    let markers = detect_classic(&reference, 10);
    let result = classify(&test_cells(), &reference, &markers, &ScoreParams::default()).unwrap();
    assert_eq!(result.scores.labels, reference.vocab);
    assert_eq!(result.scores.n_cells(), 2);
}

#[test]
fn test_delta_is_assigned_score_minus_row_median() {
    let reference = two_label_reference();
    let markers = detect_classic(&reference, 10);
    let result = classify(&test_cells(), &reference, &markers, &ScoreParams::default()).unwrap();
    for cell in 0..result.n_cells() {
        let row = &result.scores.rows[cell];
        let expected = row[result.assigned[cell]] - median(row);
        assert!((result.deltas[cell] - expected).abs() < 1e-6);
    }
}

#[test]
fn test_classify_deterministic_bits() {
    let reference = two_label_reference();
    let markers = detect_classic(&reference, 10);
    let params = ScoreParams::default();
    let a = classify(&test_cells(), &reference, &markers, &params).unwrap();
    let b = classify(&test_cells(), &reference, &markers, &params).unwrap();
    for cell in 0..a.n_cells() {
        for label in 0..a.scores.n_labels() {
            assert_eq!(
                a.scores.rows[cell][label].to_bits(),
                b.scores.rows[cell][label].to_bits()
            );
        }
        assert_eq!(a.assigned[cell], b.assigned[cell]);
        assert_eq!(a.deltas[cell].to_bits(), b.deltas[cell].to_bits());
    }
}

#[test]
fn test_fine_tune_keeps_clear_assignments() {
    let reference = two_label_reference();
    let markers = detect_classic(&reference, 10);
    let plain = classify(&test_cells(), &reference, &markers, &ScoreParams::default()).unwrap();
    let tuned_params = ScoreParams {
        fine_tune: true,
        ..ScoreParams::default()
    };
    let tuned = classify(&test_cells(), &reference, &markers, &tuned_params).unwrap();
    assert_eq!(plain.assigned, tuned.assigned);
}

#[test]
fn test_classify_falls_back_to_all_genes_without_markers() {
    // identical label profiles: no markers anywhere
    let reference = Reference::new(
        "flat".to_string(),
        expr(
            3,
            vec![
                vec![1.0, 2.0, 3.0],
                vec![1.0, 2.0, 3.0],
                vec![1.0, 2.0, 3.0],
                vec![1.0, 2.0, 3.0],
            ],
        ),
        vec![
            "x".to_string(),
            "x".to_string(),
            "y".to_string(),
            "y".to_string(),
        ],
    )
    .unwrap();
    let markers = detect_classic(&reference, 10);
    let test = Dataset {
        id: "t".to_string(),
        expr: expr(3, vec![vec![1.0, 2.0, 3.0]]),
    };
    // still classifies; both labels score identically, first label wins
    let result = classify(&test, &reference, &markers, &ScoreParams::default()).unwrap();
    assert_eq!(result.assigned, vec![0]);
    assert!((result.deltas[0] - 0.0).abs() < 1e-6);
}

#[test]
fn test_single_label_reference_classifies_with_zero_delta() {
    let reference = Reference::new(
        "solo".to_string(),
        expr(3, vec![vec![3.0, 2.0, 1.0], vec![3.0, 1.0, 2.0]]),
        vec!["only".to_string(), "only".to_string()],
    )
    .unwrap();
    let markers = detect_classic(&reference, 10);
    let test = Dataset {
        id: "t".to_string(),
        expr: expr(3, vec![vec![3.0, 2.0, 1.0]]),
    };
    let result = classify(&test, &reference, &markers, &ScoreParams::default()).unwrap();
    assert_eq!(result.assigned, vec![0]);
    // delta over a single label is identically zero
    assert_eq!(result.deltas[0], 0.0);
}
