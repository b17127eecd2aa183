use spirit_engine::series::{fences, Fences};

fn assert_fences(values: &[f64], expected: [f64; 3]) {
    let f = fences(values).unwrap_or_else(|| panic!("fences undefined for {values:?}"));
    assert_eq!(
        (f.q1, f.median, f.q3),
        (expected[0], expected[1], expected[2]),
        "values: {values:?}"
    );
}

#[test]
fn reference_vector_eleven_values() {
    assert_fences(
        &[6.0, 7.0, 15.0, 36.0, 39.0, 40.0, 41.0, 42.0, 43.0, 47.0, 49.0],
        [20.25, 40.0, 42.75],
    );
}

#[test]
fn reference_vector_six_values() {
    assert_fences(&[7.0, 15.0, 36.0, 39.0, 40.0, 41.0], [15.0, 37.5, 40.0]);
}

#[test]
fn reference_vector_eight_values() {
    assert_fences(
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        [2.5, 4.5, 6.5],
    );
}

#[test]
fn reference_vector_seven_values() {
    assert_fences(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], [2.0, 4.0, 6.0]);
}

#[test]
fn two_values_span_the_box() {
    assert_fences(&[1.0, 2.0], [1.0, 1.5, 2.0]);
}

#[test]
fn three_values_interpolate_around_the_median() {
    assert_fences(&[10.0, 20.0, 30.0], [15.0, 20.0, 25.0]);
    assert_fences(&[100.0, 110.0, 120.0], [105.0, 110.0, 115.0]);
}

#[test]
fn undefined_below_two_values() {
    assert_eq!(fences(&[1.0]), None);
    assert_eq!(fences(&[]), None);
}

#[test]
fn iqr_is_quartile_spread() {
    let f = Fences {
        q1: 2.0,
        median: 4.0,
        q3: 7.0,
    };
    assert_eq!(f.iqr(), 5.0);
}
