use ndarray::{array, Array2, ArrayD, IxDyn};

use callisto_core::combine::{combine, median_stack, CombineMethod};
use callisto_core::error::CallistoError;
use callisto_core::image::{Header, Image};

#[test]
fn median_of_two_is_their_mean() {
    let a = array![[1.0f32, 2.0], [3.0, 4.0]];
    let b = array![[3.0f32, 4.0], [5.0, 6.0]];
    let combined = combine(vec![a, b], CombineMethod::Numpy).unwrap();
    assert_eq!(combined, array![[2.0f32, 3.0], [4.0, 5.0]]);
}

#[test]
fn single_image_is_returned_unchanged() {
    let a = array![[1.5f32, -2.0, 7.0], [0.0, 3.25, 9.0]];
    assert_eq!(combine(a.clone(), CombineMethod::Numpy).unwrap(), a);
    assert_eq!(combine(vec![a.clone()], CombineMethod::Numpy).unwrap(), a);
}

#[test]
fn median_rejects_outlier_frame() {
    let frames: Vec<Array2<f32>> = [1.0, 1.1, 0.9, 50.0, 1.0]
        .iter()
        .map(|&v| Array2::from_elem((3, 3), v))
        .collect();
    let combined = combine(frames, CombineMethod::Numpy).unwrap();
    assert!(combined.iter().all(|&v| v == 1.0));
}

#[test]
fn large_stack_uses_row_parallel_path() {
    let frames: Vec<Array2<f32>> = (0..3)
        .map(|i| Array2::from_shape_fn((300, 300), |(r, c)| (r + c + i) as f32))
        .collect();
    let combined = median_stack(&frames);
    assert_eq!(combined[[10, 20]], 31.0);
    assert_eq!(combined[[299, 299]], 599.0);
}

#[test]
fn headers_are_not_carried() {
    let mut header = Header::new();
    header.set("OBJECT", "M42");
    let image = Image::with_header(array![[1.0f32]], header);
    let combined = combine(image, CombineMethod::Numpy).unwrap();
    assert_eq!(combined, array![[1.0f32]]);
}

#[test]
fn unknown_method_name_is_not_implemented() {
    let err = "xyz".parse::<CombineMethod>().unwrap_err();
    assert!(matches!(err, CallistoError::NotImplemented(ref m) if m == "xyz"));
}

#[test]
fn swarp_is_not_implemented() {
    let err = combine(array![[1.0f32]], CombineMethod::Swarp).unwrap_err();
    assert!(matches!(err, CallistoError::NotImplemented(ref m) if m == "swarp"));
}

#[test]
fn mismatched_shapes_are_rejected() {
    let err = combine(
        vec![Array2::<f32>::zeros((2, 2)), Array2::<f32>::zeros((3, 2))],
        CombineMethod::Numpy,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CallistoError::DimensionMismatch {
            expected: (2, 2),
            found: (3, 2)
        }
    ));
}

#[test]
fn unconvertible_image_is_a_type_error() {
    let err = combine(Image::Bare(ArrayD::zeros(IxDyn(&[4]))), CombineMethod::Numpy).unwrap_err();
    assert!(err.to_string().starts_with("Cannot combine unexpected type"));
}

#[test]
fn empty_list_is_rejected() {
    let err = combine(Vec::<Image>::new(), CombineMethod::Numpy).unwrap_err();
    assert!(matches!(err, CallistoError::EmptySequence));
}
