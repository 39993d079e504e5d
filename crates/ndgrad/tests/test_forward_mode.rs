//! Integration tests for forward-mode differentiation.

use approx::assert_relative_eq;
use ndgrad::autodiff::{GradMode, jvp, no_forward_ad, ops, set_mode};
use ndgrad::{Array, GradError, Value};

fn array(data: Vec<f64>, shape: &[usize]) -> Array {
    Array::from_vec(data, shape).unwrap()
}

#[test]
fn test_multiply_populates_node_and_tangent() {
    let _mode = set_mode(GradMode::ENABLED);
    let a = Value::leaf(array(vec![1.0, 2.0, 3.0], &[3])).unwrap();
    let b = Value::leaf(array(vec![4.0, 5.0, 6.0], &[3])).unwrap();
    a.make_dual(array(vec![1.0, 0.0, -1.0], &[3])).unwrap();
    b.make_dual(array(vec![0.5, 0.5, 0.5], &[3])).unwrap();

    let c = ops::mul(&a, &b).unwrap();
    assert!(c.grad_node().is_some());
    assert!(c.is_dual());

    // ta * b + a * tb
    let tangent = c.tangent().unwrap().to_array();
    let expected = [1.0 * 4.0 + 1.0 * 0.5, 0.0 * 5.0 + 2.0 * 0.5, -6.0 + 3.0 * 0.5];
    for (t, e) in tangent.data().iter().zip(expected) {
        assert_relative_eq!(*t, e, epsilon = 1e-12);
    }

    // Reverse pass is unaffected by the tangents
    c.sum_all().unwrap().backward().unwrap();
    assert_eq!(a.grad().unwrap().to_array().data(), &[4.0, 5.0, 6.0]);
    assert_eq!(b.grad().unwrap().to_array().data(), &[1.0, 2.0, 3.0]);
}

#[test]
fn test_add_tangent_is_sum_of_tangents() {
    let _mode = set_mode(GradMode::ENABLED);
    let a = Value::constant(array(vec![1.0, 2.0], &[2]));
    let b = Value::constant(array(vec![10.0, 20.0], &[2]));
    a.make_dual(array(vec![0.1, 0.2], &[2])).unwrap();
    b.make_dual(array(vec![1.0, 2.0], &[2])).unwrap();
    let c = a.add(&b).unwrap();
    let t = c.tangent().unwrap().to_array();
    assert_relative_eq!(t.data()[0], 1.1, epsilon = 1e-12);
    assert_relative_eq!(t.data()[1], 2.2, epsilon = 1e-12);
    // No input requires grad, so there is no node
    assert!(c.grad_node().is_none());
}

#[test]
fn test_non_dual_inputs_are_not_promoted_in_place() {
    let _mode = set_mode(GradMode::ENABLED);
    let a = Value::constant(array(vec![2.0], &[1]));
    let b = Value::constant(array(vec![3.0], &[1]));
    a.make_dual(array(vec![1.0], &[1])).unwrap();
    let c = a.mul(&b).unwrap();
    assert_eq!(c.tangent().unwrap().item().unwrap(), 3.0);
    assert!(!b.is_dual());
    assert!(b.tangent().is_none());
}

#[test]
fn test_forward_mode_marks_outputs_dual_with_zero_tangent() {
    let _mode = set_mode(GradMode::ENABLED);
    let a = Value::leaf(array(vec![2.0, 3.0], &[2])).unwrap();
    let c = a.mul(&a).unwrap().sin().unwrap();
    assert!(c.is_dual());
    assert_eq!(c.tangent().unwrap().to_array(), Array::zeros(&[2]));
    assert!(c.grad_node().is_some());
    assert!(!a.is_dual());
}

#[test]
fn test_forward_mode_disabled() {
    let _mode = set_mode(GradMode::ENABLED);
    let a = Value::constant(array(vec![2.0], &[1]));
    a.make_dual(array(vec![1.0], &[1])).unwrap();
    let c = no_forward_ad(|| a.mul(&a)).unwrap();
    assert!(!c.is_dual());
    assert!(c.tangent().is_none());
}

#[test]
fn test_pow_tangent_matches_power_rule() {
    let _mode = set_mode(GradMode::ENABLED);
    let a = Value::constant(array(vec![1.5, 2.0], &[2]));
    a.make_dual(Array::ones(&[2])).unwrap();
    let p = a.pow(&Value::scalar(3.0)).unwrap();
    let t = p.tangent().unwrap().to_array();
    assert_relative_eq!(t.data()[0], 3.0 * 1.5 * 1.5, epsilon = 1e-12);
    assert_relative_eq!(t.data()[1], 12.0, epsilon = 1e-12);
}

#[test]
fn test_tangent_chain_through_layout_and_reduction() {
    let _mode = set_mode(GradMode::ENABLED);
    let x = Value::constant(array(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], &[2, 3]));
    x.make_dual(Array::ones(&[2, 3])).unwrap();
    // y = sum over rows of cos(x^T)
    let y = x
        .transpose(0, 1)
        .unwrap()
        .cos()
        .unwrap()
        .sum(Some(&[1]), false)
        .unwrap();
    assert_eq!(y.shape(), vec![3]);
    let t = y.tangent().unwrap().to_array();
    // Column j of x holds 2j and 2j+1
    for j in 0..3 {
        let (p, q) = ((2 * j) as f64, (2 * j + 1) as f64);
        assert_relative_eq!(t.data()[j], -p.sin() - q.sin(), epsilon = 1e-12);
    }
}

#[test]
fn test_jvp_matches_reverse_mode_gradient() {
    let _mode = set_mode(GradMode::ENABLED);
    let point = array(vec![0.2, -0.4, 1.1], &[3]);
    let f = |x: &Value| x.sin()?.mul(x)?.sum_all();

    // Reverse mode: full gradient
    let x = Value::leaf(point.clone()).unwrap();
    f(&x).unwrap().backward().unwrap();
    let grad = x.grad().unwrap().to_array();

    // Forward mode along each basis vector recovers one gradient entry
    for i in 0..3 {
        let mut direction = Array::zeros(&[3]);
        direction.set(&[i], 1.0).unwrap();
        let (y, ty) = jvp(|v| f(&v[0]), &[Value::constant(point.clone())], &[direction]).unwrap();
        assert_eq!(y.shape(), Vec::<usize>::new());
        assert_relative_eq!(ty.item().unwrap(), grad.data()[i], epsilon = 1e-12);
    }
}

#[test]
fn test_jvp_leaves_primals_untouched() {
    let _mode = set_mode(GradMode::ENABLED);
    let x = Value::constant(array(vec![1.0, 2.0], &[2]));
    let (_, t) = jvp(|v| v[0].mul(&Value::scalar(3.0)), &[x.clone()], &[Array::ones(&[2])]).unwrap();
    assert_eq!(t.data(), &[3.0, 3.0]);
    assert!(!x.is_dual());
}

#[test]
fn test_tangent_shape_must_match() {
    let x = Value::constant(Array::ones(&[2, 2]));
    assert!(matches!(
        x.make_dual(Array::ones(&[4])),
        Err(GradError::TangentShape { .. })
    ));
}
