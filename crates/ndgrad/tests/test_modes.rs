//! Integration tests for mode flags.

use ndgrad::autodiff::ops::Mul;
use ndgrad::autodiff::{
    Context, Function, GradMode, enable_grad, is_forward_ad_enabled, is_grad_enabled, no_grad,
    pass_to_graph_with, set_grad_enabled, set_mode,
};
use ndgrad::{Array, Value};

#[test]
fn test_disabling_reverse_mode_skips_node() {
    let _mode = set_mode(GradMode::ENABLED);
    let a = Value::leaf(Array::ones(&[3])).unwrap();
    let b = Value::leaf(Array::ones(&[3])).unwrap();
    let _off = set_grad_enabled(false);
    let c = a.mul(&b).unwrap();
    assert!(c.grad_node().is_none());
    assert!(c.is_leaf());
    assert!(!c.requires_grad());
}

#[test]
fn test_enable_grad_inside_no_grad() {
    let _mode = set_mode(GradMode::ENABLED);
    let a = Value::leaf(Array::ones(&[1])).unwrap();
    let c = no_grad(|| {
        assert!(!is_grad_enabled());
        enable_grad(|| a.sin())
    })
    .unwrap();
    assert!(c.grad_node().is_some());
    assert!(is_grad_enabled());
}

#[test]
fn test_reverse_and_forward_are_separate_switches() {
    let _mode = set_mode(GradMode {
        reverse: false,
        forward: true,
    });
    assert!(!is_grad_enabled());
    assert!(is_forward_ad_enabled());

    let a = Value::leaf(Array::ones(&[2])).unwrap();
    a.make_dual(Array::ones(&[2])).unwrap();
    let c = a.cos().unwrap();
    assert!(c.is_dual());
    assert!(c.grad_node().is_none());
}

#[test]
fn test_explicit_mode_overrides_thread_mode() {
    let _mode = set_mode(GradMode::DISABLED);
    let a = Value::leaf(Array::ones(&[2])).unwrap();
    let b = Value::constant(Array::ones(&[2]));

    let mut mul = Mul;
    let mut ctx = Context::new();
    let out = Value::constant(mul.forward(&mut ctx, &[&a, &b]).unwrap());
    pass_to_graph_with(GradMode::ENABLED, ctx, Box::new(mul), &out).unwrap();

    assert!(out.grad_node().is_some());
    out.sum_all().unwrap(); // thread mode is off: no further recording
    enable_grad(|| out.sum_all().unwrap().backward().unwrap());
    assert_eq!(a.grad().unwrap().to_array().data(), &[1.0, 1.0]);
}
