// Integration tests for the marten-core graph engine
//
// These verify the public builder API end to end: structural deduplication,
// canonical resolution through operand accessors, and that symbolically
// differentiated subgraphs evaluate to the analytic derivatives on sampled
// inputs.

use marten_core::{Error, Graph, Tensor};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

fn assert_vec_approx(got: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(
        got.len(),
        expected.len(),
        "length mismatch: {} vs {}",
        got.len(),
        expected.len()
    );
    for (i, (g, e)) in got.iter().zip(expected.iter()).enumerate() {
        assert!(
            approx_eq(*g, *e, tol),
            "index {}: got {} expected {} (tol {})",
            i,
            g,
            e,
            tol
        );
    }
}

fn sample(rng: &mut SmallRng, len: usize, lo: f64, hi: f64) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(lo..hi)).collect()
}

#[test]
fn test_structural_deduplication_is_identity() -> marten_core::Result<()> {
    let mut g = Graph::new();
    let x = g.var("x", Tensor::full([4], 1.0))?;
    let y = g.var("y", Tensor::full([4], 2.0))?;

    let a = g.div(x, y)?;
    let b = g.div(x, y)?;
    assert_eq!(a, b);

    // Scalar extra args are part of identity.
    let s1 = g.mul_scalar(x, 3.0)?;
    let s2 = g.mul_scalar(x, 3.0)?;
    let s3 = g.mul_scalar(x, 4.0)?;
    assert_eq!(s1, s2);
    assert_ne!(s1, s3);
    Ok(())
}

#[test]
fn test_accessors_resolve_canonical_instance() -> marten_core::Result<()> {
    let mut g = Graph::new();
    let x = g.var("x", Tensor::full([2], 3.0))?;
    let y = g.var("y", Tensor::full([2], 4.0))?;
    let d = g.div(x, y)?;

    // Re-registering the same variable resolves to the canonical leaf.
    let x_again = g.var("x", Tensor::full([2], 3.0))?;
    assert_eq!(x_again, x);
    assert_eq!(g.left(d)?, x);
    assert_eq!(g.right(d)?, y);
    assert_eq!(g.resolve(d)?, d);
    Ok(())
}

#[test]
fn test_variable_redefinition_fails_fast() -> marten_core::Result<()> {
    // Registering a variable name again with a different bound value must be
    // rejected as a configuration conflict; the new value must not vanish
    // into the old binding.
    let mut g = Graph::new();
    let x = g.var("x", Tensor::full([2], 1.0))?;
    assert!(matches!(
        g.var("x", Tensor::full([2], 2.0)),
        Err(Error::VariableRebound { .. })
    ));
    // The original binding is untouched.
    assert_vec_approx(&g.value(x)?.to_vec(), &[1.0; 2], 1e-12);
    Ok(())
}

#[test]
fn test_scalar_division_gradient_matches_analytic() -> marten_core::Result<()> {
    // f(x) = x / c has d/dx = 1/c regardless of x.
    let mut rng = SmallRng::seed_from_u64(7);
    let c = 4.0;
    let xs = sample(&mut rng, 8, -10.0, 10.0);

    let mut g = Graph::new();
    let x = g.var("x", Tensor::from_vec(xs, [8])?)?;
    let z = g.div_scalar(x, c)?;

    let upstream = g.constant(Tensor::full([8], 1.0))?;
    let grads = g.differentiate(z, &[upstream])?;
    assert_eq!(grads.len(), 1);
    assert_vec_approx(&g.value(grads[0])?.to_vec(), &[1.0 / c; 8], 1e-12);
    Ok(())
}

#[test]
fn test_tensor_division_gradients_match_analytic() -> marten_core::Result<()> {
    // f(x, y) = x / y: dx = g / y, dy = -g * x / y^2.
    let mut rng = SmallRng::seed_from_u64(11);
    let xs = sample(&mut rng, 16, -5.0, 5.0);
    let ys = sample(&mut rng, 16, 0.5, 3.0); // bounded away from zero
    let gs = sample(&mut rng, 16, -2.0, 2.0);

    let mut g = Graph::new();
    let x = g.var("x", Tensor::from_vec(xs.clone(), [16])?)?;
    let y = g.var("y", Tensor::from_vec(ys.clone(), [16])?)?;
    let q = g.div(x, y)?;

    let upstream = g.constant(Tensor::from_vec(gs.clone(), [16])?)?;
    let grads = g.differentiate(q, &[upstream])?;
    assert_eq!(grads.len(), 2);

    let expected_dx: Vec<f64> = gs.iter().zip(&ys).map(|(g, y)| g / y).collect();
    let expected_dy: Vec<f64> = gs
        .iter()
        .zip(xs.iter().zip(&ys))
        .map(|(g, (x, y))| -g * x / (y * y))
        .collect();
    assert_vec_approx(&g.value(grads[0])?.to_vec(), &expected_dx, 1e-10);
    assert_vec_approx(&g.value(grads[1])?.to_vec(), &expected_dy, 1e-10);
    Ok(())
}

#[test]
fn test_chain_rule_composes_through_layers() -> marten_core::Result<()> {
    // z = (x + y) / 2: dz/dx = dz/dy = 1/2, reached by feeding the gradient
    // of the outer node in as the upstream of the inner one.
    let mut g = Graph::new();
    let x = g.var("x", Tensor::full([4], 3.0))?;
    let y = g.var("y", Tensor::full([4], 5.0))?;
    let s = g.add(x, y)?;
    let z = g.div_scalar(s, 2.0)?;

    let upstream = g.constant(Tensor::full([4], 1.0))?;
    let dz_ds = g.differentiate(z, &[upstream])?[0];
    let ds = g.differentiate(s, &[dz_ds])?;
    assert_vec_approx(&g.value(ds[0])?.to_vec(), &[0.5; 4], 1e-12);
    assert_vec_approx(&g.value(ds[1])?.to_vec(), &[0.5; 4], 1e-12);
    Ok(())
}

#[test]
fn test_product_gradient_uses_other_operand() -> marten_core::Result<()> {
    let mut g = Graph::new();
    let x = g.var("x", Tensor::full([3], 3.0))?;
    let y = g.var("y", Tensor::full([3], 7.0))?;
    let p = g.mul(x, y)?;

    let upstream = g.constant(Tensor::full([3], 2.0))?;
    let grads = g.differentiate(p, &[upstream])?;
    assert_vec_approx(&g.value(grads[0])?.to_vec(), &[14.0; 3], 1e-12);
    assert_vec_approx(&g.value(grads[1])?.to_vec(), &[6.0; 3], 1e-12);
    Ok(())
}

#[test]
fn test_differentiation_is_symbolic_not_numeric() -> marten_core::Result<()> {
    // differentiate() only builds nodes; the gradient subgraph renders as a
    // formula and is evaluated separately.
    let mut g = Graph::new();
    let x = g.var("x", Tensor::full([2], 2.0))?;
    let y = g.var("y", Tensor::full([2], 4.0))?;
    let q = g.div(x, y)?;

    let upstream = g.var("g", Tensor::full([2], 1.0))?;
    let grads = g.differentiate(q, &[upstream])?;
    assert_eq!(g.formula(grads[0])?, "div(g, y)");
    assert_eq!(g.formula(grads[1])?, "mul_scalar(div(mul(g, x), mul(y, y)), -1)");
    Ok(())
}

#[test]
fn test_duplicate_is_canonical_reconstruction() -> marten_core::Result<()> {
    let mut g = Graph::new();
    let x = g.var("x", Tensor::full([2], 1.0))?;
    let y = g.var("y", Tensor::full([2], 2.0))?;
    let d = g.div(x, y)?;

    let before = g.len();
    let dup = g.duplicate(d)?;
    assert_eq!(dup, d);
    assert_eq!(g.len(), before);
    assert_vec_approx(&g.value(dup)?.to_vec(), &[0.5; 2], 1e-12);
    Ok(())
}

#[test]
fn test_shared_subexpression_evaluates_consistently() -> marten_core::Result<()> {
    // s = x + y appears under two consumers; dedup makes it one node and
    // evaluation agrees everywhere it is referenced.
    let mut g = Graph::new();
    let x = g.var("x", Tensor::full([2], 1.0))?;
    let y = g.var("y", Tensor::full([2], 3.0))?;
    let s1 = g.add(x, y)?;
    let s2 = g.add(x, y)?;
    let prod = g.mul(s1, s2)?;
    assert_eq!(s1, s2);
    assert_vec_approx(&g.value(prod)?.to_vec(), &[16.0; 2], 1e-12);
    Ok(())
}
