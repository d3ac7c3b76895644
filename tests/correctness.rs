use approx::assert_relative_eq;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::sync::{Arc, Mutex};
use strided_dense::{mult, DenseMatrix, ErrorKind, Op, Permutation, Property, Uplo};

fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn random_f64(seed: u64, n: usize, prop: Property) -> DenseMatrix<'static, f64> {
    DenseMatrix::random_with(&mut rng(seed), n, n, prop, -1.0, 1.0).unwrap()
}

fn random_c64(seed: u64, n: usize, prop: Property) -> DenseMatrix<'static, Complex64> {
    DenseMatrix::random_with(&mut rng(seed), n, n, prop, -1.0, 1.0).unwrap()
}

/// Explicit permutation matrix acting from the left: `Pm[P[i], i] = 1`.
fn left_matrix(p: &Permutation) -> DenseMatrix<'static, f64> {
    let n = p.len();
    DenseMatrix::from_fn(n, n, Property::general(), |i, j| if p[j] == i { 1.0 } else { 0.0 }).unwrap()
}

/// Explicit permutation matrix acting from the right: `Qm[j, Q[j]] = 1`.
fn right_matrix(q: &Permutation) -> DenseMatrix<'static, f64> {
    let n = q.len();
    DenseMatrix::from_fn(n, n, Property::general(), |i, j| if q[i] == j { 1.0 } else { 0.0 }).unwrap()
}

fn product(a: &DenseMatrix<'_, f64>, b: &DenseMatrix<'_, f64>) -> DenseMatrix<'static, f64> {
    let mut c = DenseMatrix::new(a.nrows(), b.ncols(), Property::general()).unwrap();
    mult(1.0, Op::N, a.as_ref(), Op::N, b.as_ref(), 0.0, &mut c).unwrap();
    c
}

fn assert_same(a: &DenseMatrix<'_, f64>, b: &DenseMatrix<'_, f64>) {
    assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()));
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            assert_relative_eq!(a[(i, j)], b[(i, j)], epsilon = 1e-12);
        }
    }
}

#[test]
fn test_convert_to_general_real_structures() {
    // 300 exceeds the default recursion threshold
    for n in [7, 300] {
        for uplo in [Uplo::Upper, Uplo::Lower] {
            let s = random_f64(1, n, Property::symmetric(uplo)).convert_to_general().unwrap();
            let k = random_f64(2, n, Property::skew(uplo)).convert_to_general().unwrap();
            let t_src = random_f64(3, n, Property::triangular(uplo));
            let t = t_src.convert_to_general().unwrap();
            for j in 0..n {
                assert_eq!(k[(j, j)], 0.0);
                for i in 0..n {
                    assert_eq!(s[(i, j)], s[(j, i)]);
                    assert_eq!(k[(i, j)], -k[(j, i)]);
                    let stored = if uplo == Uplo::Upper { i <= j } else { i >= j };
                    if stored {
                        assert_eq!(t[(i, j)], t_src[(i, j)]);
                    } else {
                        assert_eq!(t[(i, j)], 0.0);
                    }
                }
            }
        }
    }
}

#[test]
fn test_convert_to_general_hermitian() {
    for n in [5, 270] {
        for uplo in [Uplo::Upper, Uplo::Lower] {
            let h = random_c64(4, n, Property::hermitian(uplo)).convert_to_general().unwrap();
            assert!(h.prop().is_general());
            for j in 0..n {
                assert_eq!(h[(j, j)].im, 0.0);
                for i in 0..n {
                    assert_eq!(h[(i, j)], h[(j, i)].conj());
                }
            }
        }
    }
}

#[test]
fn test_random_hermitian_diagonal_is_real() {
    let h = DenseMatrix::<Complex64>::random(12, 12, Property::hermitian(Uplo::Lower)).unwrap();
    for j in 0..12 {
        assert_eq!(h[(j, j)].im, 0.0);
    }
}

#[test]
fn test_scale_identity_and_zero() {
    for prop in [
        Property::general(),
        Property::symmetric(Uplo::Lower),
        Property::triangular(Uplo::Upper),
        Property::skew(Uplo::Upper),
    ] {
        let a = random_f64(5, 280, prop);
        let one = a.scaled(1.0).unwrap();
        assert_eq!(one.as_slice(), a.as_slice());

        let zero = a.scaled(0.0).unwrap();
        assert_eq!(zero.norm_max().unwrap(), 0.0);
        assert_eq!(zero.prop(), prop);
    }
}

#[test]
fn test_scale_respects_declared_fill() {
    // the unstored half of a wrapped buffer is left alone
    let n = 4;
    let mut buf = vec![1.0f64; n * n];
    let mut a = DenseMatrix::wrap(n, n, &mut buf, n, Property::symmetric(Uplo::Upper)).unwrap();
    a.scale(3.0).unwrap();
    drop(a);
    for j in 0..n {
        for i in 0..n {
            let want = if i <= j { 3.0 } else { 1.0 };
            assert_eq!(buf[i + j * n], want);
        }
    }
}

#[test]
fn test_similarity_permutation_inverse_law() {
    let n = 40;
    let p = Permutation::random_with(&mut rng(6), n);
    let ip = p.inverse();

    for uplo in [Uplo::Upper, Uplo::Lower] {
        let s = random_f64(7, n, Property::symmetric(uplo));
        let back = s.permute_similarity(&p).unwrap().permute_similarity(&ip).unwrap();
        assert_same(&back.convert_to_general().unwrap(), &s.convert_to_general().unwrap());

        let h = random_c64(8, n, Property::hermitian(uplo));
        let back = h.permute_similarity(&p).unwrap().permute_similarity(&ip).unwrap();
        assert_eq!(back.prop(), Property::hermitian(uplo));
        let (x, y) = (back.convert_to_general().unwrap(), h.convert_to_general().unwrap());
        for j in 0..n {
            for i in 0..n {
                assert_relative_eq!(x[(i, j)].re, y[(i, j)].re, epsilon = 1e-12);
                assert_relative_eq!(x[(i, j)].im, y[(i, j)].im, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn test_similarity_permutation_matches_explicit_product() {
    let n = 9;
    let p = Permutation::random_with(&mut rng(10), n);
    let pm = left_matrix(&p);
    let pt = pm.transpose().unwrap();
    for prop in [Property::symmetric(Uplo::Lower), Property::skew(Uplo::Upper)] {
        let a = random_f64(11, n, prop);
        let got = a.permute_similarity(&p).unwrap().convert_to_general().unwrap();
        let want = product(&product(&pm, &a.convert_to_general().unwrap()), &pt);
        assert_same(&got, &want);
    }
}

#[test]
fn test_block_derivation_boundary() {
    let s = random_f64(12, 6, Property::symmetric(Uplo::Lower));

    let err = s.block(2, 2, 3, 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Property);
    let err = s.block_ref(1, 2, 2, 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Property);

    let d = s.block(2, 2, 3, 3).unwrap();
    assert_eq!(d.prop(), Property::symmetric(Uplo::Lower));
    let g = s.block_ref(2, 2, 3, 3).unwrap();
    assert_eq!(g.prop(), Property::symmetric(Uplo::Lower));
    assert_eq!(g[(2, 1)], s[(4, 3)]);
}

#[test]
fn test_permutation_three_by_three() {
    let a = DenseMatrix::<f64>::from_fn(3, 3, Property::general(), |i, j| (i + 3 * j) as f64).unwrap();
    let p = Permutation::from_vec(vec![1, 2, 0]).unwrap();
    let q = Permutation::from_vec(vec![2, 0, 1]).unwrap();
    let (pm, qm) = (left_matrix(&p), right_matrix(&q));

    assert_same(&product(&pm, &a), &a.permute_left(&p).unwrap());
    assert_same(&product(&a, &qm), &a.permute_right(&q).unwrap());

    let paq = product(&product(&pm, &a), &qm);
    assert_same(&paq, &a.permute_right(&q).unwrap().permute_left(&p).unwrap());
    assert_same(&paq, &a.permute_left_right(&p, &q).unwrap());
}

#[test]
fn test_permutation_composition() {
    let a = random_f64(13, 8, Property::general());
    let r = Permutation::random_with(&mut rng(14), 8);
    let p = Permutation::random_with(&mut rng(15), 8);
    let twice = a.permute_left(&r).unwrap().permute_left(&p).unwrap();
    let once = a.permute_left(&r.permute_left(&p).unwrap()).unwrap();
    assert_same(&twice, &once);
}

#[test]
fn test_hermitian_frobenius_threshold() {
    let n = 200;
    let h = random_c64(16, n, Property::hermitian(Uplo::Lower));
    let naive = h.norm_fro().unwrap();
    let general = h.convert_to_general().unwrap().norm_fro().unwrap();
    assert_relative_eq!(naive, general, max_relative = 1e-10);
}

#[test]
fn test_norms_match_expanded_general() {
    for prop in [
        Property::symmetric(Uplo::Upper),
        Property::skew(Uplo::Lower),
        Property::triangular(Uplo::Lower),
    ] {
        let a = random_f64(17, 150, prop);
        let g = a.convert_to_general().unwrap();
        assert_relative_eq!(a.norm_one().unwrap(), g.norm_one().unwrap(), max_relative = 1e-12);
        assert_relative_eq!(a.norm_inf().unwrap(), g.norm_inf().unwrap(), max_relative = 1e-12);
        assert_relative_eq!(a.norm_max().unwrap(), g.norm_max().unwrap(), max_relative = 1e-12);
        assert_relative_eq!(a.norm_fro().unwrap(), g.norm_fro().unwrap(), max_relative = 1e-10);
    }
}

#[test]
fn test_lifecycle() {
    let mut a = random_f64(18, 5, Property::general());
    let snapshot = a.copy();

    {
        let mut alias = a.rcopy();
        alias.scale(2.0).unwrap();
    }
    assert_eq!(a[(3, 4)], 2.0 * snapshot[(3, 4)]);

    let mut moved = a.move_out();
    assert!(a.is_empty());
    assert!(moved.is_owner());

    moved.clear();
    assert!(moved.is_empty());
    assert_eq!(moved.nrows(), 0);
    assert_eq!(moved.ld(), 0);
}

#[test]
fn test_unsupported_operations() {
    let s = random_c64(19, 4, Property::hermitian(Uplo::Upper));
    assert_eq!(s.conjugate_transpose().unwrap_err().kind(), ErrorKind::Unsupported);

    let wide = random_f64(20, 3, Property::general());
    assert_eq!(wide.norm_euc().unwrap_err().kind(), ErrorKind::Unsupported);
}

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_dispatch_events() {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut h = random_c64(21, 200, Property::hermitian(Uplo::Upper));
        h.norm_fro().unwrap();
        h.scale(Complex64::new(2.0, 0.0)).unwrap();

        let s = random_f64(22, 4, Property::symmetric(Uplo::Lower));
        let g = random_f64(23, 4, Property::general());
        let mut c = DenseMatrix::zeros(4, 4, Property::general()).unwrap();
        mult(1.0, Op::N, s.as_ref(), Op::N, g.as_ref(), 0.0, &mut c).unwrap();
    });

    let out = log.contents();
    assert!(out.contains("naive frobenius sum"), "{out}");
    assert!(out.contains("triangular dispatch"), "{out}");
    assert!(out.contains("expanding structural operand"), "{out}");
}
