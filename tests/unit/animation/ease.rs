use super::*;

const ALL: [Ease; 5] = [
    Ease::Linear,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::InOutCubic,
    Ease::InOutSine,
];

#[test]
fn endpoints_are_fixed() {
    for e in ALL {
        assert!(e.apply(0.0).abs() < 1e-12, "{e:?}");
        assert!((e.apply(1.0) - 1.0).abs() < 1e-12, "{e:?}");
    }
}

#[test]
fn input_is_clamped() {
    for e in ALL {
        assert_eq!(e.apply(-3.0), e.apply(0.0));
        assert_eq!(e.apply(7.0), e.apply(1.0));
    }
}

#[test]
fn curves_are_monotonic() {
    for e in ALL {
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = e.apply(i as f64 / 100.0);
            assert!(v >= prev - 1e-12, "{e:?} at {i}");
            prev = v;
        }
    }
}

#[test]
fn symmetric_curves_hit_half_at_midpoint() {
    for e in [Ease::Linear, Ease::InOutQuad, Ease::InOutCubic, Ease::InOutSine] {
        assert!((e.apply(0.5) - 0.5).abs() < 1e-12, "{e:?}");
    }
}

#[test]
fn only_linear_has_no_splines() {
    assert_eq!(Ease::Linear.key_splines(), None);
    assert!(ALL[1..].iter().all(|e| e.key_splines().is_some()));
}
