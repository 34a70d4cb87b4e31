use super::*;

#[test]
fn fnv_seeded_hash_is_stable() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"journey");
    let mut b = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    b.write_u8(b'j');
    b.write_bytes(b"ourney");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn str_writes_are_length_prefixed() {
    let mut a = Fnv1a64::new_default();
    a.write_str("ab");
    a.write_str("c");
    let mut b = Fnv1a64::new_default();
    b.write_str("a");
    b.write_str("bc");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn f64_writes_hash_bit_patterns() {
    let mut a = Fnv1a64::new_default();
    a.write_f64(0.0);
    let mut b = Fnv1a64::new_default();
    b.write_f64(-0.0);
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn share_of_guards_empty_reference() {
    assert_eq!(share_of(5, 0), 0.0);
    assert_eq!(share_of(5, 10), 0.5);
    assert_eq!(share_of(20, 10), 1.0);
}
