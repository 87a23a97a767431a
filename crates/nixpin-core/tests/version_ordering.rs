use nixpin_core::version::PyVersion;

fn v(s: &str) -> PyVersion {
    PyVersion::parse(s).unwrap()
}

#[test]
fn release_chain_orders_as_documented() {
    // dev < pre < final < post, within one release.
    let chain = [
        "1.0.dev1", "1.0a1", "1.0a2.dev1", "1.0a2", "1.0b1", "1.0rc1", "1.0", "1.0.post1",
    ];
    for pair in chain.windows(2) {
        assert!(
            v(pair[0]) < v(pair[1]),
            "expected {} < {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn trailing_zeros_are_insignificant() {
    assert_eq!(v("1.0"), v("1.0.0"));
    assert_eq!(v("2"), v("2.0.0.0"));
    assert!(v("1.0.1") > v("1.0"));
}

#[test]
fn epoch_dominates_release() {
    assert!(v("1!1.0") > v("2024.12"));
    assert!(v("1!0.1") > v("999.0"));
}

#[test]
fn local_version_sorts_above_public() {
    assert!(v("1.0+local") > v("1.0"));
    assert!(v("1.0+abc.2") > v("1.0+abc.1"));
    // Numeric local segments sort above text segments.
    assert!(v("1.0+1") > v("1.0+abc"));
}

#[test]
fn spelling_variants_normalize() {
    assert_eq!(v("1.0alpha1"), v("1.0a1"));
    assert_eq!(v("1.0-c2"), v("1.0rc2"));
    assert_eq!(v("1.0-post.1"), v("1.0.post1"));
    assert_eq!(v("1.0-2"), v("1.0.post2"));
}

#[test]
fn rejects_garbage() {
    assert!(PyVersion::parse("").is_none());
    assert!(PyVersion::parse("not-a-version").is_none());
    assert!(PyVersion::parse("1.0.x").is_none());
}
