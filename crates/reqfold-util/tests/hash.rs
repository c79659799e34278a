use reqfold_util::hash::{sha256_bytes, sharded_path};

#[test]
fn test_sha256_known_value() {
    assert_eq!(
        sha256_bytes(b"hello"),
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
}

#[test]
fn test_sha256_empty() {
    assert_eq!(
        sha256_bytes(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_sharded_path_splits_prefix() {
    let digest = sha256_bytes(b"https://files.example/pkg-1.0.whl");
    let parts = sharded_path(&digest);
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0].len(), 2);
    assert_eq!(parts.concat(), digest);
}

#[test]
fn test_sharded_path_short_digest() {
    assert_eq!(sharded_path("abc"), vec!["abc"]);
}
