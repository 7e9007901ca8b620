use mlp_core::hashing::{hash_bytes, hash_value};
use serde_json::json;

#[test]
fn hash_value_is_key_order_independent() {
    let h = hash_value(&json!({"b": 2, "a": 1}));
    // blake3 hex
    assert_eq!(h.len(), 64);
    assert_eq!(h, hash_value(&json!({"a": 1, "b": 2})));
}

#[test]
fn hash_bytes_tracks_content() {
    assert_eq!(hash_bytes(b"x1,target\n1,0\n"), hash_bytes(b"x1,target\n1,0\n"));
    assert_ne!(hash_bytes(b"x1,target\n1,0\n"), hash_bytes(b"x1,target\n1,1\n"));
}
