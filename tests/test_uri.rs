use catalog_httpd::http::uri::{
    decode_component, decode_path, is_bad_uri, path_of, query_param, DecodeError,
};

#[test]
fn test_rejects_relative_targets() {
    for target in ["", "index.html", "*", "http://host/", "?key=a"] {
        assert!(is_bad_uri(target), "{target:?} should be rejected");
    }
}

#[test]
fn test_rejects_traversal_segments() {
    for target in ["/../etc/passwd", "/a/../b", "/a/b/..", "/..", "/x/../../y?key=z"] {
        assert!(is_bad_uri(target), "{target:?} should be rejected");
    }
}

#[test]
fn test_accepts_lookalike_segments() {
    for target in ["/", "/a..b", "/..hidden", "/a/...", "/a/..b/c", "/index.html?x=1"] {
        assert!(!is_bad_uri(target), "{target:?} should be accepted");
    }
}

#[test]
fn test_guard_is_textual() {
    // dot segments other than the literal patterns are not canonicalised
    assert!(!is_bad_uri("/a/./b"));
    assert!(!is_bad_uri("/a/%2e%2e/b"));
}

#[test]
fn test_path_of_strips_query() {
    assert_eq!(path_of("/a/b.html?x=1&y=2"), "/a/b.html");
    assert_eq!(path_of("/plain"), "/plain");
    assert_eq!(path_of("/?key=photo"), "/");
}

#[test]
fn test_query_param_first_match_wins() {
    assert_eq!(query_param("/?a=1&key=first&key=second", "key"), Some("first"));
    assert_eq!(query_param("/?&&key=x", "key"), Some("x"));
    assert_eq!(query_param("/?key=a=b", "key"), Some("a=b"));
    assert_eq!(query_param("/?Key=x", "key"), None);
}

#[test]
fn test_decoding_never_grows_input() {
    let inputs = ["", "plain", "a+b", "%41%42%43", "%e2%9c%93+ok", "100%25"];
    for input in inputs {
        let decoded = decode_component(input).unwrap();
        assert!(decoded.len() <= input.len(), "{input:?} grew");
    }
}

#[test]
fn test_decoding_failures_are_deterministic() {
    for input in ["%", "%4", "abc%", "%zz", "%4g", "ok%0"] {
        let first = decode_component(input);
        assert!(first.is_err(), "{input:?} should fail");
        assert_eq!(first, decode_component(input));
    }
    assert_eq!(decode_path("/a%"), Err(DecodeError::Truncated(2)));
}

#[test]
fn test_mixed_case_hex() {
    assert_eq!(decode_component("%4a%4A").unwrap(), b"JJ");
}

#[test]
fn test_form_encoding_round_trip() {
    let samples = [
        "photo",
        "my photo.jpg",
        "a+b=c&d",
        "100% cotton",
        "tabs\tand\nnewlines",
        "~!@#$^*()[]{}|;:'\",<>?",
    ];

    for sample in samples {
        let encoded: String = url::form_urlencoded::byte_serialize(sample.as_bytes()).collect();
        assert_eq!(decode_component(&encoded).unwrap(), sample.as_bytes());
    }
}
