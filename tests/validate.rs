use crosstalk::{validate, EnvelopeKind};

#[test]
fn valid_request_reports_no_errors() {
    let report = validate(
        "[[A→B v1]]\nsession: s1\ncontext: demo\nintent: QUESTION\nbody: |\n  Ping?\nsig: none\n[[END]]",
    );

    assert!(report.valid);
    assert!(report.errors.is_empty());
    let parsed = report.parsed.expect("classification succeeded");
    assert_eq!(parsed.kind, EnvelopeKind::Request);
}

#[test]
fn request_violations_are_collected_not_short_circuited() {
    // No context, unusable intent, empty body: all three reported at once.
    let report = validate("[[A→B v1]]\nsession: s1\nintent: SHRUG\nbody: |\n  \n[[END]]");

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 3);
    assert!(report.errors[0].contains("context"));
    assert!(report.errors[1].contains("intent"));
    assert!(report.errors[2].contains("body"));
    assert!(report.parsed.is_some());
}

#[test]
fn response_with_empty_payload_is_invalid() {
    let report = validate("[[B→A v1]]\nsession: s1\nresponse: |\n  \n[[END]]");

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("response"));
}

#[test]
fn classification_failure_yields_a_single_error_and_no_parse() {
    let report = validate("not an envelope at all");

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.parsed.is_none());
}

#[test]
fn both_response_dialects_validate_identically() {
    let dialect_a = validate("[[B→A v1]]\nsession: s1\nresponse: |\n  Pong.\n[[END]]");
    let dialect_b = validate("[[B→A v1]]\nsession: s1\nbody: |\n  Pong.\n[[END]]");

    assert!(dialect_a.valid);
    assert!(dialect_b.valid);
    assert_eq!(
        dialect_a.parsed.expect("parsed").payload,
        dialect_b.parsed.expect("parsed").payload
    );
}
