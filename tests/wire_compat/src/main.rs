fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use casevault_protocol::{
        AuditReplayResult, CompleteUploadResponse, IntegrityOutcome, Manifest,
        ManifestVerification, NegotiateUploadRequest, NegotiateUploadResponse,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    ///
    /// Servers differ in whether they write `65` or `65.0` for the same
    /// number; both must parse to the same value.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => {
                if let Some(f) = n.as_f64() {
                    serde_json::json!(f)
                } else {
                    v.clone()
                }
            }
            serde_json::Value::Object(map) => {
                let normalized: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect();
                serde_json::Value::Object(normalized)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent, float-normalized comparison).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  API:  {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    // --- Upload flow ---

    #[test]
    fn fixture_negotiate_request() {
        let req: NegotiateUploadRequest = roundtrip_test("negotiate_request.json");
        assert_eq!(req.size, 52_428_800);
    }

    #[test]
    fn fixture_negotiate_response() {
        let resp: NegotiateUploadResponse = roundtrip_test("negotiate_response.json");
        assert!(resp.upload_url.contains("X-Amz-Signature"));
        assert!(resp.expires_at.is_some());
    }

    #[test]
    fn fixture_negotiate_response_without_expiry() {
        let resp: NegotiateUploadResponse = roundtrip_test("negotiate_response_minimal.json");
        assert!(resp.expires_at.is_none());
    }

    #[test]
    fn fixture_complete_accepted() {
        let resp: CompleteUploadResponse = roundtrip_test("complete_accepted.json");
        match resp.outcome() {
            IntegrityOutcome::Accepted { server_digest } => assert_eq!(
                server_digest.as_deref(),
                Some("9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08")
            ),
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn fixture_complete_rejected() {
        let resp: CompleteUploadResponse = roundtrip_test("complete_rejected.json");
        assert_eq!(
            resp.outcome(),
            IntegrityOutcome::Rejected {
                detail: "object size does not match declared size".into()
            }
        );
    }

    // --- Verification ---

    #[test]
    fn fixture_manifest_keeps_unknown_fields() {
        let manifest: Manifest = roundtrip_test("manifest.json");
        assert_eq!(manifest.evidence.len(), 2);
        assert_eq!(manifest.extra["schema_version"], 2);
        assert_eq!(manifest.evidence[0].extra["uploaded_by"], "officer-17");
        assert!(manifest.evidence[1].size.is_none());
    }

    #[test]
    fn manifest_without_hmac_is_invalid_format() {
        let mut fixture = load_fixture("manifest.json");
        fixture.as_object_mut().unwrap().remove("manifest_hmac");
        let err = Manifest::parse(&fixture.to_string()).unwrap_err();
        assert!(err.to_string().starts_with("invalid manifest format"));
    }

    #[test]
    fn fixture_manifest_verification() {
        let result: ManifestVerification = roundtrip_test("manifest_verification.json");
        assert!(result.sha256_valid);
        assert!(!result.is_valid());
    }

    #[test]
    fn fixture_audit_replay() {
        let result: AuditReplayResult = roundtrip_test("audit_replay.json");
        assert_eq!(result.events_checked, 128);
        assert!(!result.is_clean());
        assert_eq!(result.mismatches[0].evidence_id, "ev-0002");
    }
}
