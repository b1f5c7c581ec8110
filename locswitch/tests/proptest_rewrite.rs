//! Property-based tests for location rewriting and derived configuration.

use locswitch::{
    ConfigDeriver, LocationRewriter, Properties, SwitchingFileIo, BLOB_ENDPOINT_SUFFIX,
    DELEGATE_FILE_IO_KEY, PROTOCOL_MAPPING_PREFIX,
};
use proptest::prelude::*;
use std::borrow::Cow;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Locations in schemes the rules below never mention.
fn unmapped_location() -> impl Strategy<Value = String> {
    ("(file|hdfs|abfss|wasbs)", "[a-z0-9]{1,12}", "[a-zA-Z0-9_./-]{0,40}")
        .prop_map(|(scheme, host, path)| format!("{}://{}/{}", scheme, host, path))
}

fn s3_location() -> impl Strategy<Value = String> {
    ("[a-z0-9-]{3,20}", "[a-zA-Z0-9_./=-]{0,60}")
        .prop_map(|(bucket, key)| format!("s3://{}/{}", bucket, key))
}

/// A property key that may or may not be a SAS token key.
fn property_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,10}".prop_map(|acct| format!("adls.sas-token.{}", acct)),
        "[a-z]{1,10}".prop_map(|acct| format!("adls.sas-token.{}{}", acct, BLOB_ENDPOINT_SUFFIX)),
        "[a-z]{1,10}".prop_map(|acct| format!("adls.sas-token.{}.dfs.core.windows.net", acct)),
        "[a-z.-]{1,20}",
    ]
}

fn properties() -> impl Strategy<Value = Properties> {
    prop::collection::vec((property_key(), "[a-zA-Z0-9=&]{0,16}"), 0..12)
        .prop_map(|entries| entries.into_iter().collect())
}

fn rewriter() -> LocationRewriter {
    let props = Properties::new()
        .with(format!("{}^s3a?://", PROTOCOL_MAPPING_PREFIX), "mem://")
        .with(format!("{}^gs://(\\w+)/", PROTOCOL_MAPPING_PREFIX), "mem://$1-gcs/");
    LocationRewriter::from_properties(&props).unwrap()
}

// ---------------------------------------------------------------------------
// Rewriting
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_unmapped_locations_pass_through(location in unmapped_location()) {
        let rw = rewriter();
        let out = rw.rewrite(&location).unwrap();

        prop_assert!(matches!(out, Cow::Borrowed(_)));
        prop_assert_eq!(out.as_bytes(), location.as_bytes());
    }

    #[test]
    fn test_s3_prefix_swapped(location in s3_location()) {
        let rw = rewriter();
        let out = rw.rewrite(&location).unwrap();

        let rest = location.strip_prefix("s3://").unwrap();
        prop_assert_eq!(out.into_owned(), format!("mem://{}", rest));
    }

    #[test]
    fn test_adapter_handles_report_logical_location(location in s3_location()) {
        use locswitch::FileIo;

        let io = SwitchingFileIo::from_properties(
            Properties::new()
                .with(DELEGATE_FILE_IO_KEY, "memory")
                .with(format!("{}^s3://", PROTOCOL_MAPPING_PREFIX), "mem://"),
        )
        .unwrap();

        let input = io.new_input_file(&location).unwrap();
        prop_assert_eq!(input.location(), location.as_str());

        let output = io.new_output_file(&location).unwrap();
        let converted = output.to_input_file();
        prop_assert_eq!(output.location(), location.as_str());
        prop_assert_eq!(converted.location(), location.as_str());
    }
}

// ---------------------------------------------------------------------------
// Derived configuration
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_derivation_is_idempotent(props in properties()) {
        let once = ConfigDeriver::derive(&props);
        let twice = ConfigDeriver::derive(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_derivation_never_overwrites(props in properties()) {
        let derived = ConfigDeriver::derive(&props);

        for (key, value) in props.iter() {
            prop_assert_eq!(derived.get(key), Some(value));
        }
        prop_assert!(derived.len() >= props.len());
    }
}
