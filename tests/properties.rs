// SPDX-License-Identifier: MIT

//! Property-based tests for the report layout and data index assignment.

use hidparse::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Field {
    report_type: ReportType,
    report_size: u8,
    report_count: u8,
    usages: Vec<u8>,
    is_array: bool,
}

fn arb_report_type() -> impl Strategy<Value = ReportType> {
    prop_oneof![
        Just(ReportType::Input),
        Just(ReportType::Output),
        Just(ReportType::Feature),
    ]
}

fn arb_field() -> impl Strategy<Value = Field> {
    (
        arb_report_type(),
        1u8..=16,
        0u8..=8,
        proptest::collection::vec(1u8..=0x7f, 0..=4),
        any::<bool>(),
    )
        .prop_map(|(report_type, report_size, report_count, usages, is_array)| Field {
            report_type,
            report_size,
            report_count,
            usages,
            is_array,
        })
}

/// A well-formed descriptor: one application collection with the given fields.
fn descriptor(fields: &[Field]) -> Vec<u8> {
    let mut bytes = vec![
        0x05, 0x01, // Usage Page (Generic Desktop)
        0x09, 0x04, // Usage (Joystick)
        0xa1, 0x01, // Collection (Application)
    ];
    for field in fields {
        for usage in &field.usages {
            bytes.extend_from_slice(&[0x09, *usage]);
        }
        bytes.extend_from_slice(&[0x75, field.report_size, 0x95, field.report_count]);
        let header = match field.report_type {
            ReportType::Input => 0x81,
            ReportType::Output => 0x91,
            ReportType::Feature => 0xb1,
        };
        let data = if field.is_array { 0x00 } else { 0x02 };
        bytes.extend_from_slice(&[header, data]);
    }
    bytes.push(0xc0);
    bytes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Arbitrary bytes either parse or fail, they never panic.
    #[test]
    fn prop_random_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(preparsed) = parse_descriptor(&data) {
            let bytes = preparsed.to_bytes();
            prop_assert_eq!(bytes.len(), preparsed.len());
        }
        let _ = get_collection_description(&data);
    }

    /// Arbitrary bytes never panic when read back as preparsed data.
    #[test]
    fn prop_random_preparsed_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut data = data;
        if data.len() >= 8 {
            data[0..8].copy_from_slice(b"HidP KDR");
        }
        let _ = PreparsedData::try_from(data.as_slice());
    }

    /// Data indices of a report type cover 0..n exactly once.
    #[test]
    fn prop_data_index_dense(fields in proptest::collection::vec(arb_field(), 1..12)) {
        let preparsed = parse_descriptor(&descriptor(&fields))
            .map_err(|e| TestCaseError::fail(format!("{e}")))?;
        for report_type in ReportType::ALL {
            let mut indices: Vec<u16> = preparsed
                .fields(report_type)
                .map(|caps| {
                    assert_eq!(caps.data_index_max, caps.data_index_min);
                    caps.data_index_min
                })
                .collect();
            indices.sort();
            let expected: Vec<u16> = (0..indices.len() as u16).collect();
            prop_assert_eq!(indices, expected);
        }
    }

    /// Fields are laid out back to back after the report id byte and the
    /// report byte length covers all of them.
    #[test]
    fn prop_byte_accounting(fields in proptest::collection::vec(arb_field(), 1..12)) {
        let preparsed = parse_descriptor(&descriptor(&fields))
            .map_err(|e| TestCaseError::fail(format!("{e}")))?;
        for report_type in ReportType::ALL {
            let declared: Vec<&Field> = fields
                .iter()
                .filter(|f| f.report_type == report_type)
                .collect();
            let byte_length = preparsed.report_byte_length(report_type) as usize;
            if declared.is_empty() {
                prop_assert_eq!(byte_length, 0);
                continue;
            }
            let total_bits: usize = 8 + declared
                .iter()
                .map(|f| f.report_size as usize * f.report_count as usize)
                .sum::<usize>();
            let extent = preparsed
                .value_caps_slice(report_type)
                .iter()
                .map(|caps| caps.bit_end())
                .max()
                .unwrap_or(8);
            prop_assert_eq!(extent, total_bits);
            prop_assert_eq!(byte_length, total_bits.div_ceil(8));

            // one empty slot per usage of every item without elements
            let info = preparsed.caps_info(report_type);
            let empty: usize = declared
                .iter()
                .filter(|f| f.report_count == 0)
                .map(|f| f.usages.len().max(1))
                .sum();
            prop_assert_eq!(info.count as usize - (info.end - info.start) as usize, empty);
        }
    }
}
