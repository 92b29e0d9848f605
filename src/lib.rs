// SPDX-License-Identifier: MIT

//! A HID report descriptor parser that builds the Windows-compatible
//! preparsed data (`HIDP_PREPARSED_DATA`) for a HID top-level collection.
//!
//! The usual entry points are [parse_descriptor] for the preparsed data
//! alone, and [get_collection_description] for the preparsed data plus
//! the byte length of every report the device sends or receives.
//!
//! ```
//! # use hidparse::*;
//! # fn parse(bytes: &[u8]) -> Result<(), ParserError> {
//! let preparsed = parse_descriptor(bytes)?;
//! let caps = preparsed.caps();
//! println!("Top-level usage {}", caps.usage);
//! for field in preparsed.value_caps(ReportType::Input) {
//!     println!("Input field: {field}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The resulting [PreparsedData] can be converted to its binary
//! representation with [PreparsedData::to_bytes] and back with
//! `PreparsedData::try_from(&bytes[..])`.
//! Reading and writing field values of actual HID reports is provided by
//! the [report] module.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).

use thiserror::Error;

macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err);
        }
    };
}

pub mod bits;
pub mod description;
pub mod hid;
pub mod parser;
pub mod preparsed;
pub mod report;
pub mod types;

pub use description::{
    free_collection_description, get_collection_description, CollectionDescription,
    DescriptionError, DeviceDescription, ReportIdDescription,
};
pub use hid::HidError;
pub use parser::MAX_USAGES;
pub use preparsed::{
    CapsInfo, HidCollectionNode, HidValueCaps, HidpCaps, PreparsedData, PreparsedError,
    ReportCaps, ValueCapsFlags,
};
pub use report::ReportError;
pub use types::*;

/// Errors that abort the parsing of a report descriptor.
///
/// No partial preparsed data is ever returned, any of these means the report
/// descriptor is unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("Invalid item at offset {offset}: {source}")]
    InvalidItem { offset: usize, source: HidError },
    #[error("Unsupported item {header:#04x} at offset {offset}")]
    UnsupportedItem { offset: usize, header: u8 },
    #[error("Delimiter {value} at offset {offset} is not supported")]
    DelimiterNotSupported { offset: usize, value: u32 },
    #[error("Pop without Push at offset {offset}")]
    GlobalStackUnderflow { offset: usize },
    #[error("End Collection without Collection at offset {offset}")]
    CollectionStackUnderflow { offset: usize },
    #[error("Too many nested Push items")]
    GlobalStackOverflow,
    #[error("Too many nested collections")]
    CollectionStackOverflow,
    #[error("More than 255 usages at offset {offset}")]
    UsageOverflow { offset: usize },
    #[error("Too many collections")]
    CollectionsOverflow,
    #[error("Too many {report_type} fields")]
    ValuesOverflow { report_type: ReportType },
    #[error("{report_type} report {report_id} exceeds the maximum report length at offset {offset}")]
    ReportTooLong {
        offset: usize,
        report_type: ReportType,
        report_id: ReportId,
    },
    #[error("{count} fields exceed the maximum preparsed data size")]
    TooManyValueCaps { count: usize },
    #[error("Out of memory")]
    OutOfMemory,
}

type Result<T> = std::result::Result<T, ParserError>;

/// Parses the given report descriptor and builds its [PreparsedData].
///
/// This walks all items of the report descriptor, see the [parser] module
/// for the details of how fields and collections are laid out.
pub fn parse_descriptor(bytes: &[u8]) -> Result<PreparsedData> {
    let state = parser::parse_report_descriptor(bytes)?;
    preparsed::build_preparsed_data(&state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    // Generic Desktop Mouse with an unclosed Application collection
    const UNCLOSED: [u8; 14] = [
        0x05, 0x01, // Usage Page (Generic Desktop)
        0x09, 0x02, // Usage (Mouse)
        0xa1, 0x01, // Collection (Application)
        0x75, 0x08, // Report Size (8)
        0x95, 0x01, // Report Count (1)
        0x09, 0x30, // Usage (X)
        0x81, 0x02, // Input (Data,Var,Abs)
    ];

    #[traced_test]
    #[test]
    fn unbalanced_collection_warns() {
        let preparsed = parse_descriptor(&UNCLOSED).unwrap();
        assert_eq!(preparsed.link_collection_nodes().len(), 1);
        assert_eq!(preparsed.caps().input.value_caps, 1);
        assert!(logs_contain("unbalanced collection stack"));
    }

    #[traced_test]
    #[test]
    fn unbalanced_push_warns() {
        let bytes = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x02, // Usage (Mouse)
            0xa1, 0x01, // Collection (Application)
            0xa4, // Push
            0xc0, // End Collection
        ];
        parse_descriptor(&bytes).unwrap();
        assert!(logs_contain("unbalanced global stack"));
        assert!(!logs_contain("unbalanced collection stack"));
    }

    #[traced_test]
    #[test]
    fn fatal_errors_are_logged() {
        let bytes = [0x05, 0x01, 0xb4]; // Pop
        let err = parse_descriptor(&bytes).unwrap_err();
        assert_eq!(err, ParserError::GlobalStackUnderflow { offset: 2 });
        assert!(logs_contain("Pop without Push"));
    }

    #[test]
    fn empty_descriptor() {
        let preparsed = parse_descriptor(&[]).unwrap();
        assert!(preparsed.is_empty());
        assert_eq!(preparsed.to_bytes().len(), preparsed::HEADER_SIZE);
    }

    #[test]
    fn error_messages() {
        let err = ParserError::ReportTooLong {
            offset: 4,
            report_type: ReportType::Feature,
            report_id: ReportId(2),
        };
        assert_eq!(
            format!("{err}"),
            "Feature report 2 exceeds the maximum report length at offset 4"
        );
        let err = ParserError::UsageOverflow { offset: 10 };
        assert_eq!(format!("{err}"), "More than 255 usages at offset 10");
    }
}
