// SPDX-License-Identifier: MIT

//! The device description: the preparsed data of a report descriptor
//! together with the byte length of each of its reports, the counterpart
//! of `HIDP_DEVICE_DESC`.
//!
//! ```
//! # use hidparse::*;
//! # fn describe(bytes: &[u8]) -> Result<(), DescriptionError> {
//! let desc = get_collection_description(bytes)?;
//! for report in &desc.report_ids {
//!     println!(
//!         "Report {}: {} bytes in, {} bytes out",
//!         report.report_id, report.input_length, report.output_length
//!     );
//! }
//! free_collection_description(desc);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use crate::preparsed::PreparsedData;
use crate::types::*;
use crate::{parse_descriptor, ParserError};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptionError {
    #[error("Failed to parse report descriptor: {0}")]
    ParseFailed(#[from] ParserError),
    #[error("Out of memory")]
    OutOfMemory,
}

/// The top-level collection of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDescription {
    pub usage_page: UsagePage,
    pub usage: UsageId,
    pub collection_number: u8,
    /// Byte lengths of the longest report of each type, including the
    /// report id byte
    pub input_length: u16,
    pub output_length: u16,
    pub feature_length: u16,
    pub preparsed_data: PreparsedData,
}

impl CollectionDescription {
    /// Size of the binary preparsed data in bytes.
    pub fn preparsed_data_length(&self) -> usize {
        self.preparsed_data.len()
    }

    pub fn length(&self, report_type: ReportType) -> u16 {
        match report_type {
            ReportType::Input => self.input_length,
            ReportType::Output => self.output_length,
            ReportType::Feature => self.feature_length,
        }
    }
}

/// The byte lengths of the reports with one report id. A length of 0
/// means the device has no report of that type with this report id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportIdDescription {
    pub report_id: ReportId,
    pub collection_number: u8,
    pub input_length: u16,
    pub output_length: u16,
    pub feature_length: u16,
}

impl ReportIdDescription {
    pub fn length(&self, report_type: ReportType) -> u16 {
        match report_type {
            ReportType::Input => self.input_length,
            ReportType::Output => self.output_length,
            ReportType::Feature => self.feature_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescription {
    pub collection_desc: Vec<CollectionDescription>,
    /// Sorted by report id
    pub report_ids: Vec<ReportIdDescription>,
}

impl DeviceDescription {
    pub fn report_id(&self, report_id: ReportId) -> Option<&ReportIdDescription> {
        self.report_ids.iter().find(|r| r.report_id == report_id)
    }
}

/// Parses the report descriptor and describes the resulting top-level
/// collection and all its reports.
pub fn get_collection_description(bytes: &[u8]) -> Result<DeviceDescription, DescriptionError> {
    let preparsed_data = parse_descriptor(bytes)?;

    // bits per report id, one entry per report type
    let mut extents: BTreeMap<u8, [usize; 3]> = BTreeMap::new();
    for report_type in ReportType::ALL {
        for caps in preparsed_data.value_caps_slice(report_type) {
            let extent = &mut extents.entry(caps.report_id).or_default()[report_type.index()];
            *extent = (*extent).max(caps.bit_end());
        }
    }

    let mut report_ids = Vec::new();
    report_ids
        .try_reserve_exact(extents.len())
        .map_err(|_| DescriptionError::OutOfMemory)?;
    report_ids.extend(extents.iter().map(|(id, bits)| {
        let length = |bits: usize| bits.div_ceil(8) as u16;
        ReportIdDescription {
            report_id: ReportId(*id),
            collection_number: 1,
            input_length: length(bits[0]),
            output_length: length(bits[1]),
            feature_length: length(bits[2]),
        }
    }));

    let usage = preparsed_data.usage();
    let collection = CollectionDescription {
        usage_page: usage.usage_page,
        usage: usage.usage_id,
        collection_number: 1,
        input_length: preparsed_data.report_byte_length(ReportType::Input),
        output_length: preparsed_data.report_byte_length(ReportType::Output),
        feature_length: preparsed_data.report_byte_length(ReportType::Feature),
        preparsed_data,
    };
    tracing::debug!(
        "collection {usage}, {} report ids, lengths {}/{}/{}",
        report_ids.len(),
        collection.input_length,
        collection.output_length,
        collection.feature_length
    );

    Ok(DeviceDescription {
        collection_desc: vec![collection],
        report_ids,
    })
}

/// Releases a device description and the preparsed data it owns.
pub fn free_collection_description(desc: DeviceDescription) {
    drop(desc);
}
