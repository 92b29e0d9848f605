// SPDX-License-Identifier: MIT

//! Reading and writing HID reports with the help of the [PreparsedData].
//!
//! Reports are passed with their leading report id byte, which is 0 for
//! devices that do not use report ids, and must be exactly as long as the
//! report byte length of their report type.
//!
//! ```
//! # use hidparse::*;
//! # use hidparse::report::*;
//! # fn read(preparsed: &PreparsedData, report: &[u8]) -> Result<(), ReportError> {
//! let x = get_usage_value(preparsed, ReportType::Input, UsagePage(0x01), None, UsageId(0x30), report)?;
//! let buttons = get_usages(preparsed, ReportType::Input, Some(UsagePage(0x09)), None, report)?;
//! println!("X is {x}, buttons {buttons:?} are pressed");
//! # Ok(())
//! # }
//! ```

use crate::bits::{read_bits, sign_extend, write_bits};
use crate::preparsed::{HidValueCaps, PreparsedData};
use crate::types::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Invalid report length {actual}, expected {expected}")]
    InvalidReportLength { expected: usize, actual: usize },
    #[error("Report id {report_id} does not contain the requested usage")]
    IncompatibleReportId { report_id: ReportId },
    #[error("Usage {usage} not found")]
    UsageNotFound { usage: Usage },
    #[error("Value {value} out of range for usage {usage}")]
    ValueOutOfRange { usage: Usage, value: i64 },
    #[error("Invalid logical or physical range for usage {usage}")]
    InvalidLogicalPhysicalRange { usage: Usage },
}

type Result<T> = std::result::Result<T, ReportError>;

fn check_length(preparsed: &PreparsedData, report_type: ReportType, report: &[u8]) -> Result<()> {
    let expected = preparsed.report_byte_length(report_type) as usize;
    ensure!(
        report.len() == expected && expected > 0,
        ReportError::InvalidReportLength {
            expected,
            actual: report.len()
        }
    );
    Ok(())
}

/// Finds the value caps of a (non-button) usage for the report id in
/// `report_id`.
fn find_value_caps<'a>(
    preparsed: &'a PreparsedData,
    report_type: ReportType,
    usage: Usage,
    link_collection: Option<u16>,
    report_id: ReportId,
) -> Result<&'a HidValueCaps> {
    let mut candidates = preparsed
        .specific_value_caps(
            report_type,
            Some(usage.usage_page),
            link_collection,
            Some(usage.usage_id),
        )
        .peekable();
    ensure!(
        candidates.peek().is_some(),
        ReportError::UsageNotFound { usage }
    );
    candidates
        .find(|caps| caps.report_id == report_id.0)
        .ok_or(ReportError::IncompatibleReportId { report_id })
}

/// Bit offset of the element of `caps` holding `usage`, if that element
/// lies within the report.
fn element_offset(caps: &HidValueCaps, usage: Usage, report: &[u8]) -> Result<usize> {
    let index = if caps.is_range() {
        usage.usage_id.0.wrapping_sub(caps.usage_min) as usize
    } else {
        0
    };
    ensure!(
        index < caps.report_count as usize,
        ReportError::UsageNotFound { usage }
    );
    let offset = caps.bit_offset() + index * caps.bit_size as usize;
    ensure!(
        offset + caps.bit_size as usize <= report.len() * 8,
        ReportError::InvalidReportLength {
            expected: (offset + caps.bit_size as usize).div_ceil(8),
            actual: report.len()
        }
    );
    Ok(offset)
}

/// Whether all elements of `caps` lie within a report of `report_len` bytes.
fn fits(caps: &HidValueCaps, report_len: usize) -> bool {
    caps.bit_end() <= report_len * 8
}

/// Prepares an empty report of the given type and report id: all bits are
/// zero except the report id byte and the null values of variable fields
/// that have a null state.
pub fn initialize_report(
    preparsed: &PreparsedData,
    report_type: ReportType,
    report_id: ReportId,
    report: &mut [u8],
) -> Result<()> {
    check_length(preparsed, report_type, report)?;
    report.fill(0);
    report[0] = report_id.0;
    let report_len = report.len();

    for caps in preparsed
        .fields(report_type)
        .filter(|caps| caps.report_id == report_id.0 && !caps.is_array() && caps.null_value != 0)
        .filter(|caps| fits(caps, report_len))
    {
        let bit_size = caps.bit_size.min(32) as usize;
        for i in 0..caps.report_count as usize {
            let start = caps.bit_offset() + i * caps.bit_size as usize;
            write_bits(report, start, bit_size, caps.null_value as u32);
        }
    }
    Ok(())
}

/// Looks up a usage for the report id of `report` and reads its raw value.
fn read_value<'a>(
    preparsed: &'a PreparsedData,
    report_type: ReportType,
    usage: Usage,
    link_collection: Option<u16>,
    report: &[u8],
) -> Result<(&'a HidValueCaps, u32)> {
    check_length(preparsed, report_type, report)?;
    let caps = find_value_caps(
        preparsed,
        report_type,
        usage,
        link_collection,
        ReportId(report[0]),
    )?;
    ensure!(
        caps.bit_size <= 32,
        ReportError::ValueOutOfRange { usage, value: 0 }
    );
    let offset = element_offset(caps, usage, report)?;
    let value = read_bits(report, offset, caps.bit_size as usize);
    Ok((caps, value))
}

/// The raw (unsigned) value of a usage.
pub fn get_usage_value(
    preparsed: &PreparsedData,
    report_type: ReportType,
    usage_page: UsagePage,
    link_collection: Option<u16>,
    usage: UsageId,
    report: &[u8],
) -> Result<u32> {
    let usage = Usage {
        usage_page,
        usage_id: usage,
    };
    let (_, value) = read_value(preparsed, report_type, usage, link_collection, report)?;
    Ok(value)
}

/// The value of a usage mapped from its logical range onto its physical
/// range, see `HidP_GetScaledUsageValue`.
///
/// The raw value is sign-extended if the logical minimum is negative and
/// must lie within the logical range. A physical range of 0..0 leaves the
/// logical value as is.
pub fn get_scaled_usage_value(
    preparsed: &PreparsedData,
    report_type: ReportType,
    usage_page: UsagePage,
    link_collection: Option<u16>,
    usage: UsageId,
    report: &[u8],
) -> Result<i32> {
    let usage = Usage {
        usage_page,
        usage_id: usage,
    };
    let (caps, raw) = read_value(preparsed, report_type, usage, link_collection, report)?;
    ensure!(
        caps.logical_min <= caps.logical_max && caps.physical_min <= caps.physical_max,
        ReportError::InvalidLogicalPhysicalRange { usage }
    );
    let value = if caps.logical_min < 0 {
        sign_extend(raw, caps.bit_size as usize)
    } else {
        raw as i32
    };
    ensure!(
        (caps.logical_min..=caps.logical_max).contains(&value),
        ReportError::ValueOutOfRange {
            usage,
            value: value as i64
        }
    );
    if (caps.physical_min == 0 && caps.physical_max == 0) || caps.logical_min == caps.logical_max {
        return Ok(value);
    }

    let logical = caps.logical_max as i64 - caps.logical_min as i64;
    let physical = caps.physical_max as i64 - caps.physical_min as i64;
    let scaled = caps.physical_min as i64 + (value as i64 - caps.logical_min as i64) * physical / logical;
    Ok(scaled as i32)
}

/// Sets the raw value of a usage. The value must fit into the field.
pub fn set_usage_value(
    preparsed: &PreparsedData,
    report_type: ReportType,
    usage_page: UsagePage,
    link_collection: Option<u16>,
    usage: UsageId,
    value: u32,
    report: &mut [u8],
) -> Result<()> {
    check_length(preparsed, report_type, report)?;
    let full_usage = Usage {
        usage_page,
        usage_id: usage,
    };
    let caps = find_value_caps(
        preparsed,
        report_type,
        full_usage,
        link_collection,
        ReportId(report[0]),
    )?;
    let bit_size = caps.bit_size as u32;
    ensure!(
        bit_size <= 32 && (bit_size == 32 || value >> bit_size == 0),
        ReportError::ValueOutOfRange {
            usage: full_usage,
            value: value as i64
        }
    );
    let offset = element_offset(caps, full_usage, report)?;
    write_bits(report, offset, bit_size as usize, value);
    Ok(())
}

/// The usages of all buttons set in the report, optionally limited to a
/// usage page and a link collection.
///
/// Variable buttons are reported in the order of their bits, array
/// elements in the order of their position in the report.
pub fn get_usages(
    preparsed: &PreparsedData,
    report_type: ReportType,
    usage_page: Option<UsagePage>,
    link_collection: Option<u16>,
    report: &[u8],
) -> Result<Vec<Usage>> {
    check_length(preparsed, report_type, report)?;
    let report_id = report[0];
    let mut usages = Vec::new();
    let mut chain: Vec<&HidValueCaps> = Vec::new();

    for caps in preparsed
        .button_caps(report_type)
        .filter(|caps| caps.report_id == report_id && !caps.is_constant())
        .filter(|caps| fits(caps, report.len()))
        .filter(|caps| link_collection.map_or(true, |lc| caps.link_collection == lc))
    {
        if caps.is_array() {
            chain.push(caps);
            if !caps.array_has_more() {
                array_usages(&chain, usage_page, report, &mut usages);
                chain.clear();
            }
            continue;
        }
        if usage_page.map_or(false, |up| up.0 != caps.usage_page) {
            continue;
        }
        let bit_size = caps.bit_size.min(32) as usize;
        for i in 0..caps.report_count as usize {
            let start = caps.bit_offset() + i * caps.bit_size as usize;
            if read_bits(report, start, bit_size) == 0 {
                continue;
            }
            let usage_id = if caps.is_range() {
                caps.usage_min.wrapping_add(i as u16)
            } else {
                caps.usage_min
            };
            usages.push(Usage::new(caps.usage_page, usage_id));
        }
    }
    Ok(usages)
}

/// Resolves the elements of one array field. The chain is in storage
/// order, i.e. the last value caps holds the first usages.
fn array_usages(
    chain: &[&HidValueCaps],
    usage_page: Option<UsagePage>,
    report: &[u8],
    usages: &mut Vec<Usage>,
) {
    let Some(first) = chain.first() else {
        return;
    };
    let bit_size = first.bit_size.min(32) as usize;
    let logical_min = first.null_value as u32;

    for i in 0..first.report_count as usize {
        let value = read_bits(report, first.bit_offset() + i * first.bit_size as usize, bit_size);
        let Some(mut index) = value.checked_sub(logical_min) else {
            continue;
        };
        for caps in chain.iter().rev() {
            let width = caps.usage_max.wrapping_sub(caps.usage_min) as u32 + 1;
            if index >= width {
                index -= width;
                continue;
            }
            if usage_page.map_or(true, |up| up.0 == caps.usage_page) {
                usages.push(Usage::new(caps.usage_page, caps.usage_min.wrapping_add(index as u16)));
            }
            break;
        }
    }
}
