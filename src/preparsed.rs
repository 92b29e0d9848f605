// SPDX-License-Identifier: MIT

//! The preparsed data built from a report descriptor.
//!
//! [PreparsedData] is the result of [parse_descriptor](crate::parse_descriptor).
//! Its binary form ([PreparsedData::to_bytes]) is the layout of the Windows
//! `HIDP_PREPARSED_DATA`: a 44 byte header followed by the value caps of the
//! Input, Output and Feature reports (in that order, 104 bytes each), the
//! zero-filled slots reserved by items without report elements and the link
//! collection nodes (16 bytes each). All values are little endian and
//! all cross-references are array indices so the blob can be copied around
//! as plain bytes and reconstituted with [PreparsedData::try_from].

use crate::parser::ParserState;
use crate::types::*;
use crate::ParserError;

use bitflags::bitflags;
use thiserror::Error;

/// The magic tag at the start of the binary preparsed data.
pub const PREPARSED_MAGIC: [u8; 8] = *b"HidP KDR";
/// Size of the preparsed data header in bytes.
pub const HEADER_SIZE: usize = 44;
/// Size of one [HidValueCaps] in bytes.
pub const VALUE_CAPS_SIZE: usize = 104;
/// Size of one [HidCollectionNode] in bytes.
pub const COLLECTION_NODE_SIZE: usize = 16;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ValueCapsFlags: u32 {
        /// This is one usage of a multi-usage array, and the next value
        /// caps continues the same array.
        const ARRAY_HAS_MORE = 0x01;
        const IS_CONSTANT = 0x02;
        const IS_BUTTON = 0x04;
        const IS_ABSOLUTE = 0x08;
        const IS_RANGE = 0x10;
        const IS_STRING_RANGE = 0x40;
        const IS_DESIGNATOR_RANGE = 0x80;
    }
}

impl Default for ValueCapsFlags {
    fn default() -> Self {
        ValueCapsFlags::empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreparsedError {
    #[error("Invalid preparsed data magic {magic:02x?}")]
    InvalidMagic { magic: [u8; 8] },
    #[error("Preparsed data too short: need {needed} bytes, have {available}")]
    TooShort { needed: usize, available: usize },
    #[error("Invalid preparsed data layout: {message}")]
    InvalidLayout { message: String },
}

type Result<T> = std::result::Result<T, PreparsedError>;

/// Sequential little endian reader over the preparsed data bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.position + N;
        ensure!(
            end <= self.bytes.len(),
            PreparsedError::TooShort {
                needed: end,
                available: self.bytes.len()
            }
        );
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.position..end]);
        self.position = end;
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }
}

/// One field of an Input, Output or Feature report.
///
/// A variable field with several usages is split into one [HidValueCaps]
/// per usage, an array field with several usages is represented by a chain
/// of [HidValueCaps] linked with [ValueCapsFlags::ARRAY_HAS_MORE].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HidValueCaps {
    pub usage_page: u16,
    pub report_id: u8,
    /// Bit offset within [HidValueCaps::start_byte]
    pub start_bit: u8,
    /// Bits per element (Report Size)
    pub bit_size: u16,
    /// Number of elements (Report Count)
    pub report_count: u16,
    /// Byte offset of the field, including the leading report id byte
    pub start_byte: u16,
    pub total_bits: u16,
    /// The raw flags of the Input, Output or Feature item
    pub bit_field: u32,
    /// One past the last byte touched by this field
    pub end_byte: u16,
    /// Index of the enclosing collection node
    pub link_collection: u16,
    pub link_usage_page: u16,
    pub link_usage: u16,
    pub flags: ValueCapsFlags,
    pub usage_min: u16,
    pub usage_max: u16,
    pub string_min: u16,
    pub string_max: u16,
    pub designator_min: u16,
    pub designator_max: u16,
    pub data_index_min: u16,
    pub data_index_max: u16,
    pub null_value: u16,
    pub logical_min: i32,
    pub logical_max: i32,
    pub physical_min: i32,
    pub physical_max: i32,
    pub units: u32,
    pub units_exp: i32,
}

impl HidValueCaps {
    pub fn is_range(&self) -> bool {
        self.flags.contains(ValueCapsFlags::IS_RANGE)
    }

    pub fn is_button(&self) -> bool {
        self.flags.contains(ValueCapsFlags::IS_BUTTON)
    }

    pub fn is_constant(&self) -> bool {
        self.flags.contains(ValueCapsFlags::IS_CONSTANT)
    }

    pub fn is_absolute(&self) -> bool {
        self.flags.contains(ValueCapsFlags::IS_ABSOLUTE)
    }

    pub fn is_array(&self) -> bool {
        self.bit_field & crate::hid::DataItem::VARIABLE == 0
    }

    pub fn array_has_more(&self) -> bool {
        self.flags.contains(ValueCapsFlags::ARRAY_HAS_MORE)
    }

    /// Offset of the first bit of this field in the report.
    pub fn bit_offset(&self) -> usize {
        self.start_byte as usize * 8 + self.start_bit as usize
    }

    /// Offset one past the last bit of this field in the report.
    pub fn bit_end(&self) -> usize {
        self.bit_offset() + self.bit_size as usize * self.report_count as usize
    }

    pub fn contains_usage(&self, usage_page: UsagePage, usage: UsageId) -> bool {
        self.usage_page == usage_page.0 && (self.usage_min..=self.usage_max).contains(&usage.0)
    }

    fn write_to(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.usage_page.to_le_bytes());
        bytes.push(self.report_id);
        bytes.push(self.start_bit);
        bytes.extend_from_slice(&self.bit_size.to_le_bytes());
        bytes.extend_from_slice(&self.report_count.to_le_bytes());
        bytes.extend_from_slice(&self.start_byte.to_le_bytes());
        bytes.extend_from_slice(&self.total_bits.to_le_bytes());
        bytes.extend_from_slice(&self.bit_field.to_le_bytes());
        bytes.extend_from_slice(&self.end_byte.to_le_bytes());
        bytes.extend_from_slice(&self.link_collection.to_le_bytes());
        bytes.extend_from_slice(&self.link_usage_page.to_le_bytes());
        bytes.extend_from_slice(&self.link_usage.to_le_bytes());
        bytes.extend_from_slice(&self.flags.bits().to_le_bytes());
        // padding
        bytes.extend_from_slice(&[0u8; 32]);
        for v in [
            self.usage_min,
            self.usage_max,
            self.string_min,
            self.string_max,
            self.designator_min,
            self.designator_max,
            self.data_index_min,
            self.data_index_max,
            self.null_value,
            0,
        ] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for v in [
            self.logical_min,
            self.logical_max,
            self.physical_min,
            self.physical_max,
        ] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&self.units.to_le_bytes());
        bytes.extend_from_slice(&self.units_exp.to_le_bytes());
    }

    fn read_from(reader: &mut Reader) -> Result<HidValueCaps> {
        let usage_page = reader.read_u16()?;
        let report_id = reader.read_u8()?;
        let start_bit = reader.read_u8()?;
        let bit_size = reader.read_u16()?;
        let report_count = reader.read_u16()?;
        let start_byte = reader.read_u16()?;
        let total_bits = reader.read_u16()?;
        let bit_field = reader.read_u32()?;
        let end_byte = reader.read_u16()?;
        let link_collection = reader.read_u16()?;
        let link_usage_page = reader.read_u16()?;
        let link_usage = reader.read_u16()?;
        let flags = ValueCapsFlags::from_bits_retain(reader.read_u32()?);
        reader.take::<32>()?;
        let caps = HidValueCaps {
            usage_page,
            report_id,
            start_bit,
            bit_size,
            report_count,
            start_byte,
            total_bits,
            bit_field,
            end_byte,
            link_collection,
            link_usage_page,
            link_usage,
            flags,
            usage_min: reader.read_u16()?,
            usage_max: reader.read_u16()?,
            string_min: reader.read_u16()?,
            string_max: reader.read_u16()?,
            designator_min: reader.read_u16()?,
            designator_max: reader.read_u16()?,
            data_index_min: reader.read_u16()?,
            data_index_max: reader.read_u16()?,
            null_value: reader.read_u16()?,
            ..Default::default()
        };
        let _unknown = reader.read_u16()?;
        Ok(HidValueCaps {
            logical_min: reader.read_i32()?,
            logical_max: reader.read_i32()?,
            physical_min: reader.read_i32()?,
            physical_max: reader.read_i32()?,
            units: reader.read_u32()?,
            units_exp: reader.read_i32()?,
            ..caps
        })
    }
}

impl std::fmt::Display for HidValueCaps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "id {}, usage {:04x}:{:04x}-{:04x}, bits {}+{}x{}, data {}-{}, flags {:#04x}, bit_field {:#x}, link {} ({:04x}:{:04x}), logical {}..{}, physical {}..{}, units {:#x}^{}",
            self.report_id,
            self.usage_page,
            self.usage_min,
            self.usage_max,
            self.bit_offset(),
            self.report_count,
            self.bit_size,
            self.data_index_min,
            self.data_index_max,
            self.flags.bits(),
            self.bit_field,
            self.link_collection,
            self.link_usage_page,
            self.link_usage,
            self.logical_min,
            self.logical_max,
            self.physical_min,
            self.physical_max,
            self.units,
            self.units_exp,
        )
    }
}

/// One collection of the report descriptor. Nodes form a tree through
/// their indices, node 0 is the root (the first top-level collection).
///
/// Children are linked through `first_child` and `next_sibling` in reverse
/// order of their appearance in the report descriptor. An index of 0 in
/// `first_child` or `next_sibling` terminates the list since the root is
/// never anyone's child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HidCollectionNode {
    pub usage: u16,
    pub usage_page: u16,
    pub parent: u16,
    pub number_of_children: u16,
    pub next_sibling: u16,
    pub first_child: u16,
    pub collection_type: u32,
}

impl HidCollectionNode {
    pub fn collection_type(&self) -> CollectionType {
        CollectionType::from((self.collection_type & 0xff) as u8)
    }

    fn write_to(&self, bytes: &mut Vec<u8>) {
        for v in [
            self.usage,
            self.usage_page,
            self.parent,
            self.number_of_children,
            self.next_sibling,
            self.first_child,
        ] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&self.collection_type.to_le_bytes());
    }

    fn read_from(reader: &mut Reader) -> Result<HidCollectionNode> {
        Ok(HidCollectionNode {
            usage: reader.read_u16()?,
            usage_page: reader.read_u16()?,
            parent: reader.read_u16()?,
            number_of_children: reader.read_u16()?,
            next_sibling: reader.read_u16()?,
            first_child: reader.read_u16()?,
            collection_type: reader.read_u32()?,
        })
    }
}

/// Where the value caps of one report type live in the preparsed data.
///
/// `end - start` is the number of value caps. `count` also includes one
/// empty slot per usage of the items with a Report Count of 0, these slots
/// are zero-filled and follow the value caps of all report types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapsInfo {
    pub start: u16,
    pub count: u16,
    pub end: u16,
    /// Report length in bytes, including the report id byte
    pub report_byte_length: u16,
}

/// The per-report-type part of [HidpCaps].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportCaps {
    pub report_byte_length: u16,
    pub button_caps: u16,
    pub value_caps: u16,
    pub data_indices: u16,
}

/// A summary of the top-level collection, the counterpart of `HIDP_CAPS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HidpCaps {
    pub usage: Usage,
    pub input: ReportCaps,
    pub output: ReportCaps,
    pub feature: ReportCaps,
    pub number_link_collection_nodes: u16,
}

impl HidpCaps {
    pub fn report(&self, report_type: ReportType) -> &ReportCaps {
        match report_type {
            ReportType::Input => &self.input,
            ReportType::Output => &self.output,
            ReportType::Feature => &self.feature,
        }
    }
}

/// The preparsed data of one top-level collection.
///
/// The top-level usage and usage page are those of the first collection
/// in the report descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparsedData {
    usage: u16,
    usage_page: u16,
    caps_info: [CapsInfo; 3],
    value_caps: Vec<HidValueCaps>,
    nodes: Vec<HidCollectionNode>,
}

impl PreparsedData {
    pub fn usage(&self) -> Usage {
        Usage::new(self.usage_page, self.usage)
    }

    pub fn caps_info(&self, report_type: ReportType) -> &CapsInfo {
        &self.caps_info[report_type.index()]
    }

    pub fn report_byte_length(&self, report_type: ReportType) -> u16 {
        self.caps_info(report_type).report_byte_length
    }

    /// All value caps of the given report type.
    pub fn value_caps_slice(&self, report_type: ReportType) -> &[HidValueCaps] {
        let info = self.caps_info(report_type);
        &self.value_caps[info.start as usize..info.end as usize]
    }

    /// The value caps of all three report types, Input first, then Output,
    /// then Feature, followed by the empty slots.
    pub fn all_value_caps(&self) -> &[HidValueCaps] {
        &self.value_caps
    }

    pub fn link_collection_nodes(&self) -> &[HidCollectionNode] {
        &self.nodes
    }

    /// Size of the value caps region in bytes.
    pub fn caps_size(&self) -> usize {
        self.value_caps.len() * VALUE_CAPS_SIZE
    }

    /// Size of the binary preparsed data in bytes.
    pub fn len(&self) -> usize {
        HEADER_SIZE + self.caps_size() + self.nodes.len() * COLLECTION_NODE_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.value_caps.is_empty() && self.nodes.is_empty()
    }

    /// The children of the given collection node in list order, i.e. in
    /// reverse order of their declaration.
    pub fn children(&self, node: u16) -> impl Iterator<Item = u16> + '_ {
        let first = self.nodes.get(node as usize).map_or(0, |n| n.first_child);
        std::iter::successors(Some(first).filter(|c| *c != 0), move |c| {
            self.nodes
                .get(*c as usize)
                .map(|n| n.next_sibling)
                .filter(|s| *s != 0)
        })
        .take(self.nodes.len())
    }

    /// The value caps of the given report type in storage order.
    pub fn fields(&self, report_type: ReportType) -> impl Iterator<Item = &HidValueCaps> {
        self.value_caps_slice(report_type).iter()
    }

    /// The button caps of the given report type, see `HidP_GetButtonCaps`.
    pub fn button_caps(&self, report_type: ReportType) -> impl Iterator<Item = &HidValueCaps> {
        self.fields(report_type).filter(|caps| caps.is_button())
    }

    /// The value caps of the given report type, see `HidP_GetValueCaps`.
    pub fn value_caps(&self, report_type: ReportType) -> impl Iterator<Item = &HidValueCaps> {
        self.fields(report_type).filter(|caps| !caps.is_button())
    }

    /// Button caps filtered by usage page, link collection and usage, see
    /// `HidP_GetSpecificButtonCaps`. `None` matches anything.
    pub fn specific_button_caps(
        &self,
        report_type: ReportType,
        usage_page: Option<UsagePage>,
        link_collection: Option<u16>,
        usage: Option<UsageId>,
    ) -> impl Iterator<Item = &HidValueCaps> {
        self.button_caps(report_type)
            .filter(move |caps| matches_filter(caps, usage_page, link_collection, usage))
    }

    /// Value caps filtered by usage page, link collection and usage, see
    /// `HidP_GetSpecificValueCaps`. `None` matches anything.
    pub fn specific_value_caps(
        &self,
        report_type: ReportType,
        usage_page: Option<UsagePage>,
        link_collection: Option<u16>,
        usage: Option<UsageId>,
    ) -> impl Iterator<Item = &HidValueCaps> {
        self.value_caps(report_type)
            .filter(move |caps| matches_filter(caps, usage_page, link_collection, usage))
    }

    /// A summary of this preparsed data, see `HidP_GetCaps`.
    pub fn caps(&self) -> HidpCaps {
        let report = |report_type: ReportType| {
            let info = self.caps_info(report_type);
            let button_caps = self.button_caps(report_type).count() as u16;
            let value_caps = self.value_caps(report_type).count() as u16;
            let data_indices = self
                .fields(report_type)
                .map(|caps| caps.data_index_max.wrapping_add(1))
                .max()
                .unwrap_or(0);
            ReportCaps {
                report_byte_length: info.report_byte_length,
                button_caps,
                value_caps,
                data_indices,
            }
        };
        HidpCaps {
            usage: self.usage(),
            input: report(ReportType::Input),
            output: report(ReportType::Output),
            feature: report(ReportType::Feature),
            number_link_collection_nodes: self.nodes.len() as u16,
        }
    }

    /// The binary `HIDP_PREPARSED_DATA` representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&PREPARSED_MAGIC);
        bytes.extend_from_slice(&self.usage.to_le_bytes());
        bytes.extend_from_slice(&self.usage_page.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        for info in &self.caps_info {
            for v in [info.start, info.count, info.end, info.report_byte_length] {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&(self.caps_size() as u16).to_le_bytes());
        bytes.extend_from_slice(&(self.nodes.len() as u16).to_le_bytes());
        self.value_caps
            .iter()
            .for_each(|caps| caps.write_to(&mut bytes));
        self.nodes.iter().for_each(|node| node.write_to(&mut bytes));
        bytes
    }
}

fn matches_filter(
    caps: &HidValueCaps,
    usage_page: Option<UsagePage>,
    link_collection: Option<u16>,
    usage: Option<UsageId>,
) -> bool {
    usage_page.map_or(true, |up| caps.usage_page == up.0)
        && link_collection.map_or(true, |lc| caps.link_collection == lc)
        && usage.map_or(true, |u| (caps.usage_min..=caps.usage_max).contains(&u.0))
}

impl TryFrom<&[u8]> for PreparsedData {
    type Error = PreparsedError;

    /// Reconstitutes preparsed data from its binary representation, see
    /// [PreparsedData::to_bytes].
    fn try_from(bytes: &[u8]) -> Result<PreparsedData> {
        let mut reader = Reader::new(bytes);
        let magic: [u8; 8] = reader.take()?;
        ensure!(magic == PREPARSED_MAGIC, PreparsedError::InvalidMagic { magic });
        let usage = reader.read_u16()?;
        let usage_page = reader.read_u16()?;
        reader.take::<4>()?;

        let mut caps_info = [CapsInfo::default(); 3];
        let mut expected_start = 0;
        let mut empty_slots = 0usize;
        for info in caps_info.iter_mut() {
            *info = CapsInfo {
                start: reader.read_u16()?,
                count: reader.read_u16()?,
                end: reader.read_u16()?,
                report_byte_length: reader.read_u16()?,
            };
            ensure!(
                info.start == expected_start && info.start <= info.end,
                PreparsedError::InvalidLayout {
                    message: format!("caps range {}..{} out of order", info.start, info.end),
                }
            );
            ensure!(
                info.count >= info.end - info.start,
                PreparsedError::InvalidLayout {
                    message: format!(
                        "caps count {} below caps range {}..{}",
                        info.count, info.start, info.end
                    ),
                }
            );
            empty_slots += (info.count - (info.end - info.start)) as usize;
            expected_start = info.end;
        }

        let caps_size = reader.read_u16()? as usize;
        let node_count = reader.read_u16()? as usize;
        let slots = expected_start as usize + empty_slots;
        ensure!(
            caps_size == slots * VALUE_CAPS_SIZE,
            PreparsedError::InvalidLayout {
                message: format!("caps size {caps_size} does not match {slots} caps"),
            }
        );
        let needed = HEADER_SIZE + caps_size + node_count * COLLECTION_NODE_SIZE;
        ensure!(
            bytes.len() >= needed,
            PreparsedError::TooShort {
                needed,
                available: bytes.len()
            }
        );

        let value_caps = (0..slots)
            .map(|_| HidValueCaps::read_from(&mut reader))
            .collect::<Result<Vec<_>>>()?;
        let nodes = (0..node_count)
            .map(|_| HidCollectionNode::read_from(&mut reader))
            .collect::<Result<Vec<_>>>()?;
        ensure!(
            nodes.iter().all(|n| (n.parent as usize) < node_count
                && (n.first_child as usize) < node_count
                && (n.next_sibling as usize) < node_count),
            PreparsedError::InvalidLayout {
                message: "collection node index out of range".into(),
            }
        );

        Ok(PreparsedData {
            usage,
            usage_page,
            caps_info,
            value_caps,
            nodes,
        })
    }
}

/// Serializes the parser's value caps lists and collections into
/// [PreparsedData] and links up the collection tree.
pub(crate) fn build_preparsed_data(state: &ParserState) -> crate::Result<PreparsedData> {
    let caps: usize = state.values.iter().map(|v| v.len()).sum();
    let empty: usize = state.empty_caps.iter().map(|&n| n as usize).sum();
    let total = caps + empty;
    ensure!(
        total * VALUE_CAPS_SIZE <= u16::MAX as usize,
        ParserError::TooManyValueCaps { count: total }
    );

    let mut value_caps: Vec<HidValueCaps> = Vec::new();
    value_caps
        .try_reserve_exact(total)
        .map_err(|_| ParserError::OutOfMemory)?;
    let mut caps_info = [CapsInfo::default(); 3];
    for report_type in ReportType::ALL {
        let idx = report_type.index();
        let start = value_caps.len() as u16;
        value_caps.extend_from_slice(&state.values[idx]);
        caps_info[idx] = CapsInfo {
            start,
            count: state.caps_count[idx] + state.empty_caps[idx],
            end: value_caps.len() as u16,
            report_byte_length: state.byte_length[idx],
        };
    }
    value_caps.resize(total, HidValueCaps::default());

    let mut nodes: Vec<HidCollectionNode> = Vec::new();
    nodes
        .try_reserve_exact(state.collections.len())
        .map_err(|_| ParserError::OutOfMemory)?;
    nodes.extend(state.collections.iter().map(|c| HidCollectionNode {
        first_child: 0,
        next_sibling: 0,
        number_of_children: 0,
        ..*c
    }));
    // Parents always precede their children, prepend each child to its
    // parent's list.
    for i in 1..nodes.len() {
        let parent = nodes[i].parent as usize;
        nodes[i].next_sibling = nodes[parent].first_child;
        nodes[parent].first_child = i as u16;
        nodes[parent].number_of_children += 1;
    }

    let data = PreparsedData {
        usage: state.usage,
        usage_page: state.usage_page,
        caps_info,
        value_caps,
        nodes,
    };
    debug_print_preparsed(&data);
    Ok(data)
}

fn debug_print_preparsed(data: &PreparsedData) {
    tracing::debug!(
        "usage {:04x}:{:04x}, input {:?}, output {:?}, feature {:?}, {} collection nodes",
        data.usage_page,
        data.usage,
        data.caps_info[0],
        data.caps_info[1],
        data.caps_info[2],
        data.nodes.len()
    );
    for report_type in ReportType::ALL {
        for (i, caps) in data.value_caps_slice(report_type).iter().enumerate() {
            tracing::trace!("{report_type} {i}: {caps}");
        }
    }
    for (i, node) in data.nodes.iter().enumerate() {
        tracing::trace!("node {i}: {node:?}");
    }
}
