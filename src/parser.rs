// SPDX-License-Identifier: MIT

//! The report descriptor state machine.
//!
//! Items are processed in order against a template of the current global
//! state (Section 6.2.2.7), the local state of the next main item
//! (Section 6.2.2.8) and the linkage of the enclosing collection. Each
//! Input, Output and Feature item turns the template into one or more
//! [HidValueCaps] appended to the list of its report type, each Collection
//! item appends a [HidCollectionNode].
//!
//! Fields are laid out per report type and report id: the first field of a
//! report starts at bit 8, after the report id byte, which is counted even
//! for devices that do not use report ids. The report byte length of a
//! report type is the maximum over all its report ids.
//!
//! A variable field with several usages is split into one value caps per
//! usage, each one element wide except the one of the last usage which takes
//! all the remaining elements at the end of the field. An array field with
//! several usages gets one value caps per usage, all spanning the whole
//! field and chained with [ValueCapsFlags::ARRAY_HAS_MORE]. Both are stored
//! in reverse usage order. Data indices follow the storage order for
//! variable fields and the usage order for arrays.
//!
//! Items with a Report Count of 0 produce no value caps. They only reserve
//! one empty slot per usage at the end of the preparsed data.

use crate::hid::*;
use crate::preparsed::{HidCollectionNode, HidValueCaps, ValueCapsFlags};
use crate::types::*;
use crate::ParserError;

/// The maximum number of usages a single main item can have.
pub const MAX_USAGES: usize = 255;

/// The 16-bit index space of the preparsed data.
const MAX_INDEX: usize = 0xffff;

type Result<T> = crate::Result<T>;

/// Makes sure `array` has room for an element at `index`.
///
/// The capacity grows by half starting at 32 elements. An index outside of
/// the 16-bit index space fails with `overflow`, an allocation failure with
/// [ParserError::OutOfMemory].
pub(crate) fn array_reserve<T>(
    array: &mut Vec<T>,
    index: usize,
    overflow: ParserError,
) -> Result<()> {
    ensure!(index < MAX_INDEX, overflow);
    if index < array.capacity() {
        return Ok(());
    }
    let mut capacity = array.capacity().max(32);
    while capacity <= index {
        capacity = capacity * 3 / 2;
    }
    let capacity = capacity.min(MAX_INDEX);
    array
        .try_reserve_exact(capacity - array.len())
        .map_err(|_| ParserError::OutOfMemory)
}

/// The global items, saved and restored by Push and Pop.
#[derive(Clone, Copy, Debug, Default)]
struct Globals {
    usage_page: UsagePage,
    logical_minimum: i32,
    logical_maximum: i32,
    physical_minimum: i32,
    physical_maximum: i32,
    unit_exponent: i32,
    unit: u32,
    report_size: u32,
    report_id: ReportId,
    report_count: u32,
}

/// The collection a field or collection is linked to, saved and restored
/// by Collection and End Collection.
#[derive(Clone, Copy, Debug, Default)]
struct Linkage {
    link_collection: u16,
    link_usage_page: u16,
    link_usage: u16,
}

/// One entry of the local usage list. A single usage has `min == max`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct LocalUsage {
    usage_page: u16,
    min: u16,
    max: u16,
}

#[derive(Clone, Debug, Default)]
struct Locals {
    usages: Vec<LocalUsage>,
    /// The usage list is a single Usage Minimum/Maximum range
    is_range: bool,
    string_min: u16,
    string_max: u16,
    is_string_range: bool,
    designator_min: u16,
    designator_max: u16,
    is_designator_range: bool,
}

impl Locals {
    fn reset(&mut self) {
        self.usages.clear();
        self.is_range = false;
        self.string_min = 0;
        self.string_max = 0;
        self.is_string_range = false;
        self.designator_min = 0;
        self.designator_max = 0;
        self.is_designator_range = false;
    }

    fn flags(&self) -> ValueCapsFlags {
        let mut flags = ValueCapsFlags::empty();
        flags.set(ValueCapsFlags::IS_RANGE, self.is_range);
        flags.set(ValueCapsFlags::IS_STRING_RANGE, self.is_string_range);
        flags.set(ValueCapsFlags::IS_DESIGNATOR_RANGE, self.is_designator_range);
        flags
    }

    /// Adds a single usage, cancelling a previous Usage Minimum/Maximum.
    fn add_usage(&mut self, usage_page: u16, usage: u16) -> bool {
        if self.is_range {
            self.usages.clear();
            self.is_range = false;
        }
        if self.usages.len() >= MAX_USAGES {
            return false;
        }
        self.usages.push(LocalUsage {
            usage_page,
            min: usage,
            max: usage,
        });
        true
    }

    /// Sets one end of the usage range. The other end is kept if a range
    /// was already being built, otherwise it is 0.
    fn set_usage_range(&mut self, usage_page: u16, min: Option<u16>, max: Option<u16>) {
        let current = match (self.is_range, self.usages.first()) {
            (true, Some(u)) => *u,
            _ => LocalUsage::default(),
        };
        self.usages.clear();
        self.usages.push(LocalUsage {
            usage_page,
            min: min.unwrap_or(current.min),
            max: max.unwrap_or(current.max),
        });
        self.is_range = true;
    }
}

/// The state of one report descriptor parse.
///
/// The value caps lists and the collections are handed to the preparsed
/// data builder once all items have been processed.
#[derive(Debug)]
pub(crate) struct ParserState {
    globals: Globals,
    linkage: Linkage,
    locals: Locals,
    global_stack: Vec<Globals>,
    collection_stack: Vec<Linkage>,

    /// Top-level usage page, from the first collection
    pub(crate) usage_page: u16,
    /// Top-level usage, from the first collection
    pub(crate) usage: u16,
    pub(crate) collections: Vec<HidCollectionNode>,
    /// Value caps per report type
    pub(crate) values: [Vec<HidValueCaps>; 3],
    pub(crate) caps_count: [u16; 3],
    /// Usages of items with a Report Count of 0, per report type
    pub(crate) empty_caps: [u16; 3],
    /// Next data index per report type
    data_count: [u16; 3],
    pub(crate) byte_length: [u16; 3],
    /// Next free bit per report type and report id, 0 if unused
    bit_offset: [[u32; 256]; 3],
}

impl Default for ParserState {
    fn default() -> Self {
        ParserState {
            globals: Globals::default(),
            linkage: Linkage::default(),
            locals: Locals::default(),
            global_stack: Vec::new(),
            collection_stack: Vec::new(),
            usage_page: 0,
            usage: 0,
            collections: Vec::new(),
            values: Default::default(),
            caps_count: [0; 3],
            empty_caps: [0; 3],
            data_count: [0; 3],
            byte_length: [0; 3],
            bit_offset: [[0; 256]; 3],
        }
    }
}

impl Drop for ParserState {
    fn drop(&mut self) {
        if !self.global_stack.is_empty() {
            tracing::warn!(
                "unbalanced global stack, {} Push without Pop",
                self.global_stack.len()
            );
        }
        if !self.collection_stack.is_empty() {
            tracing::warn!(
                "unbalanced collection stack, {} Collection without End Collection",
                self.collection_stack.len()
            );
        }
    }
}

impl ParserState {
    fn handle_item(&mut self, rdesc_item: &ReportDescriptorItem) -> Result<()> {
        let offset = rdesc_item.offset();
        match rdesc_item.item_type() {
            ItemType::Main(item) => self.handle_main_item(offset, item),
            ItemType::Global(item) => self.handle_global_item(offset, item),
            ItemType::Local(item) => self.handle_local_item(offset, item),
            ItemType::Long => {
                tracing::warn!(
                    "Ignoring long item with tag {:#04x} at offset {offset}",
                    rdesc_item.item().tag()
                );
                Ok(())
            }
            ItemType::Reserved => Err(ParserError::UnsupportedItem {
                offset,
                header: rdesc_item.item().header(),
            }),
        }
    }

    fn handle_main_item(&mut self, offset: usize, item: MainItem) -> Result<()> {
        match item {
            MainItem::Input(data) => self.add_data_field(offset, ReportType::Input, data)?,
            MainItem::Output(data) => self.add_data_field(offset, ReportType::Output, data)?,
            MainItem::Feature(data) => self.add_data_field(offset, ReportType::Feature, data)?,
            MainItem::Collection(collection_type) => {
                self.begin_collection(collection_type)?;
            }
            MainItem::EndCollection => {
                self.linkage = self
                    .collection_stack
                    .pop()
                    .ok_or(ParserError::CollectionStackUnderflow { offset })?;
            }
            MainItem::Unknown { tag } => {
                tracing::warn!("Ignoring unknown main item {tag:#x} at offset {offset}");
                return Ok(());
            }
        }
        self.locals.reset();
        Ok(())
    }

    fn handle_global_item(&mut self, offset: usize, item: GlobalItem) -> Result<()> {
        let globals = &mut self.globals;
        match item {
            GlobalItem::UsagePage(usage_page) => globals.usage_page = usage_page,
            GlobalItem::LogicalMinimum(v) => globals.logical_minimum = v.into(),
            GlobalItem::LogicalMaximum(v) => globals.logical_maximum = v.into(),
            GlobalItem::PhysicalMinimum(v) => globals.physical_minimum = v.into(),
            GlobalItem::PhysicalMaximum(v) => globals.physical_maximum = v.into(),
            GlobalItem::UnitExponent(v) => globals.unit_exponent = v.into(),
            GlobalItem::Unit(v) => globals.unit = v.into(),
            GlobalItem::ReportSize(v) => globals.report_size = v.into(),
            GlobalItem::ReportId(v) => globals.report_id = v,
            GlobalItem::ReportCount(v) => globals.report_count = v.into(),
            GlobalItem::Push => {
                let depth = self.global_stack.len();
                array_reserve(&mut self.global_stack, depth, ParserError::GlobalStackOverflow)?;
                self.global_stack.push(self.globals);
            }
            GlobalItem::Pop => {
                self.globals = self
                    .global_stack
                    .pop()
                    .ok_or(ParserError::GlobalStackUnderflow { offset })?;
            }
            GlobalItem::Unknown { tag } => {
                tracing::warn!("Ignoring unknown global item {tag:#x} at offset {offset}");
            }
        }
        Ok(())
    }

    fn handle_local_item(&mut self, offset: usize, item: LocalItem) -> Result<()> {
        let global_page = self.globals.usage_page.0;
        let locals = &mut self.locals;
        match item {
            LocalItem::Usage {
                usage_page,
                usage_id,
            } => {
                let usage_page = usage_page.map_or(global_page, |up| up.0);
                ensure!(
                    locals.add_usage(usage_page, usage_id.0),
                    ParserError::UsageOverflow { offset }
                );
            }
            LocalItem::UsageMinimum(v) => {
                let (usage_page, usage_id) = LocalItem::split_usage(v.into());
                let usage_page = usage_page.map_or(global_page, |up| up.0);
                locals.set_usage_range(usage_page, Some(usage_id.0), None);
            }
            LocalItem::UsageMaximum(v) => {
                let (usage_page, usage_id) = LocalItem::split_usage(v.into());
                let usage_page = usage_page.map_or(global_page, |up| up.0);
                locals.set_usage_range(usage_page, None, Some(usage_id.0));
            }
            LocalItem::DesignatorIndex(v) => {
                let v = u32::from(v) as u16;
                locals.designator_min = v;
                locals.designator_max = v;
                locals.is_designator_range = false;
            }
            LocalItem::DesignatorMinimum(v) => {
                locals.designator_min = u32::from(v) as u16;
                locals.is_designator_range = true;
            }
            LocalItem::DesignatorMaximum(v) => {
                locals.designator_max = u32::from(v) as u16;
                locals.is_designator_range = true;
            }
            LocalItem::StringIndex(v) => {
                let v = u32::from(v) as u16;
                locals.string_min = v;
                locals.string_max = v;
                locals.is_string_range = false;
            }
            LocalItem::StringMinimum(v) => {
                locals.string_min = u32::from(v) as u16;
                locals.is_string_range = true;
            }
            LocalItem::StringMaximum(v) => {
                locals.string_max = u32::from(v) as u16;
                locals.is_string_range = true;
            }
            LocalItem::Delimiter(v) => {
                return Err(ParserError::DelimiterNotSupported {
                    offset,
                    value: v.into(),
                });
            }
            LocalItem::Unknown { tag } => {
                tracing::warn!("Ignoring unknown local item {tag:#x} at offset {offset}");
            }
        }
        Ok(())
    }

    fn begin_collection(&mut self, collection_type: CollectionType) -> Result<()> {
        let depth = self.collection_stack.len();
        array_reserve(&mut self.collection_stack, depth, ParserError::CollectionStackOverflow)?;
        let index = self.collections.len();
        array_reserve(&mut self.collections, index, ParserError::CollectionsOverflow)?;
        self.collection_stack.push(self.linkage);

        let (usage_page, usage) = match self.locals.usages.first() {
            Some(u) => (u.usage_page, u.min),
            None => (self.globals.usage_page.0, 0),
        };
        let index = index as u16;
        self.collections.push(HidCollectionNode {
            usage,
            usage_page,
            parent: self.linkage.link_collection,
            collection_type: u8::from(collection_type) as u32,
            ..Default::default()
        });
        self.linkage = Linkage {
            link_collection: index,
            link_usage_page: usage_page,
            link_usage: usage,
        };
        if index == 0 {
            self.usage_page = usage_page;
            self.usage = usage;
        }
        Ok(())
    }

    /// Lays out an Input, Output or Feature item and appends its value caps.
    fn add_data_field(&mut self, offset: usize, report_type: ReportType, data: DataItem) -> Result<()> {
        let idx = report_type.index();
        let globals = self.globals;
        let report_id = globals.report_id;
        let too_long = ParserError::ReportTooLong {
            offset,
            report_type,
            report_id,
        };

        ensure!(
            globals.report_size <= u16::MAX as u32 && globals.report_count <= u16::MAX as u32,
            too_long
        );
        let bit_size = globals.report_size as u16;
        let report_count = globals.report_count as u16;

        let next_bit = &mut self.bit_offset[idx][report_id.0 as usize];
        if *next_bit == 0 {
            *next_bit = 8;
        }
        let start = *next_bit;
        let end = start as u64 + bit_size as u64 * report_count as u64;
        ensure!(end.div_ceil(8) <= u16::MAX as u64, too_long);
        *next_bit = end as u32;
        self.byte_length[idx] = self.byte_length[idx].max(end.div_ceil(8) as u16);

        let template = HidValueCaps {
            usage_page: globals.usage_page.0,
            report_id: report_id.0,
            bit_size,
            bit_field: data.bits(),
            link_collection: self.linkage.link_collection,
            link_usage_page: self.linkage.link_usage_page,
            link_usage: self.linkage.link_usage,
            flags: self.locals.flags(),
            string_min: self.locals.string_min,
            string_max: self.locals.string_max,
            designator_min: self.locals.designator_min,
            designator_max: self.locals.designator_max,
            logical_min: globals.logical_minimum,
            logical_max: globals.logical_maximum,
            physical_min: globals.physical_minimum,
            physical_max: globals.physical_maximum,
            units: globals.unit,
            units_exp: globals.unit_exponent,
            ..Default::default()
        };

        let usages: Vec<LocalUsage> = if self.locals.usages.is_empty() {
            vec![LocalUsage {
                usage_page: globals.usage_page.0,
                ..Default::default()
            }]
        } else {
            self.locals.usages.clone()
        };

        if report_count == 0 {
            tracing::debug!("{report_type} item at offset {offset} has no elements");
            self.empty_caps[idx] = self.empty_caps[idx]
                .checked_add(usages.len() as u16)
                .ok_or(ParserError::ValuesOverflow { report_type })?;
            return Ok(());
        }

        if data.is_array() {
            // Data indices follow the usage order, storage is reversed
            let mut next_index = self.data_count[idx];
            let indices: Vec<u16> = usages
                .iter()
                .map(|usage| {
                    let first = next_index;
                    next_index = data_index_max(first, usage).wrapping_add(1);
                    first
                })
                .collect();
            self.data_count[idx] = next_index;

            for (i, usage) in usages.iter().enumerate().rev() {
                let mut caps = HidValueCaps {
                    usage_page: usage.usage_page,
                    usage_min: usage.min,
                    usage_max: usage.max,
                    data_index_min: indices[i],
                    data_index_max: data_index_max(indices[i], usage),
                    ..place(template, start, report_count)
                };
                caps.flags.set(ValueCapsFlags::ARRAY_HAS_MORE, i != 0);
                self.add_value_caps(report_type, data, caps)?;
            }
        } else {
            let n = usages.len();
            if (report_count as usize) < n {
                tracing::debug!(
                    "{report_type} field at offset {offset} has {n} usages but only {report_count} elements"
                );
            }
            // The last usage takes the remaining elements at the end of the
            // field and is stored first
            let emitted = n.min(report_count as usize);
            let mut bit = start + bit_size as u32 * report_count as u32;
            for (i, usage) in usages.iter().take(emitted).enumerate().rev() {
                let count = if i == emitted - 1 {
                    report_count - i as u16
                } else {
                    1
                };
                bit -= bit_size as u32 * count as u32;
                let first = self.data_count[idx];
                let caps = HidValueCaps {
                    usage_page: usage.usage_page,
                    usage_min: usage.min,
                    usage_max: usage.max,
                    data_index_min: first,
                    data_index_max: data_index_max(first, usage),
                    ..place(template, bit, count)
                };
                self.data_count[idx] = caps.data_index_max.wrapping_add(1);
                self.add_value_caps(report_type, data, caps)?;
            }
        }
        Ok(())
    }

    /// Finalizes the flags, null value and button ranges of one field and
    /// appends it.
    fn add_value_caps(
        &mut self,
        report_type: ReportType,
        data: DataItem,
        mut caps: HidValueCaps,
    ) -> Result<()> {
        let idx = report_type.index();
        let is_array = data.is_array();
        let is_button = caps.bit_size == 1 || is_array;

        caps.flags.set(ValueCapsFlags::IS_ABSOLUTE, data.is_absolute());
        caps.flags.set(ValueCapsFlags::IS_CONSTANT, data.is_constant());
        caps.flags.set(ValueCapsFlags::IS_BUTTON, is_button);

        caps.null_value = if is_array {
            caps.logical_min as u16
        } else if data.has_null_state() {
            1
        } else {
            0
        };

        if is_button {
            caps.physical_min = 0;
            caps.physical_max = 0;
            caps.logical_min = if is_array { caps.logical_max } else { 0 };
            caps.logical_max = 0;
        }

        self.push_value_caps(report_type, caps)?;
        self.caps_count[idx] += 1;
        Ok(())
    }

    fn push_value_caps(&mut self, report_type: ReportType, caps: HidValueCaps) -> Result<()> {
        let values = &mut self.values[report_type.index()];
        let index = values.len();
        array_reserve(values, index, ParserError::ValuesOverflow { report_type })?;
        values.push(caps);
        Ok(())
    }
}

/// The template positioned at the absolute bit `start` with `count` elements.
fn place(template: HidValueCaps, start: u32, count: u16) -> HidValueCaps {
    let total_bits = template.bit_size as u32 * count as u32;
    HidValueCaps {
        start_byte: (start / 8) as u16,
        start_bit: (start % 8) as u8,
        report_count: count,
        total_bits: total_bits as u16,
        end_byte: (start + total_bits).div_ceil(8) as u16,
        ..template
    }
}

/// The last data index of a field starting at `first`, one per usage of the
/// range. Wraps like the 16-bit index space it lives in.
fn data_index_max(first: u16, usage: &LocalUsage) -> u16 {
    first.wrapping_add(usage.max.wrapping_sub(usage.min))
}

/// Runs the state machine over all items of the report descriptor.
pub(crate) fn parse_report_descriptor(bytes: &[u8]) -> Result<ParserState> {
    let items = ReportDescriptorItems::try_from(bytes)?;
    let mut state = ParserState::default();

    for rdesc_item in items.iter() {
        if let Err(e) = state.handle_item(rdesc_item) {
            tracing::error!("{e}");
            return Err(e);
        }
    }

    Ok(state)
}
