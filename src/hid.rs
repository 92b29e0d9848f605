// SPDX-License-Identifier: MIT

//! Decoding of the raw items of a report descriptor.
//!
//! [ReportDescriptorItems] cuts the descriptor bytes into short and long
//! items and records the offset of each. Nothing here tracks state across
//! items, that is the job of the [parser](crate::parser).
//!
//! Section numbers refer to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! ```
//! # use hidparse::hid::*;
//! # fn dump(bytes: &[u8]) -> Result<(), hidparse::ParserError> {
//! for item in ReportDescriptorItems::try_from(bytes)?.iter() {
//!     if let ItemType::Main(MainItem::Input(data)) = item.item_type() {
//!         println!("{:04x}: Input {:#x}", item.offset(), data.bits());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::bits::bit;
use crate::types::*;
use crate::ParserError;

use thiserror::Error;

/// The 0, 1, 2 or 4 little-endian data bytes of a short item.
///
/// The same bytes are interpreted as unsigned or signed value depending on
/// the item, the signed interpretation sign-extends from the declared
/// size (1, 2 or 4 bytes). A zero-sized item has the value 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidValue {
    value: u32,
    nbytes: usize,
}

impl HidValue {
    /// Number of data bytes, the sign bit is the top bit of the last one
    pub fn len(&self) -> usize {
        self.nbytes
    }

    pub fn is_empty(&self) -> bool {
        self.nbytes == 0
    }
}

impl TryFrom<&[u8]> for HidValue {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<HidValue> {
        let value = match bytes {
            [] => 0,
            [b0] => *b0 as u32,
            [b0, b1] => u16::from_le_bytes([*b0, *b1]) as u32,
            [b0, b1, b2, b3] => u32::from_le_bytes([*b0, *b1, *b2, *b3]),
            _ => {
                return Err(HidError::InvalidData {
                    message: format!("Unexpected item value size {}", bytes.len()),
                })
            }
        };
        Ok(HidValue {
            value,
            nbytes: bytes.len(),
        })
    }
}

impl From<&HidValue> for u32 {
    fn from(v: &HidValue) -> u32 {
        v.value
    }
}

impl From<HidValue> for u32 {
    fn from(v: HidValue) -> u32 {
        u32::from(&v)
    }
}

impl From<&HidValue> for u16 {
    fn from(v: &HidValue) -> u16 {
        (v.value & 0xFFFF) as u16
    }
}

impl From<HidValue> for u16 {
    fn from(v: HidValue) -> u16 {
        u16::from(&v)
    }
}

impl From<&HidValue> for u8 {
    fn from(v: &HidValue) -> u8 {
        (v.value & 0xFF) as u8
    }
}

impl From<HidValue> for u8 {
    fn from(v: HidValue) -> u8 {
        u8::from(&v)
    }
}

impl From<&HidValue> for i32 {
    fn from(v: &HidValue) -> i32 {
        match v.len() {
            0 => 0,
            1 => ((v.value & 0xFF) as i8) as i32,
            2 => ((v.value & 0xFFFF) as i16) as i32,
            _ => v.value as i32,
        }
    }
}

impl From<HidValue> for i32 {
    fn from(v: HidValue) -> i32 {
        i32::from(&v)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HidError {
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
    #[error("Need {needed} bytes to read item, only {available} remaining")]
    InsufficientData { needed: usize, available: usize },
}

type Result<T> = std::result::Result<T, HidError>;

/// What an item is, decoded from the type bits of its header.
///
/// [ItemType::Long] is any long item, [ItemType::Reserved] a short item with
/// the reserved type 3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemType {
    Main(MainItem),
    Global(GlobalItem),
    Local(LocalItem),
    Long,
    Reserved,
}

/// Main items, Section 6.2.2.4. Input, Output and Feature add fields to a
/// report, Collection and End Collection group them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MainItem {
    Input(DataItem),
    Output(DataItem),
    Feature(DataItem),
    Collection(CollectionType),
    EndCollection,
    /// A main item with a tag not defined in HID 1.11
    Unknown { tag: u8 },
}

impl MainItem {
    fn new(tag: u8, value: &HidValue) -> MainItem {
        match tag {
            0x8 => MainItem::Input(DataItem(value.into())),
            0x9 => MainItem::Output(DataItem(value.into())),
            0xb => MainItem::Feature(DataItem(value.into())),
            0xa => MainItem::Collection(CollectionType::from(u8::from(value))),
            0xc => MainItem::EndCollection,
            tag => MainItem::Unknown { tag },
        }
    }
}

/// The flag bits of Input, Output and Feature items, Section 6.2.2.5.
///
/// Each bit has an accessor for both of its states.
pub trait MainDataItem {
    /// Bit 0 set: Constant, typically padding
    fn is_constant(&self) -> bool;

    fn is_data(&self) -> bool {
        !self.is_constant()
    }

    /// Bit 1 set: one value per usage instead of a list of usage indices
    fn is_variable(&self) -> bool;

    fn is_array(&self) -> bool {
        !self.is_variable()
    }

    /// Bit 2 set: the value is a delta to the previous report
    fn is_relative(&self) -> bool;

    fn is_absolute(&self) -> bool {
        !self.is_relative()
    }

    /// Bit 3 set: the value rolls over at the logical extremes
    fn wraps(&self) -> bool;

    /// Bit 4
    fn is_nonlinear(&self) -> bool;

    /// Bit 5
    fn has_no_preferred_state(&self) -> bool;

    /// Bit 6 set: values outside the logical range mean "no data"
    fn has_null_state(&self) -> bool;

    /// Bit 7, reserved for Input items
    fn is_volatile(&self) -> bool;

    /// Bit 8
    fn is_buffered_bytes(&self) -> bool;
}

/// The flags of an Input, Output or Feature item, see Section 6.2.2.5.
///
/// The raw value is kept as-is, it ends up unmodified in
/// [HidValueCaps::bit_field](crate::preparsed::HidValueCaps::bit_field).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataItem(pub u32);

impl DataItem {
    pub const CONSTANT: u32 = 1 << 0;
    pub const VARIABLE: u32 = 1 << 1;
    pub const RELATIVE: u32 = 1 << 2;
    pub const NULL_STATE: u32 = 1 << 6;

    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl MainDataItem for DataItem {
    fn is_constant(&self) -> bool {
        bit(self.0, 0)
    }

    fn is_variable(&self) -> bool {
        bit(self.0, 1)
    }

    fn is_relative(&self) -> bool {
        bit(self.0, 2)
    }

    fn wraps(&self) -> bool {
        bit(self.0, 3)
    }

    fn is_nonlinear(&self) -> bool {
        bit(self.0, 4)
    }

    fn has_no_preferred_state(&self) -> bool {
        bit(self.0, 5)
    }

    fn has_null_state(&self) -> bool {
        bit(self.0, 6)
    }

    fn is_volatile(&self) -> bool {
        bit(self.0, 7)
    }

    fn is_buffered_bytes(&self) -> bool {
        bit(self.0, 8)
    }
}

/// Global items, Section 6.2.2.7. They stay in effect until changed or
/// until a Pop restores an earlier set.
///
/// Minimum and maximum values and the unit exponent use the signed interpretation
/// of the item data, all other items the unsigned one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlobalItem {
    UsagePage(UsagePage),
    LogicalMinimum(LogicalMinimum),
    LogicalMaximum(LogicalMaximum),
    PhysicalMinimum(PhysicalMinimum),
    PhysicalMaximum(PhysicalMaximum),
    UnitExponent(UnitExponent),
    Unit(Unit),
    ReportSize(ReportSize),
    ReportId(ReportId),
    ReportCount(ReportCount),
    Push,
    Pop,
    /// A global item with a tag not defined in HID 1.11
    Unknown { tag: u8 },
}

impl GlobalItem {
    fn new(tag: u8, value: &HidValue) -> GlobalItem {
        match tag {
            0x0 => GlobalItem::UsagePage(UsagePage(value.into())),
            0x1 => GlobalItem::LogicalMinimum(LogicalMinimum(value.into())),
            0x2 => GlobalItem::LogicalMaximum(LogicalMaximum(value.into())),
            0x3 => GlobalItem::PhysicalMinimum(PhysicalMinimum(value.into())),
            0x4 => GlobalItem::PhysicalMaximum(PhysicalMaximum(value.into())),
            0x5 => GlobalItem::UnitExponent(UnitExponent(value.into())),
            0x6 => GlobalItem::Unit(Unit(value.into())),
            0x7 => GlobalItem::ReportSize(ReportSize(value.into())),
            0x8 => GlobalItem::ReportId(ReportId(value.into())),
            0x9 => GlobalItem::ReportCount(ReportCount(value.into())),
            0xa => GlobalItem::Push,
            0xb => GlobalItem::Pop,
            tag => GlobalItem::Unknown { tag },
        }
    }
}

/// Local items, Section 6.2.2.8. They only apply to the next Main item.
///
/// A Usage with a 4-byte payload carries its own Usage Page in the upper
/// 16 bits. Where it does not, the Usage Page is `None` and the current
/// global Usage Page applies. The same is true for [LocalItem::UsageMinimum]
/// and [LocalItem::UsageMaximum], see [LocalItem::split_usage].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalItem {
    Usage {
        usage_page: Option<UsagePage>,
        usage_id: UsageId,
    },
    UsageMinimum(UsageMinimum),
    UsageMaximum(UsageMaximum),
    DesignatorIndex(DesignatorIndex),
    DesignatorMinimum(DesignatorMinimum),
    DesignatorMaximum(DesignatorMaximum),
    StringIndex(StringIndex),
    StringMinimum(StringMinimum),
    StringMaximum(StringMaximum),
    Delimiter(Delimiter),
    /// A local item with a tag not defined in HID 1.11
    Unknown { tag: u8 },
}

impl LocalItem {
    fn new(tag: u8, value: &HidValue) -> LocalItem {
        match tag {
            0x0 => {
                let (usage_page, usage_id) = LocalItem::split_usage(value.into());
                LocalItem::Usage {
                    usage_page,
                    usage_id,
                }
            }
            0x1 => LocalItem::UsageMinimum(UsageMinimum(value.into())),
            0x2 => LocalItem::UsageMaximum(UsageMaximum(value.into())),
            0x3 => LocalItem::DesignatorIndex(DesignatorIndex(value.into())),
            0x4 => LocalItem::DesignatorMinimum(DesignatorMinimum(value.into())),
            0x5 => LocalItem::DesignatorMaximum(DesignatorMaximum(value.into())),
            0x7 => LocalItem::StringIndex(StringIndex(value.into())),
            0x8 => LocalItem::StringMinimum(StringMinimum(value.into())),
            0x9 => LocalItem::StringMaximum(StringMaximum(value.into())),
            0xa => LocalItem::Delimiter(Delimiter(value.into())),
            tag => LocalItem::Unknown { tag },
        }
    }

    /// Split a 32-bit extended usage into its (optional) Usage Page and
    /// its Usage ID.
    pub fn split_usage(value: u32) -> (Option<UsagePage>, UsageId) {
        let usage_page = match (value >> 16) as u16 {
            0 => None,
            page => Some(UsagePage(page)),
        };
        (usage_page, UsageId((value & 0xffff) as u16))
    }
}

// The raw bytes of one item: 1 to 5 bytes for short items, 3 to 258 for
// long items (Section 6.2.2.2 and 6.2.2.3). HID 1.11 defines no long item
// tags.
pub trait Item {
    /// Header plus data bytes
    fn size(&self) -> usize;

    fn item_type(&self) -> ItemType;

    /// The upper nibble of the header for short items, the tag byte for
    /// long items.
    fn tag(&self) -> u8;

    /// The first byte, always 0xfe for long items
    fn header(&self) -> u8;

    fn is_long_item(&self) -> bool;

    /// Header and data bytes
    fn bytes(&self) -> &[u8];
}

/// A short item, see Section 6.2.2.2: a one byte prefix with
/// `tag:4 type:2 size:2` followed by 0, 1, 2 or 4 data bytes. Size code 3
/// means 4 bytes.
#[derive(Debug, Clone)]
pub struct ShortItem {
    item_type: ItemType,
    value: HidValue,
    bytes: Vec<u8>,
}

impl ShortItem {
    /// The item data as unsigned value, zero-extended from the item size.
    pub fn value(&self) -> u32 {
        u32::from(&self.value)
    }

    /// The item data as signed value, sign-extended from the item size.
    pub fn signed_value(&self) -> i32 {
        i32::from(&self.value)
    }

    /// The number of data bytes (0, 1, 2 or 4).
    pub fn data_size(&self) -> usize {
        self.value.len()
    }
}

impl Item for ShortItem {
    fn size(&self) -> usize {
        self.bytes.len()
    }

    fn item_type(&self) -> ItemType {
        self.item_type
    }

    fn tag(&self) -> u8 {
        (self.header() & 0b11110000) >> 4
    }

    fn header(&self) -> u8 {
        self.bytes[0]
    }

    fn is_long_item(&self) -> bool {
        false
    }

    fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<&[u8]> for ShortItem {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<ShortItem> {
        ensure!(
            !bytes.is_empty(),
            HidError::InsufficientData {
                needed: 1,
                available: 0
            }
        );
        let header = bytes[0];
        let size = match header & 0b0011 {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };
        ensure!(
            bytes.len() > size,
            HidError::InsufficientData {
                needed: size + 1,
                available: bytes.len()
            }
        );
        let value = HidValue::try_from(&bytes[1..size + 1])?;
        let tag = (header & 0b11110000) >> 4;
        let item_type = match (header & 0b1100) >> 2 {
            0 => ItemType::Main(MainItem::new(tag, &value)),
            1 => ItemType::Global(GlobalItem::new(tag, &value)),
            2 => ItemType::Local(LocalItem::new(tag, &value)),
            _ => ItemType::Reserved,
        };

        Ok(ShortItem {
            item_type,
            value,
            bytes: bytes[0..size + 1].to_owned(),
        })
    }
}

/// A long item, see Section 6.2.2.3: `0xfe`, a data size byte, a tag byte
/// and up to 255 data bytes.
#[derive(Debug, Clone)]
pub struct LongItem {
    bytes: Vec<u8>,
}

impl LongItem {
    pub const HEADER: u8 = 0b11111110;

    pub fn data(&self) -> &[u8] {
        &self.bytes[3..]
    }
}

impl Item for LongItem {
    fn size(&self) -> usize {
        self.bytes.len()
    }

    fn item_type(&self) -> ItemType {
        ItemType::Long
    }

    fn tag(&self) -> u8 {
        self.bytes[2]
    }

    fn header(&self) -> u8 {
        self.bytes[0]
    }

    fn is_long_item(&self) -> bool {
        true
    }

    fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<&[u8]> for LongItem {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<LongItem> {
        ensure!(
            bytes.len() >= 3,
            HidError::InsufficientData {
                needed: 3,
                available: bytes.len()
            }
        );
        ensure!(
            bytes[0] == LongItem::HEADER,
            HidError::InvalidData {
                message: "Item is not a long item".into(),
            }
        );
        let size = bytes[1] as usize + 3;
        ensure!(
            bytes.len() >= size,
            HidError::InsufficientData {
                needed: size,
                available: bytes.len()
            }
        );

        Ok(LongItem {
            bytes: bytes[0..size].to_owned(),
        })
    }
}

/// Either kind of item as found in a report descriptor.
#[derive(Debug, Clone)]
pub enum DescriptorItem {
    Short(ShortItem),
    Long(LongItem),
}

impl Item for DescriptorItem {
    fn size(&self) -> usize {
        match self {
            DescriptorItem::Short(item) => item.size(),
            DescriptorItem::Long(item) => item.size(),
        }
    }

    fn item_type(&self) -> ItemType {
        match self {
            DescriptorItem::Short(item) => item.item_type(),
            DescriptorItem::Long(item) => item.item_type(),
        }
    }

    fn tag(&self) -> u8 {
        match self {
            DescriptorItem::Short(item) => item.tag(),
            DescriptorItem::Long(item) => item.tag(),
        }
    }

    fn header(&self) -> u8 {
        match self {
            DescriptorItem::Short(item) => item.header(),
            DescriptorItem::Long(item) => item.header(),
        }
    }

    fn is_long_item(&self) -> bool {
        matches!(self, DescriptorItem::Long(_))
    }

    fn bytes(&self) -> &[u8] {
        match self {
            DescriptorItem::Short(item) => item.bytes(),
            DescriptorItem::Long(item) => item.bytes(),
        }
    }
}

impl TryFrom<&[u8]> for DescriptorItem {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<DescriptorItem> {
        match bytes.first() {
            Some(&LongItem::HEADER) => Ok(DescriptorItem::Long(LongItem::try_from(bytes)?)),
            _ => Ok(DescriptorItem::Short(ShortItem::try_from(bytes)?)),
        }
    }
}

/// An item and where it sits in the report descriptor.
#[derive(Debug, Clone)]
pub struct ReportDescriptorItem {
    offset: usize,
    item: DescriptorItem,
}

impl ReportDescriptorItem {
    /// Byte offset in the report descriptor
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn item(&self) -> &DescriptorItem {
        &self.item
    }

    pub fn item_type(&self) -> ItemType {
        self.item.item_type()
    }
}

/// All items of a report descriptor in order.
#[derive(Debug, Default)]
pub struct ReportDescriptorItems {
    items: Vec<ReportDescriptorItem>,
}

impl std::ops::Deref for ReportDescriptorItems {
    type Target = [ReportDescriptorItem];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl TryFrom<&[u8]> for ReportDescriptorItems {
    type Error = ParserError;

    fn try_from(bytes: &[u8]) -> crate::Result<Self> {
        itemize(bytes)
    }
}

/// Cuts `bytes` into items, failing on the first truncated one.
fn itemize(bytes: &[u8]) -> crate::Result<ReportDescriptorItems> {
    let mut offset = 0;
    let mut items: Vec<ReportDescriptorItem> = Vec::new();
    while offset < bytes.len() {
        let item = match DescriptorItem::try_from(&bytes[offset..]) {
            Ok(item) => item,
            Err(e) => {
                tracing::error!("Failed to decode item at offset {offset}: {e}");
                return Err(ParserError::InvalidItem {
                    offset,
                    source: e,
                });
            }
        };
        let off = offset;
        offset += item.size();
        items.push(ReportDescriptorItem { offset: off, item });
    }
    Ok(ReportDescriptorItems { items })
}
