// SPDX-License-Identifier: MIT

//! A collection of standalone HID types that exist for type safety only.
//! Most of these are simple wrappers around their underlying integer data type.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).

/// Creates a `From<Foo> for u32` and `From<u32> for Foo` implementation for the given `Foo` type.
/// Use like this: `impl_from(Foo, Foo, u32)`.
macro_rules! impl_from {
    ($tipo:ty, $tipo_expr:expr, $to:ty) => {
        impl From<$tipo> for $to {
            fn from(f: $tipo) -> $to {
                f.0
            }
        }
        impl From<&$tipo> for $to {
            fn from(f: &$tipo) -> $to {
                f.0
            }
        }
        impl From<$to> for $tipo {
            fn from(f: $to) -> Self {
                $tipo_expr(f)
            }
        }
    };
}

/// Creates a `impl Display for Foo` that just converts into the underlying number.
/// Use like this: `impl_fmt(Foo, u32)`.
macro_rules! impl_fmt {
    ($tipo:ty, $to:ty) => {
        impl std::fmt::Display for $tipo {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let v: $to = self.into();
                write!(f, "{v}")
            }
        }
    };
}

// ---------- GLOBAL ITEMS ---------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UsagePage(pub u16);

impl_from!(UsagePage, UsagePage, u16);
impl_fmt!(UsagePage, u16);

#[cfg(feature = "hut")]
impl From<&hut::UsagePage> for UsagePage {
    fn from(usage_page: &hut::UsagePage) -> UsagePage {
        use hut::AsUsagePage;
        UsagePage(usage_page.usage_page_value())
    }
}

#[cfg(feature = "hut")]
impl From<hut::UsagePage> for UsagePage {
    fn from(usage_page: hut::UsagePage) -> UsagePage {
        UsagePage::from(&usage_page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalMinimum(pub i32);

impl_from!(LogicalMinimum, LogicalMinimum, i32);
impl_fmt!(LogicalMinimum, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalMaximum(pub i32);

impl_from!(LogicalMaximum, LogicalMaximum, i32);
impl_fmt!(LogicalMaximum, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalMinimum(pub i32);

impl_from!(PhysicalMinimum, PhysicalMinimum, i32);
impl_fmt!(PhysicalMinimum, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalMaximum(pub i32);

impl_from!(PhysicalMaximum, PhysicalMaximum, i32);
impl_fmt!(PhysicalMaximum, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit(pub u32);

impl_from!(Unit, Unit, u32);
impl_fmt!(Unit, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitExponent(pub i32);

impl_from!(UnitExponent, UnitExponent, i32);
impl_fmt!(UnitExponent, i32);

/// The size of one report field element in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSize(pub u32);

impl_from!(ReportSize, ReportSize, u32);
impl_fmt!(ReportSize, u32);

/// The report ID, `0` for devices that do not use numbered reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportId(pub u8);

impl_from!(ReportId, ReportId, u8);
impl_fmt!(ReportId, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportCount(pub u32);

impl_from!(ReportCount, ReportCount, u32);
impl_fmt!(ReportCount, u32);

// ----------------- LOCAL ITEMS --------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UsageId(pub u16);

impl_from!(UsageId, UsageId, u16);
impl_fmt!(UsageId, u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageMinimum(pub u32);

impl_from!(UsageMinimum, UsageMinimum, u32);
impl_fmt!(UsageMinimum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageMaximum(pub u32);

impl_from!(UsageMaximum, UsageMaximum, u32);
impl_fmt!(UsageMaximum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringIndex(pub u32);

impl_from!(StringIndex, StringIndex, u32);
impl_fmt!(StringIndex, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringMinimum(pub u32);

impl_from!(StringMinimum, StringMinimum, u32);
impl_fmt!(StringMinimum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringMaximum(pub u32);

impl_from!(StringMaximum, StringMaximum, u32);
impl_fmt!(StringMaximum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignatorIndex(pub u32);

impl_from!(DesignatorIndex, DesignatorIndex, u32);
impl_fmt!(DesignatorIndex, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignatorMinimum(pub u32);

impl_from!(DesignatorMinimum, DesignatorMinimum, u32);
impl_fmt!(DesignatorMinimum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignatorMaximum(pub u32);

impl_from!(DesignatorMaximum, DesignatorMaximum, u32);
impl_fmt!(DesignatorMaximum, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter(pub u32);

impl_from!(Delimiter, Delimiter, u32);
impl_fmt!(Delimiter, u32);

// ----------------- COMPOSITES --------------------

/// A full usage, i.e. the combination of a [UsagePage] and a [UsageId].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Usage {
    pub usage_page: UsagePage,
    pub usage_id: UsageId,
}

impl Usage {
    pub fn new(usage_page: u16, usage_id: u16) -> Usage {
        Usage {
            usage_page: UsagePage(usage_page),
            usage_id: UsageId(usage_id),
        }
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.usage_page.0, self.usage_id.0)
    }
}

#[cfg(feature = "hut")]
impl From<&hut::Usage> for Usage {
    fn from(usage: &hut::Usage) -> Usage {
        use hut::AsUsage;
        let value = usage.usage_value();
        Usage::new((value >> 16) as u16, (value & 0xffff) as u16)
    }
}

#[cfg(feature = "hut")]
impl From<hut::Usage> for Usage {
    fn from(usage: hut::Usage) -> Usage {
        Usage::from(&usage)
    }
}

/// The three kinds of reports a HID device exchanges with the host.
///
/// The numeric value is the index used for the per-type tables and matches
/// the order the value caps are laid out in the preparsed data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReportType {
    Input = 0,
    Output = 1,
    Feature = 2,
}

impl ReportType {
    pub const ALL: [ReportType; 3] = [ReportType::Input, ReportType::Output, ReportType::Feature];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReportType::Input => "Input",
            ReportType::Output => "Output",
            ReportType::Feature => "Feature",
        };
        write!(f, "{name}")
    }
}

/// The type of a collection, see Section 6.2.2.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionType {
    Physical,
    Application,
    Logical,
    Report,
    NamedArray,
    UsageSwitch,
    UsageModifier,
    Reserved { value: u8 },
    VendorDefined { value: u8 },
}

impl From<&CollectionType> for u8 {
    fn from(c: &CollectionType) -> u8 {
        match c {
            CollectionType::Physical => 0x00,
            CollectionType::Application => 0x01,
            CollectionType::Logical => 0x02,
            CollectionType::Report => 0x03,
            CollectionType::NamedArray => 0x04,
            CollectionType::UsageSwitch => 0x05,
            CollectionType::UsageModifier => 0x06,
            CollectionType::Reserved { value } => *value,
            CollectionType::VendorDefined { value } => *value,
        }
    }
}

impl From<CollectionType> for u8 {
    fn from(c: CollectionType) -> u8 {
        u8::from(&c)
    }
}

impl From<u8> for CollectionType {
    fn from(v: u8) -> CollectionType {
        match v {
            0x00 => CollectionType::Physical,
            0x01 => CollectionType::Application,
            0x02 => CollectionType::Logical,
            0x03 => CollectionType::Report,
            0x04 => CollectionType::NamedArray,
            0x05 => CollectionType::UsageSwitch,
            0x06 => CollectionType::UsageModifier,
            value @ 0x07..=0x7f => CollectionType::Reserved { value },
            value @ 0x80..=0xff => CollectionType::VendorDefined { value },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_type_roundtrip() {
        for v in 0..=255u8 {
            assert_eq!(u8::from(CollectionType::from(v)), v);
        }
        assert_eq!(CollectionType::from(1), CollectionType::Application);
        assert!(matches!(
            CollectionType::from(0x42),
            CollectionType::Reserved { value: 0x42 }
        ));
        assert!(matches!(
            CollectionType::from(0x80),
            CollectionType::VendorDefined { value: 0x80 }
        ));
    }

    #[test]
    fn usage_display() {
        let usage = Usage::new(0x01, 0x30);
        assert_eq!(format!("{usage}"), "0001:0030");
        assert_eq!(format!("{}", ReportType::Feature), "Feature");
    }

    #[cfg(feature = "hut")]
    #[test]
    fn from_hut() {
        use hut::AsUsage;

        let up = UsagePage::from(hut::UsagePage::GenericDesktop);
        assert_eq!(up, UsagePage(0x01));

        let usage = Usage::from(hut::GenericDesktop::X.usage());
        assert_eq!(usage, Usage::new(0x01, 0x30));
    }
}
