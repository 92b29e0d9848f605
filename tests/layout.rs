// SPDX-License-Identifier: MIT

use hidparse::*;

// A joystick with plain, constant, null-state and multi-usage variable
// values, variable buttons, array ranges and a four-usage array chain in a
// nested collection, and one Feature item with a Report Count of 0.
const JOYSTICK: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x04, // Usage (Joystick)
    0xa1, 0x01, // Collection (Application)
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x15, 0x01, //   Logical Minimum (1)
    0x25, 0x7f, //   Logical Maximum (127)
    0x35, 0x80, //   Physical Minimum (-128)
    0x45, 0x7f, //   Physical Maximum (127)
    0x09, 0x35, //   Usage (Rz)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x00, //   Report Count (0)
    0xb1, 0x02, //   Feature (Data,Var,Abs)
    0x09, 0x36, //   Usage (Slider)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x01, //   Report Count (1)
    0xb1, 0x02, //   Feature (Data,Var,Abs)
    0x09, 0x30, //   Usage (X)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x65, 0x0e, //   Unit (0x0e)
    0x55, 0xfd, //   Unit Exponent (-3)
    0x81, 0x02, //   Input (Data,Var,Abs)
    0x55, 0x00, //   Unit Exponent (0)
    0x65, 0x00, //   Unit (None)
    0x09, 0x31, //   Usage (Y)
    0x49, 0x01, //   Designator Minimum (1)
    0x59, 0x04, //   Designator Maximum (4)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x03, //   Input (Const,Var,Abs)
    0x09, 0x32, //   Usage (Z)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x06, //   Input (Data,Var,Rel)
    0x09, 0x33, //   Usage (Rx)
    0x09, 0x34, //   Usage (Ry)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x02, //   Report Count (2)
    0x15, 0x07, //   Logical Minimum (7)
    0x81, 0x42, //   Input (Data,Var,Abs,Null)
    0xa1, 0x01, //   Collection (Application)
    0x0b, 0x01, 0x00, 0x09, 0x00, // Usage (Button 1)
    0x0b, 0x02, 0x00, 0x09, 0x00, // Usage (Button 2)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x08, //     Report Count (8)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x81, 0x02, //     Input (Data,Var,Abs)
    0x1b, 0x03, 0x00, 0x09, 0x00, // Usage Minimum (Button 3)
    0x2b, 0x08, 0x00, 0x09, 0x00, // Usage Maximum (Button 8)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x01, //     Report Count (1)
    0x15, 0x03, //     Logical Minimum (3)
    0x25, 0x08, //     Logical Maximum (8)
    0x81, 0x00, //     Input (Data,Arr,Abs)
    0x1b, 0x09, 0x00, 0x09, 0x00, // Usage Minimum (Button 9)
    0x2b, 0x0c, 0x00, 0x09, 0x00, // Usage Maximum (Button 12)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x04, //     Report Count (4)
    0x15, 0x09, //     Logical Minimum (9)
    0x25, 0x0c, //     Logical Maximum (12)
    0x82, 0x00, 0x01, // Input (Data,Arr,Abs,Buff)
    0x0b, 0x0d, 0x00, 0x09, 0x00, // Usage (Button 13)
    0x0b, 0x0e, 0x00, 0x09, 0x00, // Usage (Button 14)
    0x0b, 0x0f, 0x00, 0x09, 0x00, // Usage (Button 15)
    0x0b, 0x10, 0x00, 0x09, 0x00, // Usage (Button 16)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x01, //     Report Count (1)
    0x15, 0x0d, //     Logical Minimum (13)
    0x25, 0x10, //     Logical Maximum (16)
    0x81, 0x00, //     Input (Data,Arr,Abs)
    0xc0, //   End Collection
    0xc0, // End Collection
];

fn flags(bits: u32) -> ValueCapsFlags {
    ValueCapsFlags::from_bits_retain(bits)
}

// Shared fields of the Generic Desktop values in the outer collection
fn axis(usage: u16, data_index: u16) -> HidValueCaps {
    HidValueCaps {
        usage_page: 0x01,
        bit_size: 8,
        report_count: 1,
        total_bits: 8,
        link_usage_page: 0x01,
        link_usage: 0x04,
        usage_min: usage,
        usage_max: usage,
        data_index_min: data_index,
        data_index_max: data_index,
        logical_min: 1,
        logical_max: 127,
        physical_min: -128,
        physical_max: 127,
        ..Default::default()
    }
}

// Shared fields of the buttons in the nested collection
fn button(usage: (u16, u16), data_index: (u16, u16)) -> HidValueCaps {
    HidValueCaps {
        usage_page: 0x09,
        bit_size: 8,
        report_count: 1,
        total_bits: 8,
        link_collection: 1,
        link_usage_page: 0x01,
        link_usage: 0,
        usage_min: usage.0,
        usage_max: usage.1,
        data_index_min: data_index.0,
        data_index_max: data_index.1,
        ..Default::default()
    }
}

fn expected_value_caps() -> Vec<HidValueCaps> {
    let ry_rx = |usage: u16, start_byte: u16, data_index: u16| HidValueCaps {
        bit_size: 16,
        total_bits: 16,
        start_byte,
        end_byte: start_byte + 2,
        bit_field: 0x042,
        flags: flags(0x08),
        null_value: 1,
        logical_min: 7,
        ..axis(usage, data_index)
    };
    let chain = |usage: u16, data_index: u16, more: bool| HidValueCaps {
        start_byte: 0x0e,
        end_byte: 0x0f,
        flags: flags(if more { 0x0d } else { 0x0c }),
        null_value: 13,
        logical_min: 16,
        ..button((usage, usage), (data_index, data_index))
    };

    vec![
        // Input
        HidValueCaps {
            start_byte: 1,
            end_byte: 2,
            bit_field: 0x002,
            flags: flags(0x08),
            units: 0x0e,
            units_exp: -3,
            ..axis(0x30, 0)
        },
        HidValueCaps {
            start_byte: 2,
            end_byte: 3,
            bit_field: 0x003,
            flags: flags(0x8a),
            designator_min: 1,
            designator_max: 4,
            ..axis(0x31, 1)
        },
        HidValueCaps {
            start_byte: 3,
            end_byte: 4,
            bit_field: 0x006,
            ..axis(0x32, 2)
        },
        ry_rx(0x34, 6, 3),
        ry_rx(0x33, 4, 4),
        HidValueCaps {
            start_bit: 1,
            bit_size: 1,
            report_count: 7,
            start_byte: 8,
            total_bits: 7,
            end_byte: 9,
            bit_field: 0x002,
            flags: flags(0x0c),
            ..button((2, 2), (5, 5))
        },
        HidValueCaps {
            bit_size: 1,
            start_byte: 8,
            total_bits: 1,
            end_byte: 9,
            bit_field: 0x002,
            flags: flags(0x0c),
            ..button((1, 1), (6, 6))
        },
        HidValueCaps {
            start_byte: 9,
            end_byte: 0x0a,
            flags: flags(0x1c),
            null_value: 3,
            logical_min: 8,
            ..button((3, 8), (7, 0x0c))
        },
        HidValueCaps {
            report_count: 4,
            start_byte: 0x0a,
            total_bits: 32,
            end_byte: 0x0e,
            bit_field: 0x100,
            flags: flags(0x1c),
            null_value: 9,
            logical_min: 12,
            ..button((9, 0x0c), (0x0d, 0x10))
        },
        chain(0x10, 0x14, true),
        chain(0x0f, 0x13, true),
        chain(0x0e, 0x12, true),
        chain(0x0d, 0x11, false),
        // Feature
        HidValueCaps {
            bit_size: 16,
            total_bits: 16,
            start_byte: 1,
            end_byte: 3,
            bit_field: 0x002,
            flags: flags(0x08),
            ..axis(0x36, 0)
        },
        // Slot of the Rz feature with a Report Count of 0
        HidValueCaps::default(),
    ]
}

#[test]
fn joystick_value_caps() {
    let preparsed = parse_descriptor(JOYSTICK).unwrap();
    let expected = expected_value_caps();
    let value_caps = preparsed.all_value_caps();

    assert_eq!(value_caps.len(), expected.len());
    for (index, (caps, expected)) in value_caps.iter().zip(&expected).enumerate() {
        assert_eq!(caps, expected, "value caps {index}");
    }
}

#[test]
fn joystick_caps_info() {
    let preparsed = parse_descriptor(JOYSTICK).unwrap();
    assert_eq!(preparsed.usage(), Usage::new(0x01, 0x04));

    let info = |start, count, end, report_byte_length| CapsInfo {
        start,
        count,
        end,
        report_byte_length,
    };
    assert_eq!(*preparsed.caps_info(ReportType::Input), info(0, 13, 13, 15));
    assert_eq!(*preparsed.caps_info(ReportType::Output), info(13, 0, 13, 0));
    assert_eq!(*preparsed.caps_info(ReportType::Feature), info(13, 2, 14, 3));

    assert_eq!(preparsed.value_caps_slice(ReportType::Input).len(), 13);
    assert!(preparsed.value_caps_slice(ReportType::Output).is_empty());
    assert_eq!(preparsed.value_caps_slice(ReportType::Feature).len(), 1);
}

#[test]
fn joystick_collection_nodes() {
    let preparsed = parse_descriptor(JOYSTICK).unwrap();
    let expected = [
        HidCollectionNode {
            usage: 0x04,
            usage_page: 0x01,
            parent: 0,
            number_of_children: 1,
            next_sibling: 0,
            first_child: 1,
            collection_type: 1,
        },
        HidCollectionNode {
            usage: 0,
            usage_page: 0x01,
            parent: 0,
            number_of_children: 0,
            next_sibling: 0,
            first_child: 0,
            collection_type: 1,
        },
    ];
    assert_eq!(preparsed.link_collection_nodes(), &expected);
}

#[test]
fn joystick_header_bytes() {
    let preparsed = parse_descriptor(JOYSTICK).unwrap();
    let bytes = preparsed.to_bytes();
    assert_eq!(bytes.len(), 44 + 15 * 104 + 2 * 16);
    assert_eq!(&bytes[0..8], b"HidP KDR");

    let words: Vec<u16> = bytes[8..44]
        .chunks_exact(2)
        .map(|w| u16::from_le_bytes([w[0], w[1]]))
        .collect();
    assert_eq!(words[0], 0x04);
    assert_eq!(words[1], 0x01);
    assert_eq!(&words[4..8], &[0, 13, 13, 15]);
    assert_eq!(&words[8..12], &[13, 0, 13, 0]);
    assert_eq!(&words[12..16], &[13, 2, 14, 3]);
    assert_eq!(&words[16..], &[1560, 2]);

    // The trailing slot is all zeroes
    let slot = 44 + 14 * 104;
    assert!(bytes[slot..slot + 104].iter().all(|b| *b == 0));

    let copy = PreparsedData::try_from(bytes.as_slice()).unwrap();
    assert_eq!(copy, preparsed);
}

#[test]
fn joystick_caps() {
    let preparsed = parse_descriptor(JOYSTICK).unwrap();
    let caps = preparsed.caps();
    assert_eq!(caps.usage, Usage::new(0x01, 0x04));
    assert_eq!(caps.input.report_byte_length, 15);
    assert_eq!(caps.input.data_indices, 0x15);
    assert_eq!(caps.output, ReportCaps::default());
    assert_eq!(caps.feature.report_byte_length, 3);
    assert_eq!(caps.feature.data_indices, 1);
    assert_eq!(caps.number_link_collection_nodes, 2);
}
