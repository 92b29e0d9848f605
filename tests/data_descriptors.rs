// SPDX-License-Identifier: MIT

// One test per tests/data/*.hid.bin, generated by build.rs
include!(concat!(env!("OUT_DIR"), "/test-report-descriptors.rs"));

fn check_device_description(desc: &DeviceDescription) {
    assert_eq!(desc.collection_desc.len(), 1);
    let collection = &desc.collection_desc[0];
    let preparsed = &collection.preparsed_data;

    // The binary form survives a round trip
    let bytes = preparsed.to_bytes();
    assert_eq!(bytes.len(), collection.preparsed_data_length());
    assert_eq!(&bytes[0..8], b"HidP KDR");
    let copy = PreparsedData::try_from(bytes.as_slice()).unwrap();
    assert_eq!(&copy, preparsed);

    for report_type in ReportType::ALL {
        let info = preparsed.caps_info(report_type);
        let slice = preparsed.value_caps_slice(report_type);
        assert_eq!(slice.len(), (info.end - info.start) as usize);
        assert!(info.count as usize >= slice.len());

        let byte_length = preparsed.report_byte_length(report_type);
        assert_eq!(collection.length(report_type), byte_length);
        for report in &desc.report_ids {
            assert!(report.length(report_type) <= byte_length);
        }

        // data index ranges tile 0..n
        let mut ranges: Vec<(u16, u16)> = Vec::new();
        for caps in preparsed.fields(report_type) {
            assert!(caps.bit_end() <= byte_length as usize * 8, "{report_type}: {caps}");
            assert!(desc.report_id(ReportId(caps.report_id)).is_some());
            assert!((caps.link_collection as usize) < preparsed.link_collection_nodes().len());
            ranges.push((caps.data_index_min, caps.data_index_max));
        }
        ranges.sort();
        let mut next_index = 0;
        for (min, max) in ranges {
            assert_eq!(min, next_index);
            next_index = max + 1;
        }
        assert_eq!(preparsed.caps().report(report_type).data_indices, next_index);
    }

    let ids: Vec<ReportId> = desc.report_ids.iter().map(|r| r.report_id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(ids, sorted);

    // Every node but the root is listed exactly once as a child
    let nodes = preparsed.link_collection_nodes();
    let mut seen = vec![false; nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        let children: Vec<u16> = preparsed.children(i as u16).collect();
        assert_eq!(children.len(), node.number_of_children as usize);
        for child in children {
            assert_eq!(nodes[child as usize].parent as usize, i);
            assert!(!seen[child as usize]);
            seen[child as usize] = true;
        }
    }
    assert!(seen.iter().skip(1).all(|s| *s));
}
