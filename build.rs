use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // For each hid.bin file in our test/data directory, create one basic test function
    // that parses that report descriptor and checks the preparsed data is consistent
    let datadir: PathBuf = [concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data")]
        .iter()
        .collect();
    println!("cargo:rerun-if-changed={}", datadir.display());
    let out_dir = std::env::var_os("OUT_DIR").ok_or("OUT_DIR not set")?;
    let dest_path = PathBuf::from(&out_dir).join("test-report-descriptors.rs");
    let mut file = std::fs::File::create(dest_path)?;

    writeln!(file, "use hidparse::*;")?;
    writeln!(file)?;

    let Ok(entries) = std::fs::read_dir(datadir) else {
        return Ok(());
    };

    for rdesc in entries.flatten() {
        let filename = rdesc.file_name().into_string().map_err(|_| "non-utf8 filename")?;
        if !filename.ends_with(".hid.bin") {
            continue;
        }
        let funcname = filename.replace([':', '.', '-'], "_");
        let path = rdesc.path();
        writeln!(
            file,
            "
#[test]
#[allow(non_snake_case)]
fn test_{funcname}() {{
    let bytes: Vec<u8> = std::fs::read({path:?}).unwrap();
    let desc = get_collection_description(&bytes).expect(&format!(\"Failed to parse {filename}\"));
    check_device_description(&desc);
}}
"
        )?;
    }

    Ok(())
}
