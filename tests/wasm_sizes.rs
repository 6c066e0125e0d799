use bundle2treemap::wasm::{decompose, extract_wasm_code_size};
use bundle2treemap::{Config, Error, SymbolTree, SymbolType};
use proptest::prelude::*;

fn module(wat: &str) -> Vec<u8> {
    wat::parse_str(wat).unwrap()
}

fn assert_function(tree: &SymbolTree, name: &str, kind: SymbolType, ordinal: u64) {
    let record = tree
        .get(name)
        .unwrap_or_else(|| panic!("no record named {name:?} in {tree:#?}"));
    assert_eq!(record.kind, kind, "record {name:?}");
    assert_eq!(record.ordinal, Some(ordinal), "record {name:?}");
}

#[test]
fn functions_imports_and_exports() {
    let bytes = module(
        r#"(module
            (import "env" "f" (func $f))
            (func $a)
            (func $main (export "main") call $f))"#,
    );
    let tree = decompose(&bytes, &Config::default()).unwrap();

    assert_function(&tree, "f", SymbolType::Import, 0);
    assert_function(&tree, "a", SymbolType::Function, 1);
    assert_function(&tree, "main", SymbolType::Export, 2);
    assert_eq!(tree.get("f").unwrap().size, 0);
    assert_eq!(tree.get("a").unwrap().size, 3);
    assert_eq!(tree.get("main").unwrap().size, 5);
    assert_eq!(tree.get("main").unwrap().minified_name, "2");
    // Count byte plus the section id and length.
    assert_eq!(tree.get("CODE").unwrap().size, 3);
    assert_eq!(tree.get("file header").unwrap().size, 8);
    assert!(tree.contains("CUSTOM/\"name\""));
    assert_eq!(tree.total_size(), bytes.len() as u64);
}

#[test]
fn functions_without_names_use_their_index() {
    let bytes = module(r#"(module (func) (func (export "run")))"#);
    let tree = decompose(&bytes, &Config::default()).unwrap();

    assert_function(&tree, "0", SymbolType::Function, 0);
    assert_function(&tree, "1", SymbolType::Export, 1);
    assert!(!tree.iter().any(|r| r.name.starts_with("CUSTOM")));
    assert_eq!(tree.total_size(), bytes.len() as u64);
}

#[test]
fn data_and_memory_sections_are_sized_whole() {
    let bytes = module(
        r#"(module
            (memory 1)
            (data (i32.const 0) "hello, world"))"#,
    );
    let tree = decompose(&bytes, &Config::default()).unwrap();

    let sections: Vec<_> = tree
        .iter()
        .filter(|r| r.kind == SymbolType::Section)
        .map(|r| r.name.as_str())
        .collect();
    assert!(sections.contains(&"MEMORY"));
    assert!(sections.contains(&"DATA"));
    assert_eq!(tree.total_size(), bytes.len() as u64);
}

#[test]
fn reads_modules_from_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("app.wasm");
    std::fs::write(&path, module("(module (func $only))")).unwrap();

    let tree = extract_wasm_code_size(&path, &Config::default()).unwrap();
    assert!(tree.contains("only"));
    assert!(tree.iter().all(|r| r.source_file == "app.wasm"));
}

#[test]
fn javascript_is_not_a_module() {
    let err = decompose(b"var a = 1;", &Config::default()).unwrap_err();
    assert!(matches!(err, Error::BadWasmMagic(_)));
}

fn leb128(mut value: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            bytes.push(byte);
            return bytes;
        }
        bytes.push(byte | 0x80);
    }
}

fn section(id: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![id];
    bytes.extend(leb128(payload.len()));
    bytes.extend_from_slice(payload);
    bytes
}

/// A module with a CODE section holding bodies of the given lengths, and a
/// custom section padded with `custom_len` bytes.
fn synthetic_module(body_lens: &[usize], custom_len: usize) -> Vec<u8> {
    let mut code = leb128(body_lens.len());
    for &len in body_lens {
        code.extend(leb128(len));
        code.extend(std::iter::repeat(0x0b).take(len));
    }
    let mut custom = vec![4];
    custom.extend_from_slice(b"junk");
    custom.extend(std::iter::repeat(0).take(custom_len));

    let mut bytes = vec![0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];
    bytes.extend(section(10, &code));
    bytes.extend(section(0, &custom));
    bytes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_records_cover_every_byte(
        body_lens in prop::collection::vec(0usize..300, 0..40),
        custom_len in 0usize..200,
    ) {
        let bytes = synthetic_module(&body_lens, custom_len);
        let tree = decompose(&bytes, &Config::default()).unwrap();

        prop_assert_eq!(tree.total_size(), bytes.len() as u64);
        for (index, &len) in body_lens.iter().enumerate() {
            let record = tree.get(&index.to_string()).unwrap();
            prop_assert_eq!(record.size, (leb128(len).len() + len) as u64);
            prop_assert_eq!(record.ordinal, Some(index as u64));
        }
    }

    #[test]
    fn prop_truncated_modules_fail_cleanly(
        body_lens in prop::collection::vec(1usize..50, 1..8),
        cut in 1usize..11,
    ) {
        // The trailing custom section is 11 bytes long, so every cut lands
        // inside it.
        let bytes = synthetic_module(&body_lens, 4);
        let truncated = &bytes[..bytes.len() - cut];
        prop_assert!(decompose(truncated, &Config::default()).is_err());
    }
}
