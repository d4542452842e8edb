//! XML serialization of the architecture-independent bitstream.
//!
//! The document has a single `<fabric_bitstream>` element holding one
//! `<bitstream_block>` per root. The output is deterministic: blocks appear
//! in tree order and no timestamps are written.

use crate::ids::ConfigBlockId;
use crate::tree::BitstreamManager;
use std::fmt::Write as _;
use std::path::Path;
use weft_common::{FabricError, FabricResult};

/// Renders the bitstream tree as XML.
pub fn render_bitstream_xml(manager: &BitstreamManager) -> FabricResult<String> {
    let mut out = String::new();
    out.push_str("<!--\n");
    out.push_str("  - Architecture independent bitstream\n");
    let _ = writeln!(out, "  - Generated by weft {}", env!("CARGO_PKG_VERSION"));
    out.push_str("-->\n");
    out.push_str("<fabric_bitstream>\n");
    for &root in manager.roots() {
        render_block(manager, root, 0, &mut out)?;
    }
    out.push_str("</fabric_bitstream>\n");
    Ok(out)
}

fn render_block(
    manager: &BitstreamManager,
    id: ConfigBlockId,
    level: usize,
    out: &mut String,
) -> FabricResult<()> {
    let block = manager.block(id)?;
    let indent = "  ".repeat(level + 1);
    let _ = writeln!(
        out,
        "{indent}<bitstream_block name=\"{}\" hierarchy_level=\"{level}\">",
        escape_attr(&block.name)
    );
    if !block.bits.is_empty() {
        let _ = writeln!(out, "{indent}  <bitstream>");
        for (i, &bit) in block.bits.iter().enumerate() {
            let _ = writeln!(
                out,
                "{indent}    <bit memory_port=\"mem_out[{i}]\" value=\"{}\"/>",
                u8::from(bit)
            );
        }
        let _ = writeln!(out, "{indent}  </bitstream>");
    }
    for &child in &block.children {
        render_block(manager, child, level + 1, out)?;
    }
    let _ = writeln!(out, "{indent}</bitstream_block>");
    Ok(())
}

fn escape_attr(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the bitstream tree and writes it to `path`.
pub fn write_bitstream_file(manager: &BitstreamManager, path: &Path) -> FabricResult<()> {
    let xml = render_bitstream_xml(manager)?;
    write_bitstream_xml(&xml, path)
}

/// Writes an already rendered bitstream document to `path`, creating its
/// parent directories.
pub fn write_bitstream_xml(xml: &str, path: &Path) -> FabricResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FabricError::io(parent, e))?;
    }
    std::fs::write(path, xml).map_err(|e| FabricError::io(path, e))?;
    log::info!("wrote architecture-independent bitstream to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_module::ModuleId;

    fn manager() -> BitstreamManager {
        let m = ModuleId::from_raw(0);
        let mut mgr = BitstreamManager::new();
        let root = mgr.add_block("grid_io_<top>", m, None).unwrap();
        let leaf = mgr.add_block("iopad_mem_0", m, Some(root)).unwrap();
        mgr.reserve_bits(leaf, 2).unwrap();
        mgr.set_bits(leaf, &[true, false]).unwrap();
        mgr
    }

    #[test]
    fn renders_nested_blocks() {
        let xml = render_bitstream_xml(&manager()).unwrap();
        assert!(xml.starts_with("<!--\n"));
        assert!(xml.contains(
            "<fabric_bitstream>\n  \
             <bitstream_block name=\"grid_io_&lt;top&gt;\" hierarchy_level=\"0\">\n    \
             <bitstream_block name=\"iopad_mem_0\" hierarchy_level=\"1\">\n      <bitstream>\n"
        ));
        assert!(xml.contains("<bit memory_port=\"mem_out[0]\" value=\"1\"/>"));
        assert!(xml.contains("<bit memory_port=\"mem_out[1]\" value=\"0\"/>"));
        assert!(xml.ends_with("  </bitstream_block>\n</fabric_bitstream>\n"));
    }

    #[test]
    fn several_roots_share_one_document_element() {
        let mut mgr = manager();
        let second = mgr.add_block("grid_clb", ModuleId::from_raw(1), None).unwrap();
        mgr.reserve_bits(second, 1).unwrap();
        mgr.set_bits(second, &[true]).unwrap();
        let xml = render_bitstream_xml(&mgr).unwrap();
        let top_level: Vec<&str> = xml
            .lines()
            .filter(|l| l.starts_with('<') && !l.starts_with("<!--"))
            .collect();
        assert_eq!(top_level, vec!["<fabric_bitstream>", "</fabric_bitstream>"]);
        assert_eq!(xml.matches("hierarchy_level=\"0\"").count(), 2);
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(
            render_bitstream_xml(&manager()).unwrap(),
            render_bitstream_xml(&manager()).unwrap()
        );
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("bitstream.xml");
        write_bitstream_file(&manager(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("iopad_mem_0"));
        assert_eq!(content, render_bitstream_xml(&manager()).unwrap());
    }
}
