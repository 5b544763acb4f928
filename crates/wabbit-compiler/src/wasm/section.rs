//! Module sections and the length-prefixed vectors they are made of.

use num_enum::IntoPrimitive;

use super::leb128;

/// Section identifiers, in the order they must appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive)]
#[repr(u8)]
pub enum SectionId {
    Type = 1,
    Import = 2,
    Function = 3,
    Memory = 5,
    Global = 6,
    Export = 7,
    Code = 10,
}

/// Write `items` as a vector: element count, then each element.
pub fn write_vec<T>(out: &mut Vec<u8>, items: &[T], mut write: impl FnMut(&mut Vec<u8>, &T)) {
    leb128::write_unsigned(out, items.len() as u64);
    for item in items {
        write(out, item);
    }
}

/// Write a UTF-8 name: byte length, then the bytes.
pub fn write_name(out: &mut Vec<u8>, name: &str) {
    leb128::write_unsigned(out, name.len() as u64);
    out.extend_from_slice(name.as_bytes());
}

/// Write a byte payload prefixed with its length.
pub fn write_sized(out: &mut Vec<u8>, payload: &[u8]) {
    leb128::write_unsigned(out, payload.len() as u64);
    out.extend_from_slice(payload);
}

/// Write a section: id byte, payload size, payload.
pub fn write_section(out: &mut Vec<u8>, id: SectionId, payload: &[u8]) {
    out.push(id.into());
    write_sized(out, payload);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_length_prefixed() {
        let mut out = Vec::new();
        write_name(&mut out, "main");
        assert_eq!(out, [4, b'm', b'a', b'i', b'n']);
    }

    #[test]
    fn vectors_count_elements() {
        let mut out = Vec::new();
        write_vec(&mut out, &[1u8, 2, 3], |out, b| out.push(*b * 2));
        assert_eq!(out, [3, 2, 4, 6]);
    }

    #[test]
    fn section_header() {
        let mut out = Vec::new();
        write_section(&mut out, SectionId::Code, &[0xaa; 130]);
        assert_eq!(&out[..3], [10, 0x82, 0x01]);
        assert_eq!(out.len(), 133);
    }
}
