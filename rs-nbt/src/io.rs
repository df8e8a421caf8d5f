use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::trace;

use crate::{Compound, List, MAX_DEPTH, NbtError, Tag, TagType};

/// Reads an uncompressed root compound, discarding its name.
pub fn read<R: Read>(r: &mut R) -> Result<Compound, NbtError> {
    read_named(r).map(|(_, root)| root)
}

pub fn read_named<R: Read>(r: &mut R) -> Result<(String, Compound), NbtError> {
    let ty = TagType::from_id(r.read_u8()?)?;
    if ty != TagType::Compound {
        return Err(NbtError::RootNotCompound(ty));
    }
    let name = read_string(r)?;
    let root = read_compound(r, 0)?;
    trace!(name = %name, entries = root.len(), "read nbt root");
    Ok((name, root))
}

/// Reads a gzip-compressed root compound (`.moon` files).
pub fn read_compressed<R: Read>(r: R) -> Result<Compound, NbtError> {
    let mut decoder = GzDecoder::new(r);
    read(&mut decoder)
}

pub fn write<W: Write>(w: &mut W, root: &Compound) -> Result<(), NbtError> {
    write_named(w, "", root)
}

pub fn write_named<W: Write>(w: &mut W, name: &str, root: &Compound) -> Result<(), NbtError> {
    w.write_u8(TagType::Compound.id())?;
    write_string(w, name)?;
    write_compound(w, root)
}

pub fn write_compressed<W: Write>(w: W, root: &Compound) -> Result<(), NbtError> {
    let mut encoder = GzEncoder::new(w, Compression::default());
    write(&mut encoder, root)?;
    encoder.finish()?;
    Ok(())
}

fn read_string<R: Read>(r: &mut R) -> Result<String, NbtError> {
    let len = r.read_u16::<BigEndian>()? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    // Modified UTF-8 only differs from UTF-8 for NUL and supplementary characters.
    Ok(match String::from_utf8(buf) {
        Ok(s) => s,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

fn read_len<R: Read>(r: &mut R) -> Result<usize, NbtError> {
    let len = r.read_i32::<BigEndian>()?;
    if len < 0 {
        return Err(NbtError::NegativeLength(len));
    }
    Ok(len as usize)
}

/// Elements read per step. Arrays grow as the input delivers them, so a
/// bogus length prefix fails with an I/O error instead of a huge allocation.
const ARRAY_CHUNK: usize = 4096;

fn read_array<T, R, F>(r: &mut R, len: usize, mut fill: F) -> Result<Vec<T>, NbtError>
where
    T: Copy + Default,
    R: Read,
    F: FnMut(&mut R, &mut [T]) -> std::io::Result<()>,
{
    let mut out = Vec::with_capacity(len.min(ARRAY_CHUNK));
    let mut chunk = [T::default(); ARRAY_CHUNK];
    let mut left = len;
    while left > 0 {
        let n = left.min(ARRAY_CHUNK);
        fill(r, &mut chunk[..n])?;
        out.extend_from_slice(&chunk[..n]);
        left -= n;
    }
    Ok(out)
}

fn read_compound<R: Read>(r: &mut R, depth: usize) -> Result<Compound, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::TooDeep(MAX_DEPTH));
    }
    let mut out = Compound::new();
    loop {
        let ty = TagType::from_id(r.read_u8()?)?;
        if ty == TagType::End {
            return Ok(out);
        }
        let key = read_string(r)?;
        let value = read_payload(r, ty, depth + 1)?;
        out.insert(key, value);
    }
}

fn read_payload<R: Read>(r: &mut R, ty: TagType, depth: usize) -> Result<Tag, NbtError> {
    Ok(match ty {
        TagType::End => return Err(NbtError::UnknownTag(0)),
        TagType::Byte => Tag::Byte(r.read_i8()?),
        TagType::Short => Tag::Short(r.read_i16::<BigEndian>()?),
        TagType::Int => Tag::Int(r.read_i32::<BigEndian>()?),
        TagType::Long => Tag::Long(r.read_i64::<BigEndian>()?),
        TagType::Float => Tag::Float(r.read_f32::<BigEndian>()?),
        TagType::Double => Tag::Double(r.read_f64::<BigEndian>()?),
        TagType::ByteArray => {
            let len = read_len(r)?;
            Tag::ByteArray(read_array(r, len, |r, buf: &mut [i8]| r.read_i8_into(buf))?)
        }
        TagType::String => Tag::String(read_string(r)?),
        TagType::List => {
            if depth > MAX_DEPTH {
                return Err(NbtError::TooDeep(MAX_DEPTH));
            }
            let element = TagType::from_id(r.read_u8()?)?;
            let len = read_len(r)?;
            if element == TagType::End && len > 0 {
                return Err(NbtError::UnknownTag(0));
            }
            let mut values = Vec::with_capacity(len.min(ARRAY_CHUNK));
            for _ in 0..len {
                values.push(read_payload(r, element, depth + 1)?);
            }
            Tag::List(List::from_parts(element, values))
        }
        TagType::Compound => Tag::Compound(read_compound(r, depth)?),
        TagType::IntArray => {
            let len = read_len(r)?;
            Tag::IntArray(read_array(r, len, |r, buf: &mut [i32]| {
                r.read_i32_into::<BigEndian>(buf)
            })?)
        }
        TagType::LongArray => {
            let len = read_len(r)?;
            Tag::LongArray(read_array(r, len, |r, buf: &mut [i64]| {
                r.read_i64_into::<BigEndian>(buf)
            })?)
        }
    })
}

fn write_string<W: Write>(w: &mut W, s: &str) -> Result<(), NbtError> {
    let bytes = s.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(NbtError::StringTooLong(bytes.len()));
    }
    w.write_u16::<BigEndian>(bytes.len() as u16)?;
    w.write_all(bytes)?;
    Ok(())
}

fn write_compound<W: Write>(w: &mut W, compound: &Compound) -> Result<(), NbtError> {
    for (key, value) in compound.iter() {
        w.write_u8(value.tag_type().id())?;
        write_string(w, key)?;
        write_payload(w, value)?;
    }
    w.write_u8(TagType::End.id())?;
    Ok(())
}

fn write_payload<W: Write>(w: &mut W, tag: &Tag) -> Result<(), NbtError> {
    match tag {
        Tag::Byte(v) => w.write_i8(*v)?,
        Tag::Short(v) => w.write_i16::<BigEndian>(*v)?,
        Tag::Int(v) => w.write_i32::<BigEndian>(*v)?,
        Tag::Long(v) => w.write_i64::<BigEndian>(*v)?,
        Tag::Float(v) => w.write_f32::<BigEndian>(*v)?,
        Tag::Double(v) => w.write_f64::<BigEndian>(*v)?,
        Tag::ByteArray(v) => {
            w.write_i32::<BigEndian>(v.len() as i32)?;
            for b in v {
                w.write_i8(*b)?;
            }
        }
        Tag::String(s) => write_string(w, s)?,
        Tag::List(list) => {
            w.write_u8(list.element().id())?;
            w.write_i32::<BigEndian>(list.len() as i32)?;
            for value in list.iter() {
                write_payload(w, value)?;
            }
        }
        Tag::Compound(c) => write_compound(w, c)?,
        Tag::IntArray(v) => {
            w.write_i32::<BigEndian>(v.len() as i32)?;
            for i in v {
                w.write_i32::<BigEndian>(*i)?;
            }
        }
        Tag::LongArray(v) => {
            w.write_i32::<BigEndian>(v.len() as i32)?;
            for i in v {
                w.write_i64::<BigEndian>(*i)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn sample() -> Compound {
        let face = Compound::new()
            .with("tex", 0i16)
            .with("rot", 90.0f32)
            .with("uv", List::of_floats(&[0.0, 0.0, 8.0, 8.0]));
        let child = Compound::new()
            .with("name", "head")
            .with("piv", List::of_bytes(&[0, 24, 0]))
            .with("cube_data", Compound::new().with("n", face));
        Compound::new()
            .with("name", "models")
            .with("vsb", false)
            .with("chld", List::of_compounds([child]))
            .with("ids", vec![1i32, -2, 3])
            .with("empty", List::new(TagType::Float))
    }

    #[test]
    fn write_then_read_is_identity() {
        let root = sample();
        let mut buf = Vec::new();
        write_named(&mut buf, "avatar", &root).unwrap();
        let (name, back) = read_named(&mut Cursor::new(buf)).unwrap();
        assert_eq!(name, "avatar");
        assert_eq!(back, root);
        assert_eq!(
            back.get_list("empty").map(List::element),
            Some(TagType::Float)
        );
    }

    #[test]
    fn compressed_round_trip() {
        let root = sample();
        let mut buf = Vec::new();
        write_compressed(&mut buf, &root).unwrap();
        assert_eq!(&buf[..2], &[0x1f, 0x8b]);
        let back = read_compressed(Cursor::new(buf)).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn rejects_non_compound_root() {
        let bytes = [TagType::Int.id(), 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            read(&mut Cursor::new(bytes)),
            Err(NbtError::RootNotCompound(TagType::Int))
        ));
    }

    #[test]
    fn rejects_negative_array_length() {
        let mut buf = vec![TagType::Compound.id(), 0, 0];
        buf.push(TagType::ByteArray.id());
        buf.extend_from_slice(&[0, 1, b'a']);
        buf.extend_from_slice(&(-1i32).to_be_bytes());
        assert!(matches!(
            read(&mut Cursor::new(buf)),
            Err(NbtError::NegativeLength(-1))
        ));
    }

    #[test]
    fn huge_array_length_without_data_is_an_io_error() {
        for ty in [TagType::ByteArray, TagType::IntArray, TagType::LongArray] {
            let mut buf = vec![TagType::Compound.id(), 0, 0];
            buf.push(ty.id());
            buf.extend_from_slice(&[0, 1, b'a']);
            buf.extend_from_slice(&i32::MAX.to_be_bytes());
            assert!(matches!(read(&mut Cursor::new(buf)), Err(NbtError::Io(_))));
        }
    }

    #[test]
    fn arrays_longer_than_one_chunk_survive() {
        let longs: Vec<i64> = (0..ARRAY_CHUNK as i64 * 2 + 3).collect();
        let root = Compound::new().with("longs", longs.clone());
        let mut buf = Vec::new();
        write(&mut buf, &root).unwrap();
        let back = read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back.get("longs"), Some(&Tag::LongArray(longs)));
    }

    #[test]
    fn truncated_input_is_an_io_error() {
        let mut buf = Vec::new();
        write(&mut buf, &sample()).unwrap();
        buf.truncate(buf.len() / 2);
        assert!(matches!(read(&mut Cursor::new(buf)), Err(NbtError::Io(_))));
    }
}
