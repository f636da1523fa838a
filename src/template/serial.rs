//! Versioned binary serialization for [`TemplateStore`].
//!
//! # Format (version 1, little-endian)
//!
//! ```text
//! "CMTS"                       magic
//! u16 version
//! u32 sample_count
//! u32 template_count
//! per template:
//!   u32 name_len, name_len bytes of UTF-8
//!   u8  flags (bit 0: preferred angle below 90 degrees)
//!   u32 sample count
//!   per sample:
//!     u32 point_count, point_count x (f64 x, f64 y)
//!     f64 norm
//!     4 x i32 acf summary
//!     sample_count x (f64 re, f64 im)       edges
//!     sample_count / 2 x (f64 re, f64 im)   acf
//! ```
//!
//! Any structural violation is reported as
//! [`ContourMatchError::CorruptStore`] so callers can fall back to an empty
//! store.

use crate::descriptor::{Descriptor, MIN_SAMPLE_COUNT};
use crate::geometry::{Contour, Point2};
use crate::template::{Sample, Template, TemplateStore};
use crate::trace::{trace_event, trace_span};
use crate::util::{Complex, ContourMatchError, ContourMatchResult};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"CMTS";

/// Current format version.
const STORE_VERSION: u16 = 1;

/// Maximum input size in bytes.
const MAX_INPUT_SIZE: u64 = 256 * 1024 * 1024;

/// Maximum descriptor length accepted on load.
const MAX_SAMPLE_COUNT: usize = 4096;

/// Maximum template name length in bytes.
const MAX_NAME_LEN: usize = 4096;

const FLAG_PREFERRED_ANGLE: u8 = 1;

fn corrupt(reason: impl Into<String>) -> ContourMatchError {
    ContourMatchError::CorruptStore {
        reason: reason.into(),
    }
}

impl TemplateStore {
    /// Serializes the store into a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&STORE_VERSION.to_le_bytes());
        put_len(&mut out, self.sample_count());
        put_len(&mut out, self.len());
        for template in self.iter() {
            put_len(&mut out, template.name().len());
            out.extend_from_slice(template.name().as_bytes());
            let flags = if template.preferred_angle_no_more_90() {
                FLAG_PREFERRED_ANGLE
            } else {
                0
            };
            out.push(flags);
            put_len(&mut out, template.samples().len());
            for sample in template.samples() {
                put_sample(&mut out, sample);
            }
        }
        out
    }

    /// Writes the serialized store to `writer`.
    pub fn write_to(&self, writer: &mut impl Write) -> ContourMatchResult<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Writes the store to a file.
    pub fn save_file(&self, path: impl AsRef<Path>) -> ContourMatchResult<()> {
        let _span = trace_span!("store_save", templates = self.len()).entered();
        let file = std::fs::File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a store from a reader.
    pub fn read_from(reader: &mut impl Read) -> ContourMatchResult<Self> {
        let mut buf = Vec::new();
        reader.take(MAX_INPUT_SIZE + 1).read_to_end(&mut buf)?;
        if buf.len() as u64 > MAX_INPUT_SIZE {
            return Err(corrupt(format!(
                "input too large: exceeds maximum allowed size of {MAX_INPUT_SIZE} bytes"
            )));
        }
        Self::from_bytes(&buf)
    }

    /// Reads a store from a file.
    pub fn load_file(path: impl AsRef<Path>) -> ContourMatchResult<Self> {
        let _span = trace_span!("store_load").entered();
        let file = std::fs::File::open(path.as_ref())?;
        let store = Self::read_from(&mut BufReader::new(file))?;
        trace_event!("store_loaded", templates = store.len());
        Ok(store)
    }

    /// Parses a store from bytes produced by [`TemplateStore::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> ContourMatchResult<Self> {
        let mut cur = Cursor { data, pos: 0 };
        if cur.take(4)? != MAGIC {
            return Err(corrupt("bad magic"));
        }
        let version = cur.u16()?;
        if version != STORE_VERSION {
            return Err(corrupt(format!(
                "unsupported version {version}, expected {STORE_VERSION}"
            )));
        }
        let sample_count = cur.len()?;
        if !(MIN_SAMPLE_COUNT..=MAX_SAMPLE_COUNT).contains(&sample_count) {
            return Err(corrupt(format!("sample count {sample_count} out of range")));
        }

        let template_count = cur.len()?;
        let mut templates: Vec<Template> = Vec::new();
        for _ in 0..template_count {
            let name_len = cur.len()?;
            if name_len == 0 || name_len > MAX_NAME_LEN {
                return Err(corrupt(format!("template name length {name_len} out of range")));
            }
            let name = std::str::from_utf8(cur.take(name_len)?)
                .map_err(|_| corrupt("template name is not valid UTF-8"))?
                .to_owned();
            if templates.iter().any(|t| t.name == name) {
                return Err(corrupt(format!("duplicate template name `{name}`")));
            }
            let flags = cur.u8()?;
            if flags & !FLAG_PREFERRED_ANGLE != 0 {
                return Err(corrupt(format!("unknown template flags {flags:#04x}")));
            }

            let mut template = Template::new(name);
            template.preferred_angle_no_more_90 = flags & FLAG_PREFERRED_ANGLE != 0;
            let sample_total = cur.len()?;
            if sample_total == 0 {
                return Err(corrupt("template without samples"));
            }
            for _ in 0..sample_total {
                template.samples.push(read_sample(&mut cur, sample_count)?);
            }
            templates.push(template);
        }

        if cur.pos != data.len() {
            return Err(corrupt(format!(
                "{} trailing bytes after last template",
                data.len() - cur.pos
            )));
        }
        Ok(TemplateStore::from_templates(sample_count, templates))
    }
}

fn put_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as u32).to_le_bytes());
}

fn put_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_complex(out: &mut Vec<u8>, value: Complex) {
    put_f64(out, value.re);
    put_f64(out, value.im);
}

fn put_sample(out: &mut Vec<u8>, sample: &Sample) {
    let points = sample.contour().points();
    put_len(out, points.len());
    for p in points {
        put_f64(out, p.x);
        put_f64(out, p.y);
    }
    let descriptor = sample.descriptor();
    put_f64(out, descriptor.norm());
    for value in descriptor.acf_descriptor() {
        out.extend_from_slice(&value.to_le_bytes());
    }
    for &edge in descriptor.edges() {
        put_complex(out, edge);
    }
    for &value in descriptor.acf() {
        put_complex(out, value);
    }
}

fn read_sample(cur: &mut Cursor<'_>, sample_count: usize) -> ContourMatchResult<Sample> {
    let point_count = cur.len()?;
    if point_count < 3 {
        return Err(corrupt("sample contour has fewer than three points"));
    }
    // Each point needs 16 bytes; reject counts the input cannot hold.
    if point_count > cur.remaining() / 16 {
        return Err(corrupt("sample contour truncated"));
    }
    let mut points = Vec::with_capacity(point_count);
    for _ in 0..point_count {
        let x = cur.f64()?;
        let y = cur.f64()?;
        if !x.is_finite() || !y.is_finite() {
            return Err(corrupt("non-finite contour point"));
        }
        points.push(Point2::new(x, y));
    }

    let norm = cur.f64()?;
    let mut acf_descriptor = [0i32; 4];
    for value in acf_descriptor.iter_mut() {
        *value = cur.i32()?;
    }
    let edges = cur.complexes(sample_count)?;
    let acf = cur.complexes(sample_count / 2)?;
    let descriptor = Descriptor::from_parts(edges, acf, acf_descriptor, norm).map_err(corrupt)?;
    Sample::from_parts(Contour::new(points), descriptor)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> ContourMatchResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(corrupt(format!(
                "unexpected end of data: need {len} bytes at offset {}, have {}",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> ContourMatchResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> ContourMatchResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> ContourMatchResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn len(&mut self) -> ContourMatchResult<usize> {
        Ok(u32::from_le_bytes(self.array()?) as usize)
    }

    fn i32(&mut self) -> ContourMatchResult<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn f64(&mut self) -> ContourMatchResult<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    fn complexes(&mut self, count: usize) -> ContourMatchResult<Vec<Complex>> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let re = self.f64()?;
            let im = self.f64()?;
            out.push(Complex::new(re, im));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::{Contour, Point2};
    use crate::template::TemplateStore;
    use crate::ContourMatchError;

    fn triangle() -> Contour {
        Contour::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(40.0, 0.0),
            Point2::new(20.0, 30.0),
        ])
    }

    #[test]
    fn empty_store_header_layout() {
        let bytes = TemplateStore::new().to_bytes();
        assert_eq!(&bytes[..4], b"CMTS");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 1);
        assert_eq!(bytes.len(), 4 + 2 + 4 + 4);
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = TemplateStore::new().to_bytes();
        bytes.push(0);
        assert!(matches!(
            TemplateStore::from_bytes(&bytes),
            Err(ContourMatchError::CorruptStore { .. })
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut store = TemplateStore::new();
        store.add_sample("tri", &triangle()).unwrap();
        let mut bytes = store.to_bytes();
        bytes[4] = 9;
        let err = TemplateStore::from_bytes(&bytes).unwrap_err();
        assert_eq!(
            err,
            ContourMatchError::CorruptStore {
                reason: "unsupported version 9, expected 1".to_owned()
            }
        );
    }

    #[test]
    fn every_truncation_is_reported_as_corrupt() {
        let mut store = TemplateStore::new();
        store.add_sample("tri", &triangle()).unwrap();
        let bytes = store.to_bytes();
        for len in 0..bytes.len() {
            let result = TemplateStore::from_bytes(&bytes[..len]);
            assert!(
                matches!(result, Err(ContourMatchError::CorruptStore { .. })),
                "truncation at {len} was accepted"
            );
        }
    }
}
