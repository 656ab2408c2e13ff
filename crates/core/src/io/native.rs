//! Multi-page TIFF reading/writing for label stacks
//!
//! Each year is stored as one 8-bit grayscale page. The page's
//! `ImageDescription` tag carries `year=<YYYY>` so a stack can be read back
//! without a sidecar. Pages written by other tools (any integer or float
//! pixel format, no description) are accepted as long as every value fits a
//! label code.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::Path;

use ndarray::Array2;
use num_traits::NumCast;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::Gray8;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{Error, Result};
use crate::raster::{Label, LabelDomain, LabelStack, Year, YearRange};

const YEAR_PREFIX: &str = "year=";

/// Read a label stack from a multi-page TIFF file.
///
/// `first_year` is used only when the pages carry no year description.
pub fn read_stack<P: AsRef<Path>>(path: P, first_year: Year) -> Result<LabelStack> {
    let file = File::open(path.as_ref())?;
    decode_stack(BufReader::new(file), first_year)
}

/// Read a label stack from an in-memory TIFF buffer
pub fn read_stack_from_buffer(data: &[u8], first_year: Year) -> Result<LabelStack> {
    decode_stack(Cursor::new(data), first_year)
}

/// Write a label stack to a multi-page TIFF file, one page per year
pub fn write_stack<P: AsRef<Path>>(stack: &LabelStack, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    encode_stack(stack, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a label stack to an in-memory TIFF buffer
pub fn write_stack_to_buffer(stack: &LabelStack) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_stack(stack, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn decode_stack<R>(reader: R, first_year: Year) -> Result<LabelStack>
where
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());

    let mut layers = Vec::new();
    let mut page_years: Vec<Option<Year>> = Vec::new();

    loop {
        let (width, height) = decoder.dimensions()?;
        let (rows, cols) = (height as usize, width as usize);

        let year = decoder
            .get_tag_ascii_string(Tag::ImageDescription)
            .ok()
            .and_then(|desc| parse_year(&desc));

        let page = layers.len();
        let labels = narrow(decoder.read_image()?, cols, year.unwrap_or(first_year + page as Year))?;
        if labels.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                rows,
                cols,
                years: page + 1,
            });
        }
        layers.push(
            Array2::from_shape_vec((rows, cols), labels).map_err(|e| Error::Other(e.to_string()))?,
        );
        page_years.push(year);

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    let years = resolve_years(&page_years, first_year)?;
    debug!("Read {} pages covering {}", layers.len(), years);
    LabelStack::from_layers(&layers, years)
}

fn parse_year(description: &str) -> Option<Year> {
    description
        .trim()
        .strip_prefix(YEAR_PREFIX)
        .and_then(|y| y.trim().parse().ok())
}

/// Page years must either all be absent or form a contiguous ascending run
fn resolve_years(page_years: &[Option<Year>], first_year: Year) -> Result<YearRange> {
    if page_years.iter().all(Option::is_none) {
        return YearRange::with_len(first_year, page_years.len());
    }

    let years: Vec<Year> = page_years
        .iter()
        .enumerate()
        .map(|(page, y)| {
            y.ok_or_else(|| Error::Other(format!("page {} has no year description", page)))
        })
        .collect::<Result<_>>()?;

    let first = years[0];
    for (offset, &year) in years.iter().enumerate() {
        let expected = first + offset as Year;
        if year != expected {
            return Err(Error::MissingYear { year: expected });
        }
    }
    YearRange::with_len(first, years.len())
}

fn narrow(result: DecodingResult, cols: usize, year: Year) -> Result<Vec<Label>> {
    match result {
        DecodingResult::U8(buf) => Ok(buf.into_iter().map(Label).collect()),
        DecodingResult::U16(buf) => narrow_values(&buf, cols, year),
        DecodingResult::U32(buf) => narrow_values(&buf, cols, year),
        DecodingResult::U64(buf) => narrow_values(&buf, cols, year),
        DecodingResult::I8(buf) => narrow_values(&buf, cols, year),
        DecodingResult::I16(buf) => narrow_values(&buf, cols, year),
        DecodingResult::I32(buf) => narrow_values(&buf, cols, year),
        DecodingResult::I64(buf) => narrow_values(&buf, cols, year),
        DecodingResult::F32(buf) => narrow_values(&buf, cols, year),
        DecodingResult::F64(buf) => narrow_values(&buf, cols, year),
        #[allow(unreachable_patterns)]
        _ => Err(Error::UnsupportedDataType(
            "Unsupported TIFF pixel format".to_string(),
        )),
    }
}

fn narrow_values<T: NumCast + Copy>(buf: &[T], cols: usize, year: Year) -> Result<Vec<Label>> {
    let domain = LabelDomain::any();
    buf.iter()
        .enumerate()
        .map(|(i, &v)| {
            Label::from_numeric(v).ok_or_else(|| {
                let (row, col) = if cols == 0 { (0, 0) } else { (i / cols, i % cols) };
                Error::LabelOutOfDomain {
                    label: num_traits::cast::<T, i64>(v).unwrap_or(i64::MIN),
                    year,
                    min: domain.min,
                    max: domain.max,
                }
                .at_pixel(row, col)
            })
        })
        .collect()
}

fn encode_stack<W>(stack: &LabelStack, writer: W) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = stack.shape();

    for year in stack.years().iter() {
        let layer = stack.layer(year)?;
        let data: Vec<u8> = layer.iter().map(|l| l.code()).collect();

        let mut image = encoder.new_image::<Gray8>(cols as u32, rows as u32)?;
        let description = format!("{}{}", YEAR_PREFIX, year);
        image
            .encoder()
            .write_tag(Tag::ImageDescription, description.as_str())?;
        image.write_data(&data)?;
    }

    debug!("Wrote {} pages of {} x {}", stack.years().len(), cols, rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stack() -> LabelStack {
        let years = YearRange::new(2000, 2004).unwrap();
        let mut stack = LabelStack::filled(3, 4, years, Label(3));
        stack.set(1, 2, 2002, Label(12)).unwrap();
        stack.set(2, 3, 2004, Label(33)).unwrap();
        stack
    }

    #[test]
    fn test_buffer_roundtrip() {
        let stack = sample_stack();
        let buf = write_stack_to_buffer(&stack).unwrap();
        // first_year is ignored because pages carry their year
        let back = read_stack_from_buffer(&buf, 1900).unwrap();
        assert_eq!(back, stack);
    }

    #[test]
    fn test_file_roundtrip() {
        let stack = sample_stack();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        write_stack(&stack, tmp.path()).unwrap();
        let back = read_stack(tmp.path(), 1985).unwrap();
        assert_eq!(back.years(), stack.years());
        assert_eq!(back.get(1, 2, 2002).unwrap(), Label(12));
        assert_eq!(back.get(2, 3, 2004).unwrap(), Label(33));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_surfaces_device_full() {
        let stack = sample_stack();
        assert!(matches!(
            write_stack(&stack, "/dev/full"),
            Err(Error::Io(_)) | Err(Error::Tiff(_))
        ));
    }

    #[test]
    fn test_resolve_years() {
        assert_eq!(
            resolve_years(&[None, None, None], 1985).unwrap(),
            YearRange::new(1985, 1987).unwrap()
        );
        assert_eq!(
            resolve_years(&[Some(2001), Some(2002)], 1985).unwrap(),
            YearRange::new(2001, 2002).unwrap()
        );
        assert!(matches!(
            resolve_years(&[Some(2001), Some(2003)], 1985),
            Err(Error::MissingYear { year: 2002 })
        ));
        assert!(resolve_years(&[Some(2001), None], 1985).is_err());
    }

    #[test]
    fn test_narrow_rejects_unrepresentable() {
        let err = narrow_values(&[3_i32, 4, -1, 5], 2, 1990).unwrap_err();
        match err {
            Error::AtPixel { row, col, source } => {
                assert_eq!((row, col), (1, 0));
                assert!(matches!(*source, Error::LabelOutOfDomain { label: -1, year: 1990, .. }));
            }
            other => panic!("expected AtPixel, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("year=1999"), Some(1999));
        assert_eq!(parse_year(" year= 2020 "), Some(2020));
        assert_eq!(parse_year("classification"), None);
    }
}
