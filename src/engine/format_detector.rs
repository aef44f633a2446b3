//! Format auto-detection (§4.2).
//!
//! The priority-ordered algorithm (extension, then magic bytes, then
//! delimiter-consistency scoring, then JSON shape sniffing) mirrors the
//! staged approach in `jqnatividad/csv-nose`'s `Sniffer` (extension/dialect
//! hints first, then a scored "table uniformity" pass over a byte sample),
//! simplified to the concrete rules the spec pins down exactly.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Csv,
    Tsv,
    JsonArray,
    JsonLines,
    Parquet,
    Xlsx,
    Avro,
}

#[derive(Debug, Clone, Copy)]
pub struct DetectionResult {
    pub format: DetectedFormat,
    pub delimiter: Option<u8>,
    pub has_header: bool,
}

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

/// `filename` is an optional hint (extension wins first per spec priority).
pub fn detect(sample: &[u8], filename: Option<&str>) -> DetectionResult {
    if let Some(fmt) = detect_by_extension(filename) {
        return finish(fmt, sample);
    }
    if let Some(fmt) = detect_by_magic_bytes(sample) {
        return finish(fmt, sample);
    }

    let trimmed_start = sample.iter().position(|b| !b.is_ascii_whitespace());
    if let Some(pos) = trimmed_start {
        if sample[pos] == b'[' {
            return finish(DetectedFormat::JsonArray, sample);
        }
    }
    if looks_like_json_lines_impl(sample) {
        return finish(DetectedFormat::JsonLines, sample);
    }

    // Delimiter-consistency scoring over the text sample.
    let lines: Vec<&[u8]> = sample.split(|&b| b == b'\n').take(20).collect();
    let mut best: Option<(u8, f64, f64)> = None; // (delim, consistency, avg_count)
    for &delim in CANDIDATE_DELIMITERS.iter() {
        let counts: Vec<usize> = lines
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| l.iter().filter(|&&b| b == delim).count())
            .collect();
        if counts.is_empty() {
            continue;
        }
        let avg = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        if avg < 2.0 {
            continue;
        }
        let variance = counts
            .iter()
            .map(|&c| {
                let d = c as f64 - avg;
                d * d
            })
            .sum::<f64>()
            / counts.len() as f64;
        let consistency = 1.0 / (1.0 + variance);
        let better = match best {
            None => true,
            Some((_, best_consistency, best_avg)) => {
                consistency > best_consistency
                    || (consistency == best_consistency && avg > best_avg)
            }
        };
        if better {
            best = Some((delim, consistency, avg));
        }
    }

    let format = match best.map(|(d, _, _)| d) {
        Some(b'\t') => DetectedFormat::Tsv,
        Some(_) => DetectedFormat::Csv,
        None => DetectedFormat::Csv,
    };
    let delimiter = best.map(|(d, _, _)| d).or(Some(b','));
    DetectionResult {
        format,
        delimiter,
        has_header: detect_header(sample, delimiter.unwrap_or(b',')),
    }
}

fn finish(format: DetectedFormat, sample: &[u8]) -> DetectionResult {
    let delimiter = match format {
        DetectedFormat::Tsv => Some(b'\t'),
        DetectedFormat::Csv => Some(b','),
        _ => None,
    };
    let has_header = matches!(format, DetectedFormat::Csv | DetectedFormat::Tsv)
        && detect_header(sample, delimiter.unwrap_or(b','));
    DetectionResult {
        format,
        delimiter,
        has_header,
    }
}

fn detect_by_extension(filename: Option<&str>) -> Option<DetectedFormat> {
    let name = filename?.to_ascii_lowercase();
    if name.ends_with(".tsv") {
        Some(DetectedFormat::Tsv)
    } else if name.ends_with(".csv") {
        Some(DetectedFormat::Csv)
    } else if name.ends_with(".parquet") {
        Some(DetectedFormat::Parquet)
    } else if name.ends_with(".xlsx") || name.ends_with(".xls") {
        Some(DetectedFormat::Xlsx)
    } else if name.ends_with(".avro") {
        Some(DetectedFormat::Avro)
    } else if name.ends_with(".jsonl") || name.ends_with(".ndjson") {
        Some(DetectedFormat::JsonLines)
    } else if name.ends_with(".json") {
        Some(DetectedFormat::JsonArray)
    } else {
        None
    }
}

fn detect_by_magic_bytes(sample: &[u8]) -> Option<DetectedFormat> {
    if sample.len() >= 4 && (&sample[0..4] == b"PAR1") {
        return Some(DetectedFormat::Parquet);
    }
    if sample.len() >= 4 && &sample[0..4] == b"PK\x03\x04" {
        return Some(DetectedFormat::Xlsx);
    }
    if sample.len() >= 4 && &sample[0..4] == b"Obj\x01" {
        return Some(DetectedFormat::Avro);
    }
    None
}

/// Every non-empty line parses as an independent JSON value.
fn looks_like_json_lines_impl(sample: &[u8]) -> bool {
    let text = match std::str::from_utf8(sample) {
        Ok(t) => t,
        Err(_) => return false,
    };
    let mut saw_any = false;
    for line in text.lines().take(20) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        saw_any = true;
        if serde_json::from_str::<serde_json::Value>(line).is_err() {
            return false;
        }
    }
    saw_any
}

fn detect_header(sample: &[u8], delimiter: u8) -> bool {
    let text = match std::str::from_utf8(sample) {
        Ok(t) => t,
        Err(_) => return true,
    };
    let mut lines = text.lines();
    let header_line = match lines.next() {
        Some(l) => l,
        None => return true,
    };
    let header_cells: Vec<&str> = header_line.split(delimiter as char).collect();
    if header_cells.iter().any(|c| c.trim().is_empty()) {
        return false;
    }
    for line in lines.take(20) {
        let cells: Vec<&str> = line.split(delimiter as char).collect();
        for (i, cell) in cells.iter().enumerate() {
            if i >= header_cells.len() {
                break;
            }
            let trimmed = cell.trim();
            if !trimmed.is_empty()
                && (trimmed.parse::<f64>().is_ok() || matches!(trimmed, "true" | "false"))
            {
                return true;
            }
        }
    }
    // No row offered conflicting evidence; default to treating row 0 as header
    // since it was composed entirely of non-empty strings.
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_csv_by_extension() {
        let r = detect(b"a,b,c\n1,2,3\n", Some("data.csv"));
        assert_eq!(r.format, DetectedFormat::Csv);
        assert_eq!(r.delimiter, Some(b','));
    }

    #[test]
    fn detects_tsv_by_extension() {
        let r = detect(b"a\tb\tc\n1\t2\t3\n", Some("data.tsv"));
        assert_eq!(r.format, DetectedFormat::Tsv);
        assert_eq!(r.delimiter, Some(b'\t'));
    }

    #[test]
    fn detects_parquet_magic_bytes() {
        let mut bytes = b"PAR1".to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        let r = detect(&bytes, None);
        assert_eq!(r.format, DetectedFormat::Parquet);
    }

    #[test]
    fn detects_json_array_by_leading_bracket() {
        let r = detect(b"[{\"a\":1},{\"a\":2}]", None);
        assert_eq!(r.format, DetectedFormat::JsonArray);
    }

    #[test]
    fn detects_delimiter_by_consistency_when_no_hints() {
        let r = detect(b"a,b,c\n1,2,3\n4,5,6\n7,8,9\n", None);
        assert_eq!(r.format, DetectedFormat::Csv);
        assert_eq!(r.delimiter, Some(b','));
    }

    #[test]
    fn header_detection_requires_non_string_typed_row() {
        assert!(detect_header(b"name,age\nAlice,30\n", b','));
        assert!(!detect_header(b"name,\nAlice,30\n", b','));
    }
}
