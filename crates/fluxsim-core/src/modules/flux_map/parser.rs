use crate::domain::{ComputeResult, FluxError, ParserResult};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs;
use std::path::Path;

pub(super) const REQUIRED_COLUMNS: [&str; 4] = ["particle", "energy", "costheta", "flux"];

#[derive(Debug, Clone, PartialEq)]
pub struct AngularFluxRow {
    pub particle: String,
    pub energy_mev: f64,
    pub cos_zenith: f64,
    pub flux: f64,
}

#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    particle: usize,
    energy: usize,
    costheta: usize,
    flux: usize,
    width: usize,
}

pub(super) fn read_flux_csv(path: &Path) -> ComputeResult<Vec<AngularFluxRow>> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            FluxError::not_found(
                "NOTFOUND.FLUX_CSV",
                format!("angular flux table '{}' does not exist", path.display()),
            )
        } else {
            FluxError::io_system(
                "IO.FLUX_CSV_READ",
                format!(
                    "failed to read angular flux table '{}': {}",
                    path.display(),
                    source
                ),
            )
        }
    })?;
    parse_flux_csv(&content, &path.display().to_string())
}

pub(super) fn parse_flux_csv(content: &str, source_label: &str) -> ParserResult<Vec<AngularFluxRow>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let header = reader
        .headers()
        .map_err(|source| csv_error(&source, source_label))?
        .clone();
    if is_blank(&header) {
        return Err(FluxError::input_validation(
            "INPUT.FLUX_CSV_EMPTY",
            format!("angular flux table '{}' is empty", source_label),
        ));
    }
    let layout = parse_header(&header, record_line(&header), source_label)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| csv_error(&source, source_label))?;
        if is_blank(&record) {
            continue;
        }
        let line_number = record_line(&record);
        if record.len() < layout.width {
            return Err(FluxError::input_validation(
                "INPUT.FLUX_CSV_ROW",
                format!(
                    "{}:{}: expected at least {} columns, found {}",
                    source_label,
                    line_number,
                    layout.width,
                    record.len()
                ),
            ));
        }

        let particle = &record[layout.particle];
        if particle.is_empty() {
            return Err(FluxError::input_validation(
                "INPUT.FLUX_CSV_ROW",
                format!("{}:{}: empty particle name", source_label, line_number),
            ));
        }

        rows.push(AngularFluxRow {
            particle: particle.to_string(),
            energy_mev: parse_number(&record[layout.energy], "energy", line_number, source_label)?,
            cos_zenith: parse_number(
                &record[layout.costheta],
                "costheta",
                line_number,
                source_label,
            )?,
            flux: parse_number(&record[layout.flux], "flux", line_number, source_label)?,
        });
    }

    Ok(rows)
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map_or(0, |position| position.line())
}

fn csv_error(source: &csv::Error, source_label: &str) -> FluxError {
    let line = source.position().map_or(0, |position| position.line());
    FluxError::input_validation(
        "INPUT.FLUX_CSV_ROW",
        format!("{}:{}: {}", source_label, line, source),
    )
}

fn parse_header(header: &StringRecord, line_number: u64, source_label: &str) -> ParserResult<ColumnLayout> {
    let columns: Vec<String> = header
        .iter()
        .map(|column| column.to_ascii_lowercase())
        .collect();
    let position = |name: &str| -> ParserResult<usize> {
        columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| {
                FluxError::input_validation(
                    "INPUT.FLUX_CSV_HEADER",
                    format!(
                        "{}:{}: missing column '{}' (expected {})",
                        source_label,
                        line_number,
                        name,
                        REQUIRED_COLUMNS.join(", ")
                    ),
                )
            })
    };

    let particle = position(REQUIRED_COLUMNS[0])?;
    let energy = position(REQUIRED_COLUMNS[1])?;
    let costheta = position(REQUIRED_COLUMNS[2])?;
    let flux = position(REQUIRED_COLUMNS[3])?;
    let width = 1 + particle.max(energy).max(costheta).max(flux);

    Ok(ColumnLayout {
        particle,
        energy,
        costheta,
        flux,
        width,
    })
}

fn parse_number(
    token: &str,
    column: &str,
    line_number: u64,
    source_label: &str,
) -> ParserResult<f64> {
    token.parse::<f64>().map_err(|_| {
        FluxError::input_validation(
            "INPUT.FLUX_CSV_NUMBER",
            format!(
                "{}:{}: column '{}' has non-numeric value '{}'",
                source_label, line_number, column, token
            ),
        )
    })
}
