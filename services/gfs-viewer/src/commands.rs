//! The individual CLI commands.

use std::io::Write;
use std::path::{Path, PathBuf};

use forecast_pipeline::{DatasetOpener, ForecastViewer, Parameter, RenderRequest, Rendered};
use gfs_common::{GriddedDataset, ValidTime, ViewerError, ViewerResult};
use renderer::MapRenderer;
use tracing::info;

use crate::output::PngWriter;

/// Render one request into `output_dir` under its standard file name.
pub async fn render_one<O: DatasetOpener>(
    viewer: &ForecastViewer<O>,
    renderer: &MapRenderer,
    output_dir: &Path,
    request: &RenderRequest,
) -> ViewerResult<Rendered<PathBuf>> {
    // The label decides the file name, so check it up front.
    let parameter = Parameter::from_label(&request.parameter)?;
    let writer = PngWriter::in_dir(renderer, output_dir, &request.run, parameter, request.lead);
    let rendered = viewer.render(request, &writer).await?;
    info!(
        parameter = parameter.id(),
        title = %rendered.map.title,
        path = %rendered.output.display(),
        "Rendered"
    );
    Ok(rendered)
}

/// Message plus hint, the way a user sees a failed request.
pub fn report_failure<W: Write>(out: &mut W, error: &ViewerError) -> std::io::Result<()> {
    writeln!(out, "error [{}]: {}", error.kind(), error)?;
    if let Some(hint) = error.hint() {
        writeln!(out, "  hint: {}", hint)?;
    }
    Ok(())
}

/// Variables with their dimensions, then the time span.
pub fn describe_dataset<W: Write>(out: &mut W, dataset: &dyn GriddedDataset) -> std::io::Result<()> {
    writeln!(out, "{}", dataset.name())?;

    let mut names = dataset.variable_names();
    names.sort();
    for name in &names {
        let Some(info) = dataset.variable(name) else {
            continue;
        };
        let dims = info
            .dims
            .iter()
            .map(|d| format!("{}={}", d.name, d.size))
            .collect::<Vec<_>>()
            .join(", ");
        write!(out, "  {:<12} [{}]", name, dims)?;
        if let Some(units) = &info.units {
            write!(out, " {}", units)?;
        }
        if let Some(long_name) = &info.long_name {
            write!(out, "  {}", long_name)?;
        }
        writeln!(out)?;
    }

    let times = dataset.times();
    match (times.first(), times.last()) {
        (Some(first), Some(last)) => writeln!(
            out,
            "time: {} steps, {} to {}",
            times.len(),
            ValidTime::display(first),
            ValidTime::display(last)
        )?,
        _ => writeln!(out, "time: none")?,
    }
    Ok(())
}

/// Table of parameter kinds and the labels each accepts.
pub fn write_parameters<W: Write>(out: &mut W) -> std::io::Result<()> {
    for parameter in Parameter::all() {
        let spec = parameter.spec();
        writeln!(out, "{:<8} {}", spec.id, spec.menu_label)?;
        writeln!(out, "         fields: {}", spec.fields.join(", "))?;
        writeln!(out, "         labels: {}", spec.labels.join(" | "))?;
        writeln!(out, "         shown as {}", spec.display_label)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_table_lists_every_kind() {
        let mut out = Vec::new();
        write_parameters(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        for parameter in Parameter::all() {
            assert!(text.contains(parameter.spec().menu_label));
        }
        assert!(text.contains("ugrd10m, vgrd10m"));
    }

    #[test]
    fn test_report_includes_hint() {
        let err = ViewerError::LeadOutOfRange { lead: 250, available: 241 };
        let mut out = Vec::new();
        report_failure(&mut out, &err).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("error [LeadOutOfRange]"));
        assert_eq!(text.lines().count(), 1 + err.hint().is_some() as usize);
    }
}
