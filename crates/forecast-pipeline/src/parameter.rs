//! Forecast parameters and their resolution against a dataset.

use std::str::FromStr;

use gfs_common::{ColorScheme, GriddedDataset, RenderMode, ViewerError, ViewerResult};

/// Knots per metre per second.
pub const KNOTS_PER_MS: f64 = 1.94384;

/// Unit conversion from source units to display units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitTransform {
    /// Multiply by a factor (kg m⁻² s⁻¹ to mm/h).
    Scale(f64),
    /// Add an offset (K to °C).
    Offset(f64),
    /// Divide by a divisor (Pa to hPa).
    Divide(f64),
    /// Magnitude of a (u, v) pair, then scale (m/s to knots).
    Magnitude(f64),
}

impl UnitTransform {
    /// Number of source fields the transform consumes.
    pub fn arity(&self) -> usize {
        match self {
            UnitTransform::Magnitude(_) => 2,
            _ => 1,
        }
    }

    /// Apply to one point. `inputs` has `arity()` values; NaN propagates.
    pub fn apply(&self, inputs: &[f32]) -> f32 {
        let x = inputs.first().copied().unwrap_or(f32::NAN) as f64;
        let out = match *self {
            UnitTransform::Scale(k) => x * k,
            UnitTransform::Offset(k) => x + k,
            UnitTransform::Divide(k) => x / k,
            UnitTransform::Magnitude(k) => {
                let y = inputs.get(1).copied().unwrap_or(f32::NAN) as f64;
                (x * x + y * y).sqrt() * k
            }
        };
        out as f32
    }
}

/// Static description of one parameter kind.
#[derive(Debug)]
pub struct ParameterSpec {
    /// Short id used in file names.
    pub id: &'static str,
    /// Label offered to users in menus.
    pub menu_label: &'static str,
    /// Accepted labels (case-insensitive), including `menu_label`.
    pub labels: &'static [&'static str],
    /// Source variables, in transform order.
    pub fields: &'static [&'static str],
    pub transform: UnitTransform,
    pub display_label: &'static str,
    pub color_scheme: ColorScheme,
    pub render_mode: RenderMode,
}

static PRECIPITATION: ParameterSpec = ParameterSpec {
    id: "precip",
    menu_label: "Curah Hujan per jam (pratesfc)",
    labels: &["Curah Hujan per jam (pratesfc)", "pratesfc", "precip"],
    fields: &["pratesfc"],
    transform: UnitTransform::Scale(3600.0),
    display_label: "Curah Hujan (mm/jam)",
    color_scheme: ColorScheme::Blues,
    render_mode: RenderMode::FilledSurface,
};

static TEMPERATURE: ParameterSpec = ParameterSpec {
    id: "temp",
    menu_label: "Suhu Permukaan (tmp2m)",
    labels: &["Suhu Permukaan (tmp2m)", "tmp2m", "temp"],
    fields: &["tmp2m"],
    transform: UnitTransform::Offset(-273.15),
    display_label: "Suhu (°C)",
    color_scheme: ColorScheme::CoolWarm,
    render_mode: RenderMode::FilledSurface,
};

static WIND: ParameterSpec = ParameterSpec {
    id: "wind",
    menu_label: "Angin Permukaan (ugrd10m & vgrd10m)",
    labels: &[
        "Angin Permukaan (ugrd10m & vgrd10m)",
        "wind10m",
        "wind",
        "ugrd10m",
        "vgrd10m",
    ],
    fields: &["ugrd10m", "vgrd10m"],
    transform: UnitTransform::Magnitude(KNOTS_PER_MS),
    display_label: "Kecepatan Angin (knot)",
    color_scheme: ColorScheme::YlGnBu,
    render_mode: RenderMode::FilledSurfaceWithVectors,
};

static PRESSURE: ParameterSpec = ParameterSpec {
    id: "mslp",
    menu_label: "Tekanan Permukaan Laut (prmslmsl)",
    labels: &["Tekanan Permukaan Laut (prmslmsl)", "prmslmsl", "prmsl", "mslp"],
    fields: &["prmslmsl"],
    transform: UnitTransform::Divide(100.0),
    display_label: "Tekanan Permukaan Laut (hPa)",
    color_scheme: ColorScheme::Cool,
    render_mode: RenderMode::IsolineContour,
};

/// The selectable forecast parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Precipitation,
    Temperature,
    Wind,
    Pressure,
}

impl Parameter {
    pub fn all() -> &'static [Parameter] {
        &[
            Parameter::Precipitation,
            Parameter::Temperature,
            Parameter::Wind,
            Parameter::Pressure,
        ]
    }

    pub fn spec(&self) -> &'static ParameterSpec {
        match self {
            Parameter::Precipitation => &PRECIPITATION,
            Parameter::Temperature => &TEMPERATURE,
            Parameter::Wind => &WIND,
            Parameter::Pressure => &PRESSURE,
        }
    }

    pub fn id(&self) -> &'static str {
        self.spec().id
    }

    /// Find the parameter a label refers to.
    pub fn from_label(label: &str) -> ViewerResult<Self> {
        let wanted = label.trim();
        Parameter::all()
            .iter()
            .copied()
            .find(|p| p.spec().labels.iter().any(|l| l.eq_ignore_ascii_case(wanted)))
            .ok_or_else(|| ViewerError::UnknownParameter {
                label: label.to_string(),
                known: Parameter::all()
                    .iter()
                    .map(|p| p.spec().menu_label.to_string())
                    .collect(),
            })
    }
}

impl FromStr for Parameter {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::from_label(s)
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.spec().menu_label)
    }
}

/// A field selected at one forecast lead, not yet read.
///
/// The unit transform travels with the selection and is applied when the
/// values are read.
#[derive(Debug, Clone, PartialEq)]
pub struct LazyField {
    pub sources: Vec<String>,
    pub lead: usize,
    pub transform: UnitTransform,
}

impl LazyField {
    /// Combine raw source values point by point.
    ///
    /// The output follows the first source; a point missing from a shorter
    /// source is NaN.
    pub fn apply(&self, raw: &[Vec<f32>]) -> Vec<f32> {
        let len = raw.first().map_or(0, Vec::len);
        let mut point = Vec::with_capacity(raw.len());
        (0..len)
            .map(|i| {
                point.clear();
                point.extend(raw.iter().map(|r| r.get(i).copied().unwrap_or(f32::NAN)));
                self.transform.apply(&point)
            })
            .collect()
    }
}

/// Eastward and northward wind components kept untransformed for arrows.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSources {
    pub u: String,
    pub v: String,
    pub lead: usize,
}

/// A parameter label resolved against a dataset.
#[derive(Debug, Clone)]
pub struct ResolvedParameter {
    pub parameter: Parameter,
    pub primary: LazyField,
    pub secondary: Option<VectorSources>,
    pub display_label: &'static str,
    pub color_scheme: ColorScheme,
    pub render_mode: RenderMode,
}

impl ResolvedParameter {
    pub fn lead(&self) -> usize {
        self.primary.lead
    }
}

/// Resolve `label` to source fields at `lead`.
///
/// The label is checked before the dataset is touched. Field presence is
/// checked next, then the lead against the time axis.
pub fn resolve(dataset: &dyn GriddedDataset, label: &str, lead: usize) -> ViewerResult<ResolvedParameter> {
    let parameter = Parameter::from_label(label)?;
    let spec = parameter.spec();

    let missing: Vec<String> = spec
        .fields
        .iter()
        .filter(|f| dataset.variable(f).is_none())
        .map(|f| f.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ViewerError::ParameterNotFound {
            parameter: spec.menu_label.to_string(),
            missing,
            available: dataset.variable_names(),
        });
    }

    let available = dataset.time_len();
    if lead >= available {
        return Err(ViewerError::LeadOutOfRange { lead, available });
    }

    let primary = LazyField {
        sources: spec.fields.iter().map(|f| f.to_string()).collect(),
        lead,
        transform: spec.transform,
    };

    let secondary = match spec.render_mode {
        RenderMode::FilledSurfaceWithVectors => Some(VectorSources {
            u: spec.fields[0].to_string(),
            v: spec.fields[1].to_string(),
            lead,
        }),
        RenderMode::FilledSurface | RenderMode::IsolineContour => None,
    };

    Ok(ResolvedParameter {
        parameter,
        primary,
        secondary,
        display_label: spec.display_label,
        color_scheme: spec.color_scheme,
        render_mode: spec.render_mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_forms() {
        assert_eq!(Parameter::from_label("Suhu Permukaan (tmp2m)").unwrap(), Parameter::Temperature);
        assert_eq!(Parameter::from_label("TMP2M").unwrap(), Parameter::Temperature);
        assert_eq!(" wind ".parse::<Parameter>().unwrap(), Parameter::Wind);
        assert_eq!(Parameter::from_label("vgrd10m").unwrap(), Parameter::Wind);
        assert_eq!(Parameter::from_label("prmsl").unwrap(), Parameter::Pressure);
        assert_eq!(Parameter::from_label("precip").unwrap(), Parameter::Precipitation);
    }

    #[test]
    fn test_unknown_label_lists_menu() {
        let err = Parameter::from_label("humidity").unwrap_err();
        match err {
            ViewerError::UnknownParameter { label, known } => {
                assert_eq!(label, "humidity");
                assert_eq!(known.len(), 4);
                assert_eq!(known[3], "Tekanan Permukaan Laut (prmslmsl)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_transforms() {
        let t = Parameter::Temperature.spec().transform;
        assert!((t.apply(&[300.0]) - 26.85).abs() < 1e-4);

        let p = Parameter::Precipitation.spec().transform;
        assert!((p.apply(&[0.001]) - 3.6).abs() < 1e-5);

        let w = Parameter::Wind.spec().transform;
        assert!((w.apply(&[3.0, 4.0]) - 9.7192).abs() < 1e-4);

        let m = Parameter::Pressure.spec().transform;
        assert_eq!(m.apply(&[101325.0]), 1013.25);

        assert!(t.apply(&[f32::NAN]).is_nan());
    }

    #[test]
    fn test_lazy_field_apply_pairs() {
        let field = LazyField {
            sources: vec!["ugrd10m".into(), "vgrd10m".into()],
            lead: 0,
            transform: UnitTransform::Magnitude(1.0),
        };
        let out = field.apply(&[vec![3.0, 0.0], vec![4.0, f32::NAN]]);
        assert_eq!(out[0], 5.0);
        assert!(out[1].is_nan());
    }

    #[test]
    fn test_lazy_field_apply_short_source() {
        let field = LazyField {
            sources: vec!["ugrd10m".into(), "vgrd10m".into()],
            lead: 0,
            transform: UnitTransform::Magnitude(1.0),
        };
        let out = field.apply(&[vec![3.0, 6.0, 1.0], vec![4.0]]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], 5.0);
        assert!(out[1].is_nan() && out[2].is_nan());
    }

    #[test]
    fn test_arity_matches_fields() {
        for p in Parameter::all() {
            let spec = p.spec();
            assert_eq!(spec.transform.arity(), spec.fields.len(), "{}", spec.id);
            assert!(spec.labels.contains(&spec.menu_label));
        }
    }
}
