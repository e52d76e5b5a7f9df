//! Point catalogs and their alignment onto a reference catalog.

use ndarray::Array2;

use crate::config::TriangleMatchConfig;
use crate::error::{CallistoError, Result};
use crate::transform::Transform2D;

/// Values of one auxiliary catalog column.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValues {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Text(Vec<String>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Int(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell `row` rendered as text.
    pub fn cell(&self, row: usize) -> Option<String> {
        match self {
            ColumnValues::Float(v) => v.get(row).map(|x| x.to_string()),
            ColumnValues::Int(v) => v.get(row).map(|x| x.to_string()),
            ColumnValues::Text(v) => v.get(row).cloned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

/// Labelled 2-D points: an `(n, 2)` array of `(x, y)` positions with
/// auxiliary columns of length `n` carried alongside.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    positions: Array2<f64>,
    columns: Vec<Column>,
}

impl Catalog {
    /// Catalog from an `(n, 2)` position array.
    pub fn new(positions: Array2<f64>) -> Result<Self> {
        if positions.ncols() != 2 {
            return Err(CallistoError::DimensionMismatch {
                expected: (positions.nrows(), 2),
                found: positions.dim(),
            });
        }
        Ok(Self {
            positions,
            columns: Vec::new(),
        })
    }

    pub fn from_points(points: &[[f64; 2]]) -> Self {
        let positions = Array2::from_shape_fn((points.len(), 2), |(i, j)| points[i][j]);
        Self {
            positions,
            columns: Vec::new(),
        }
    }

    /// Attach a column; its length must equal the number of points.
    pub fn with_column(mut self, name: impl Into<String>, values: ColumnValues) -> Result<Self> {
        if values.len() != self.len() {
            return Err(CallistoError::DimensionMismatch {
                expected: (self.len(), 1),
                found: (values.len(), 1),
            });
        }
        self.columns.push(Column {
            name: name.into(),
            values,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.positions.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn positions(&self) -> &Array2<f64> {
        &self.positions
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn points(&self) -> Vec<[f64; 2]> {
        self.positions
            .outer_iter()
            .map(|row| [row[0], row[1]])
            .collect()
    }

    /// New catalog with every position mapped through `transform` in one
    /// matrix product; columns are copied unchanged.
    pub fn transformed(&self, transform: &Transform2D) -> Catalog {
        Catalog {
            positions: transform.apply_points(&self.positions),
            columns: self.columns.clone(),
        }
    }
}

/// Align every catalog onto `reference` (the first catalog when `None`).
///
/// Returns one transformed catalog per input, in input order.
pub fn align_catalogs(catalogs: &[Catalog], reference: Option<&Catalog>) -> Result<Vec<Catalog>> {
    align_catalogs_with_config(catalogs, reference, &TriangleMatchConfig::default())
}

#[cfg(feature = "astroalign")]
pub fn align_catalogs_with_config(
    catalogs: &[Catalog],
    reference: Option<&Catalog>,
    config: &TriangleMatchConfig,
) -> Result<Vec<Catalog>> {
    use crate::align::feature_match::find_transform;

    let first = catalogs.first().ok_or(CallistoError::EmptySequence)?;
    let reference = reference.unwrap_or(first);
    let target = reference.points();

    catalogs
        .iter()
        .enumerate()
        .map(|(i, catalog)| {
            let (transform, _) = find_transform(&catalog.points(), &target, config)?;
            tracing::debug!(index = i, %transform, "aligned catalog");
            Ok(catalog.transformed(&transform))
        })
        .collect()
}

#[cfg(not(feature = "astroalign"))]
pub fn align_catalogs_with_config(
    catalogs: &[Catalog],
    _reference: Option<&Catalog>,
    _config: &TriangleMatchConfig,
) -> Result<Vec<Catalog>> {
    if catalogs.is_empty() {
        return Err(CallistoError::EmptySequence);
    }
    Err(CallistoError::FeatureUnavailable {
        method: "astroalign",
        dependency: "astroalign",
    })
}
