//! Catalogs as CSV: an `x` and a `y` column plus any number of labelled
//! columns, one row per point.

use std::path::Path;

use crate::catalog::{Catalog, ColumnValues};
use crate::error::{CallistoError, Result};

pub fn load_catalog_csv(path: &Path) -> Result<Catalog> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let position_of = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                let message = format!("{}: missing '{}' column", path.display(), name);
                CallistoError::InvalidCatalog(message)
            })
    };
    let x_col = position_of("x")?;
    let y_col = position_of("y")?;

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (column, cell) in cells.iter_mut().zip(record.iter()) {
            column.push(cell.trim().to_string());
        }
    }

    let parse_coordinate = |column: &[String], name: &str| -> Result<Vec<f64>> {
        column
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.parse::<f64>().map_err(|_| {
                    CallistoError::InvalidCatalog(format!(
                        "{}: row {} has non-numeric {} value '{}'",
                        path.display(),
                        row + 1,
                        name,
                        v
                    ))
                })
            })
            .collect()
    };
    let xs = parse_coordinate(&cells[x_col], "x")?;
    let ys = parse_coordinate(&cells[y_col], "y")?;
    let points: Vec<[f64; 2]> = xs.into_iter().zip(ys).map(|(x, y)| [x, y]).collect();

    let mut catalog = Catalog::from_points(&points);
    for (i, (name, column)) in headers.iter().zip(cells).enumerate() {
        if i == x_col || i == y_col {
            continue;
        }
        catalog = catalog.with_column(name.clone(), typed_column(column))?;
    }
    tracing::debug!(path = %path.display(), points = catalog.len(), "loaded catalog");
    Ok(catalog)
}

pub fn save_catalog_csv(catalog: &Catalog, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["x".to_string(), "y".to_string()];
    header.extend(catalog.columns().iter().map(|c| c.name.clone()));
    writer.write_record(&header)?;

    for (row, position) in catalog.positions().outer_iter().enumerate() {
        let mut record = vec![position[0].to_string(), position[1].to_string()];
        record.extend(
            catalog
                .columns()
                .iter()
                .map(|c| c.values.cell(row).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Integer if every cell parses as one, else float, else text.
fn typed_column(cells: Vec<String>) -> ColumnValues {
    let ints: std::result::Result<Vec<i64>, _> = cells.iter().map(|v| v.parse()).collect();
    if let Ok(ints) = ints {
        return ColumnValues::Int(ints);
    }
    let floats: std::result::Result<Vec<f64>, _> = cells.iter().map(|v| v.parse()).collect();
    if let Ok(floats) = floats {
        return ColumnValues::Float(floats);
    }
    ColumnValues::Text(cells)
}
