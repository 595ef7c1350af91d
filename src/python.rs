//! Python bindings

use crate::core::{angle_to_north_batch, find_nodata_value_from_path, get_true_corner_map_xy_from_path};
use crate::types::{GeoError, NoDataEstimate, NoDataSpec};
use numpy::{PyArray1, PyReadonlyArray2};
use pyo3::prelude::*;

fn to_py_err(e: GeoError) -> PyErr {
    match e {
        GeoError::InvalidInput(_) | GeoError::MissingGeoreference(_) => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e))
        }
        _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", e)),
    }
}

/// Accepts None, a number or the string "unclear"
fn parse_nodata(nodata: Option<&PyAny>) -> PyResult<NoDataSpec> {
    let value = match nodata {
        None => return Ok(NoDataSpec::NoMasking),
        Some(v) if v.is_none() => return Ok(NoDataSpec::NoMasking),
        Some(v) => v,
    };
    if let Ok(s) = value.extract::<&str>() {
        return match s {
            "unclear" => Ok(NoDataSpec::Undetermined),
            _ => Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Invalid no data value: '{}'",
                s
            ))),
        };
    }
    Ok(NoDataSpec::Value(value.extract::<f64>()?))
}

#[pyfunction]
#[pyo3(signature = (path, band_index=0, window_size=3))]
fn find_nodata_value(py: Python, path: String, band_index: usize, window_size: usize) -> PyResult<PyObject> {
    let estimate = find_nodata_value_from_path(&path, band_index, window_size).map_err(to_py_err)?;
    Ok(match estimate {
        NoDataEstimate::None => py.None(),
        NoDataEstimate::Value(v) => v.into_py(py),
        NoDataEstimate::Unclear => "unclear".into_py(py),
    })
}

#[pyfunction]
#[pyo3(signature = (path, band=1, nodata=None, verbose=false, quiet=false))]
fn get_true_corner_map_xy(
    path: String,
    band: usize,
    nodata: Option<&PyAny>,
    verbose: bool,
    quiet: bool,
) -> PyResult<Vec<Vec<f64>>> {
    let nodata = parse_nodata(nodata)?;
    let corners =
        get_true_corner_map_xy_from_path(&path, band, nodata, verbose, quiet).map_err(to_py_err)?;
    Ok(corners.iter().map(|c| vec![c.x, c.y]).collect())
}

#[pyfunction]
fn angle_to_north<'py>(py: Python<'py>, xy: PyReadonlyArray2<'py, f64>) -> PyResult<&'py PyArray1<f64>> {
    let view = xy.as_array();
    if view.ncols() != 2 {
        return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
            "Expected an N x 2 array of (x, y) vectors, got {} columns",
            view.ncols()
        )));
    }
    let vectors: Vec<(f64, f64)> = view.outer_iter().map(|row| (row[0], row[1])).collect();
    Ok(PyArray1::from_vec(py, angle_to_north_batch(&vectors)))
}

/// Python module definition
#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(find_nodata_value, m)?)?;
    m.add_function(wrap_pyfunction!(get_true_corner_map_xy, m)?)?;
    m.add_function(wrap_pyfunction!(angle_to_north, m)?)?;
    Ok(())
}
