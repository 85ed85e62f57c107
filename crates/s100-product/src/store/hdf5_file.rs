//! HDF5 file backend.
//!
//! Every object this backend creates has HDF5 time tracking switched off,
//! so the same tile written twice produces the same bytes.

use std::ffi::CString;
use std::path::Path;
use std::sync::Once;

use hdf5::types::{TypeDescriptor, VarLenUnicode};
use hdf5::{File, Group, H5Type};
use hdf5_metno_sys::{h5a, h5g, h5p};
use tracing::trace;

use super::{AttrValue, ProductStore, ROOT};
use crate::error::{ProductError, Result};
use crate::format::StationValues;
use crate::profile::FeatureField;
use crate::records::{FeatureInfoRecord, PositionRecord};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints a diagnostic stack for every failed call,
/// including the attribute and link lookups this backend expects to fail.
/// Only needs to be called once per process, but is safe to call multiple
/// times; every constructor of [`Hdf5Store`] calls it.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// A product file opened through the HDF5 library.
pub struct Hdf5Store {
    file: File,
}

impl Hdf5Store {
    /// Create a new, empty file, truncating any existing one.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        silence_hdf5_errors();
        let file = File::with_options()
            .with_fcpl(|p| p.obj_track_times(false))
            .create(path.as_ref())?;
        Ok(Self { file })
    }

    /// Open an existing file for reading and writing.
    pub fn open_rw(path: impl AsRef<Path>) -> Result<Self> {
        silence_hdf5_errors();
        let file = File::open_rw(path.as_ref())?;
        Ok(Self { file })
    }

    /// The underlying file, for reading back what was written.
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }

    fn group(&self, path: &str) -> Result<Group> {
        let trimmed = path.trim_matches('/');
        let target = if trimmed.is_empty() { ROOT } else { trimmed };
        Ok(self.file.group(target)?)
    }

    fn write_dataset<T: H5Type>(&self, group: &str, name: &str, data: &[T]) -> Result<()> {
        let location = self.group(group)?;
        if location.link_exists(name) {
            return Err(ProductError::schema_violation(format!(
                "dataset {group}/{name} exists already"
            )));
        }
        location
            .new_dataset_builder()
            .obj_track_times(false)
            .with_data(data)
            .create(name)?;
        trace!(group, name, len = data.len(), "Wrote dataset");
        Ok(())
    }
}

fn c_name(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| ProductError::schema_violation(format!("invalid name {name:?}")))
}

/// `H5Gcreate2` with a group creation plist that does not record times.
fn create_untracked_group(root: &Group, path: &str) -> Result<()> {
    let name = c_name(path)?;

    // SAFETY: every id is checked before use and closed exactly once; the
    // name outlives the call.
    let created = unsafe {
        let gcpl = h5p::H5Pcreate(*h5p::H5P_CLS_GROUP_CREATE);
        if gcpl < 0 {
            return Err(hdf5::Error::from("failed to create group creation plist").into());
        }
        let id = if h5p::H5Pset_obj_track_times(gcpl, 0) < 0 {
            -1
        } else {
            h5g::H5Gcreate2(root.id(), name.as_ptr(), h5p::H5P_DEFAULT, gcpl, h5p::H5P_DEFAULT)
        };
        h5p::H5Pclose(gcpl);
        if id >= 0 {
            h5g::H5Gclose(id);
        }
        id >= 0
    };

    if !created {
        return Err(hdf5::Error::from(format!("failed to create group {path}")).into());
    }
    Ok(())
}

fn delete_attr(location: &Group, name: &str) -> Result<()> {
    let c = c_name(name)?;
    // SAFETY: valid location id and NUL-terminated name.
    if unsafe { h5a::H5Adelete(location.id(), c.as_ptr()) } < 0 {
        return Err(hdf5::Error::from(format!("failed to delete attribute {name}")).into());
    }
    Ok(())
}

fn text(name: &str, value: &str) -> Result<VarLenUnicode> {
    value
        .parse::<VarLenUnicode>()
        .map_err(|e| ProductError::invalid_attribute(name, e.to_string()))
}

/// Whether an attribute stored as `stored` can take `value` through an HDF5
/// conversion. Numeric widths convert; fixed-length strings, enums from
/// integers and the like do not.
fn converts_in_place(stored: &TypeDescriptor, value: &AttrValue) -> bool {
    use TypeDescriptor as TD;
    match value {
        AttrValue::Float(_) => matches!(stored, TD::Float(_)),
        AttrValue::Int(_) | AttrValue::UInt(_) | AttrValue::Byte(_) => {
            matches!(stored, TD::Integer(_) | TD::Unsigned(_))
        }
        AttrValue::Text(_) => matches!(stored, TD::VarLenUnicode),
        AttrValue::WaterLevelType(_) => matches!(stored, TD::Enum(_)),
    }
}

/// Write a scalar attribute of `T`.
///
/// An existing attribute whose type converts from `T` is overwritten in
/// place and keeps its stored type. Any other existing attribute is
/// replaced.
fn write_scalar_attr<T: H5Type>(
    location: &Group,
    name: &str,
    value: &AttrValue,
    scalar: &T,
) -> Result<()> {
    if location.attr_names()?.iter().any(|n| n == name) {
        let attr = location.attr(name)?;
        if converts_in_place(&attr.dtype()?.to_descriptor()?, value) {
            attr.write_scalar(scalar)?;
            return Ok(());
        }
        drop(attr);
        trace!(name, "Replacing attribute of incompatible type");
        delete_attr(location, name)?;
    }

    location.new_attr::<T>().shape(()).create(name)?.write_scalar(scalar)?;
    Ok(())
}

impl ProductStore for Hdf5Store {
    fn group_exists(&self, path: &str) -> Result<bool> {
        let mut current = self.file.group(ROOT)?;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if !current.link_exists(part) {
                return Ok(false);
            }
            current = match current.group(part) {
                Ok(group) => group,
                // A dataset with this name
                Err(_) => return Ok(false),
            };
        }
        Ok(true)
    }

    fn create_group(&mut self, path: &str) -> Result<()> {
        if self.group_exists(path)? {
            return Err(ProductError::schema_violation(format!(
                "group {path} exists already, cannot recreate it"
            )));
        }
        create_untracked_group(&self.file.group(ROOT)?, path.trim_matches('/'))?;
        trace!(path, "Created group");
        Ok(())
    }

    fn member_names(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.group(path)?.member_names()?)
    }

    fn set_attr(&mut self, group: &str, name: &str, value: &AttrValue) -> Result<()> {
        let location = self.group(group)?;

        match value {
            AttrValue::Float(v) => write_scalar_attr(&location, name, value, v),
            AttrValue::Int(v) => write_scalar_attr(&location, name, value, v),
            AttrValue::UInt(v) => write_scalar_attr(&location, name, value, v),
            AttrValue::Byte(v) => write_scalar_attr(&location, name, value, v),
            AttrValue::Text(v) => write_scalar_attr(&location, name, value, &text(name, v)?),
            AttrValue::WaterLevelType(v) => write_scalar_attr(&location, name, value, v),
        }
    }

    fn write_values(&mut self, group: &str, values: &StationValues) -> Result<()> {
        match values {
            StationValues::WaterLevel(records) => self.write_dataset(group, "values", records),
            StationValues::SurfaceCurrent(records) => {
                self.write_dataset(group, "values", records)
            }
        }
    }

    fn write_positions(&mut self, group: &str, positions: &[PositionRecord]) -> Result<()> {
        self.write_dataset(group, "geometryValues", positions)
    }

    fn write_feature_table(
        &mut self,
        group: &str,
        name: &str,
        rows: &[FeatureField],
    ) -> Result<()> {
        let records = rows
            .iter()
            .map(|row| {
                Ok(FeatureInfoRecord {
                    code: text(name, row.code)?,
                    name: text(name, row.name)?,
                    uom: text(name, row.uom)?,
                    fill_value: text(name, row.fill_value)?,
                    datatype: text(name, row.datatype)?,
                    lower: text(name, row.lower)?,
                    upper: text(name, row.upper)?,
                    closure: text(name, row.closure)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.write_dataset(group, name, &records)
    }

    fn write_strings(&mut self, group: &str, name: &str, values: &[&str]) -> Result<()> {
        let strings = values
            .iter()
            .map(|v| text(name, v))
            .collect::<Result<Vec<_>>>()?;
        self.write_dataset(group, name, &strings)
    }
}
