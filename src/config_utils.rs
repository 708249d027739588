use std::path::Path;
use std::path::PathBuf;

use yaml_rust::Yaml;

use super::sites::StartupDataError;


pub fn str_to_absolute_path(path_str: &str, default_base_dir: &Path) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        return path;
    } else {
        return [default_base_dir, Path::new(&path)].iter().collect();
    }
}

pub fn required_str<'a>(yaml_cfg: &'a Yaml, key: &str) -> Result<&'a str, StartupDataError> {
    match yaml_cfg[key].as_str() {
        Some(ss) => Ok(ss),
        None => Err(StartupDataError::Config(format!("no {} given", key))),
    }
}

/// Reads a number that may be written as either an integer or a float.
pub fn optional_f64(yaml_cfg: &Yaml, key: &str) -> Result<Option<f64>, StartupDataError> {
    match &yaml_cfg[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Real(_) => match yaml_cfg[key].as_f64() {
            Some(val) => Ok(Some(val)),
            None => Err(StartupDataError::Config(format!("{} is not a number", key))),
        },
        Yaml::Integer(val) => Ok(Some(*val as f64)),
        _ => Err(StartupDataError::Config(format!("{} is not a number", key))),
    }
}

pub fn optional_u64(yaml_cfg: &Yaml, key: &str) -> Result<Option<u64>, StartupDataError> {
    match &yaml_cfg[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Integer(val) if *val >= 0 => Ok(Some(*val as u64)),
        _ => Err(StartupDataError::Config(format!("{} must be a non-negative integer", key))),
    }
}
